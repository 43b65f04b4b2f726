//! Test that `#[memoized]` rejects a method taking `self`.

use memokit::memoized;

struct Store;

impl Store {
    #[memoized]
    fn get(&self, id: u32) -> u32 {
        id
    }
}

fn main() {
    let _ = Store;
}
