//! Test that `#[memoized]` rejects an async function.

use memokit::memoized;

#[memoized]
async fn load(id: u32) -> u32 {
    id
}

fn main() {}
