//! Implementation of the `#[memoized]` attribute.
//!
//! # Generated Code Structure
//!
//! For
//!
//! ```text
//! #[memoized]
//! fn fibonacci(n: u64) -> u64 {
//!     if n < 2 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
//! }
//! ```
//!
//! the attribute generates:
//!
//! ```text
//! fn fibonacci(__memokit_argument_0: u64) -> u64 {
//!     ::std::thread_local! {
//!         static __MEMOKIT_CACHE: ::memokit::__private::LocalCache<u64> =
//!             ::memokit::__private::local_cache();
//!     }
//!     ::memokit::__private::resolve_local(
//!         &__MEMOKIT_CACHE,
//!         (__memokit_argument_0,),
//!         |(n,): (u64,)| -> u64 {
//!             if n < 2 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
//!         },
//!     )
//! }
//! ```
//!
//! The body still calls `fibonacci` by name, and that name now refers to the
//! memoized function, so every recursive step goes through the cache.
//!
//! When the return type's last path segment is `Result`, the cache is
//! declared as `LocalCache<<R as ::memokit::__private::Fallible>::Value>`
//! and the call goes through `resolve_local_fallible`, which stores `Ok`
//! values only.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{FnArg, ItemFn, Pat, PatIdent, ReturnType, Signature, Type};

pub fn memoized_impl(attribute: TokenStream, item: TokenStream) -> TokenStream {
    let expanded = expand(attribute.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error);
    TokenStream::from(expanded)
}

fn expand(attribute: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    if !attribute.is_empty() {
        return Err(syn::Error::new_spanned(
            attribute,
            "#[memoized] does not take arguments",
        ));
    }

    let function: ItemFn = syn::parse2(item)?;
    validate_signature(&function.sig)?;

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = function;

    let return_type = match &sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, return_type) => quote! { #return_type },
    };
    let (cached_type, resolve) = if returns_result(&sig.output) {
        (
            quote! { <#return_type as ::memokit::__private::Fallible>::Value },
            quote! { resolve_local_fallible },
        )
    } else {
        (return_type.clone(), quote! { resolve_local })
    };

    let mut outer_signature = sig.clone();
    let mut patterns = Vec::new();
    let mut types = Vec::new();
    let mut argument_identifiers = Vec::new();

    for (index, input) in outer_signature.inputs.iter_mut().enumerate() {
        let FnArg::Typed(typed) = input else {
            return Err(syn::Error::new_spanned(
                input,
                "#[memoized] cannot be applied to methods taking self",
            ));
        };
        let identifier = format_ident!("__memokit_argument_{}", index);
        patterns.push(typed.pat.as_ref().clone());
        types.push(typed.ty.as_ref().clone());
        typed.pat = Box::new(Pat::Ident(PatIdent {
            attrs: Vec::new(),
            by_ref: None,
            mutability: None,
            ident: identifier.clone(),
            subpat: None,
        }));
        argument_identifiers.push(identifier);
    }

    Ok(quote! {
        #(#attrs)*
        #vis #outer_signature {
            ::std::thread_local! {
                static __MEMOKIT_CACHE: ::memokit::__private::LocalCache<#cached_type> =
                    ::memokit::__private::local_cache();
            }
            ::memokit::__private::#resolve(
                &__MEMOKIT_CACHE,
                (#(#argument_identifiers,)*),
                |(#(#patterns,)*): (#(#types,)*)| -> #return_type #block,
            )
        }
    })
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, return_type) = output else {
        return false;
    };
    let Type::Path(path) = return_type.as_ref() else {
        return false;
    };
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result")
}

fn validate_signature(signature: &Signature) -> syn::Result<()> {
    if let Some(constness) = &signature.constness {
        return Err(syn::Error::new_spanned(
            constness,
            "#[memoized] cannot be applied to const functions",
        ));
    }
    if let Some(asyncness) = &signature.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[memoized] cannot be applied to async functions",
        ));
    }
    if !signature.generics.params.is_empty() || signature.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &signature.generics,
            "#[memoized] cannot be applied to generic functions: the cache holds a single result type",
        ));
    }
    if let Some(variadic) = &signature.variadic {
        return Err(syn::Error::new_spanned(
            variadic,
            "#[memoized] cannot be applied to variadic functions",
        ));
    }

    for input in &signature.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[memoized] cannot be applied to methods taking self",
                ));
            }
            FnArg::Typed(typed) => {
                if let Type::ImplTrait(impl_trait) = typed.ty.as_ref() {
                    return Err(syn::Error::new_spanned(
                        impl_trait,
                        "#[memoized] arguments must have concrete types",
                    ));
                }
            }
        }
    }

    if let ReturnType::Type(_, return_type) = &signature.output
        && let Type::ImplTrait(impl_trait) = return_type.as_ref()
    {
        return Err(syn::Error::new_spanned(
            impl_trait,
            "#[memoized] return type must be concrete and implement Clone",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn expand_to_string(item: TokenStream2) -> String {
        expand(TokenStream2::new(), item)
            .unwrap_or_else(syn::Error::into_compile_error)
            .to_string()
    }

    #[rstest]
    fn test_expansion_routes_through_local_cache() {
        let expanded = expand_to_string(quote! {
            pub fn square(n: u64) -> u64 { n * n }
        });

        assert!(expanded.contains("thread_local"));
        assert!(expanded.contains("LocalCache < u64 >"));
        assert!(expanded.contains("resolve_local"));
        assert!(expanded.contains("pub fn square (__memokit_argument_0 : u64) -> u64"));
    }

    #[rstest]
    fn test_expansion_keeps_argument_patterns() {
        let expanded = expand_to_string(quote! {
            fn add((left, right): (i32, i32), mut scale: i32) -> i32 {
                scale += 1;
                (left + right) * scale
            }
        });

        assert!(expanded.contains("| ((left , right) , mut scale ,) : ((i32 , i32) , i32 ,) |"));
        assert!(!expanded.contains("fn add ((left"));
    }

    #[rstest]
    #[case::plain(quote! { fn halve(n: i32) -> Result<i32, String> { Ok(n / 2) } })]
    #[case::qualified(quote! { fn read(n: u8) -> std::io::Result<u8> { Ok(n) } })]
    fn test_result_return_caches_ok_values_only(#[case] item: TokenStream2) {
        let expanded = expand_to_string(item);

        assert!(expanded.contains("as :: memokit :: __private :: Fallible > :: Value"));
        assert!(expanded.contains("resolve_local_fallible"));
    }

    #[rstest]
    fn test_non_result_return_uses_plain_resolver() {
        let expanded = expand_to_string(quote! {
            fn parity(n: i32) -> Option<i32> { Some(n % 2) }
        });

        assert!(!expanded.contains("resolve_local_fallible"));
        assert!(!expanded.contains("Fallible"));
    }

    #[rstest]
    fn test_unit_return_type() {
        let expanded = expand_to_string(quote! {
            fn touch(name: String) { let _ = name; }
        });
        assert!(expanded.contains("LocalCache < () >"));
    }

    #[rstest]
    #[case::asynchronous(quote! { async fn load(id: u32) -> u32 { id } }, "async functions")]
    #[case::constant(quote! { const fn fixed(id: u32) -> u32 { id } }, "const functions")]
    #[case::generic(quote! { fn same<T: Clone>(value: T) -> T { value } }, "generic functions")]
    #[case::receiver(quote! { fn get(&self, id: u32) -> u32 { id } }, "methods taking self")]
    #[case::impl_argument(quote! { fn run(task: impl Fn() -> u32) -> u32 { task() } }, "concrete types")]
    #[case::impl_return(quote! { fn numbers(limit: u32) -> impl Iterator<Item = u32> { 0..limit } }, "must be concrete")]
    fn test_rejected_signatures(#[case] item: TokenStream2, #[case] message: &str) {
        let error = expand(TokenStream2::new(), item).unwrap_err();
        assert!(
            error.to_string().contains(message),
            "unexpected error: {error}"
        );
    }

    #[rstest]
    fn test_attribute_arguments_are_rejected() {
        let error = expand(quote! { capacity = 10 }, quote! { fn id(n: u8) -> u8 { n } })
            .unwrap_err();
        assert_eq!(error.to_string(), "#[memoized] does not take arguments");
    }
}
