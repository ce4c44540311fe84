extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, PatType, Receiver};

/// Wraps an async service method in a MongoDB transaction.
///
/// The annotated method must take `session: &mut Session` among its
/// arguments and return a `Result`. The body is moved into a `*_tx`
/// sibling; the original name starts a transaction, runs the body and
/// commits on `Ok` or aborts on `Err`.
#[proc_macro_attribute]
pub fn tx(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(input as ItemFn);
    let vis = &input_fn.vis;
    let body = &input_fn.block;
    let name = &input_fn.sig.ident;
    let args = &input_fn.sig.inputs;
    let ret = &input_fn.sig.output;

    let forwarded: Vec<_> = args
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, .. }) => quote! { #pat },
            FnArg::Receiver(Receiver {
                reference,
                mutability,
                ..
            }) => {
                if reference.is_some() && mutability.is_none() {
                    quote!(&self)
                } else {
                    quote!(self)
                }
            }
        })
        .collect();

    let inner = quote::format_ident!("{}_tx", name);
    let expanded = quote! {
        #vis async fn #inner(#args) #ret {
            #body
        }

        #vis async fn #name(#args) #ret {
            session.start_transaction().await?;
            match Self::#inner(#(#forwarded),*).await {
                Ok(value) => {
                    session.commit_transaction().await?;
                    Ok(value)
                }
                Err(err) => {
                    session.abort_transaction().await?;
                    Err(err)
                }
            }
        }
    };

    TokenStream::from(expanded)
}
