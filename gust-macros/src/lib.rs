use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Ident, ItemFn};

/// Proc macro to denote a Transaction
///
/// A transaction is a single measured call: its latency is recorded and it counts as a success or
/// an error depending on the returned `Result`. When the scenario has an `rps` limit, every
/// transaction waits for the shared rate limiter first.
///
/// NOTE: Only works on `async` functions returning a `Result<T, E>`.
///
/// # Example
/// ```ignore
/// use gust::prelude::*;
///
/// #[transaction]
/// async fn fetch_index(client: &Client) -> Result<(), reqwest::Error> {
///     client.get("http://localhost:3000/").send().await?;
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn transaction(attr: TokenStream, item: TokenStream) -> TokenStream {
    transaction_internal(attr, item).into()
}

fn transaction_internal(_attr: TokenStream, item: TokenStream) -> TokenStream2 {
    let input = match syn::parse::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(&input.sig, "#[transaction] requires an async fn")
            .to_compile_error();
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;
    let name = &sig.ident;

    quote! {
        #(#attrs)* #vis #sig {
            let labels = ::gust::transaction::TransactionLabels {
                success: concat!(stringify!(#name), "_success"),
                error: concat!(stringify!(#name), "_error"),
                latency: concat!(stringify!(#name), "_latency"),
            };
            ::gust::transaction::transaction_hook(labels, async move {
                #(#stmts)*
            }).await
        }
    }
}

/// Proc macro to denote a Scenario
///
/// The annotated function becomes the body of a single iteration. Calling the function returns a
/// `Scenario` which is configured with the builder methods from `ConfigurableScenario` and run by
/// awaiting it.
///
/// NOTE: Only works on `async` functions which take no arguments and have no return value.
///
/// # Example
/// ```ignore
/// use gust::prelude::*;
///
/// #[scenario]
/// async fn my_scenario() {
/// }
/// ```
#[proc_macro_attribute]
pub fn scenario(attr: TokenStream, item: TokenStream) -> TokenStream {
    scenario_internal(attr, item).into()
}

fn scenario_internal(_attr: TokenStream, item: TokenStream) -> TokenStream2 {
    let input = match syn::parse::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    if input.sig.asyncness.is_none() || !input.sig.inputs.is_empty() {
        return syn::Error::new_spanned(
            &input.sig,
            "#[scenario] requires an async fn without arguments",
        )
        .to_compile_error();
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;

    let new_name = Ident::new(&format!("__gust_{}", sig.ident), Span::call_site());
    let mut new_sig = sig.clone();
    new_sig.ident = new_name.clone();

    let mut scen_sig = sig.clone();
    let scen_name = sig.ident.clone();
    scen_sig.asyncness = None;
    scen_sig.output = syn::parse_quote! {
        -> impl ::gust::scenario::ConfigurableScenario<::gust::RunStatistics>
    };

    quote! {
        #(#attrs)* #vis #scen_sig {
            ::gust::scenario::Scenario::new(stringify!(#scen_name), #new_name)
        }

        #(#attrs)* #vis #new_sig {
            #(#stmts)*
        }
    }
}
