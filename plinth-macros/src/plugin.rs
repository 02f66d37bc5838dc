//! The `#[plugin]` attribute.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, ItemStruct, LitStr, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// Arguments for the `#[plugin]` macro: `"name"` or `name = "name"`.
pub(crate) struct PluginArgs {
    pub name: LitStr,
}

impl Parse for PluginArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            let name = input.parse()?;
            return Ok(PluginArgs { name });
        }

        let ident: Ident = input.parse()?;
        if ident != "name" {
            return Err(syn::Error::new(
                ident.span(),
                format!("unknown attribute: {}", ident),
            ));
        }
        input.parse::<Token![=]>()?;
        let name = input.parse()?;
        Ok(PluginArgs { name })
    }
}

/// Implementation of the `#[plugin]` macro.
pub fn plugin_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as PluginArgs);
    let input = parse_macro_input!(item as ItemStruct);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "Plugin types cannot be generic")
            .to_compile_error()
            .into();
    }

    if args.name.value().is_empty() {
        return syn::Error::new_spanned(&args.name, "Plugin name must not be empty")
            .to_compile_error()
            .into();
    }

    let struct_name = &input.ident;
    let name = &args.name;
    let factory = format_ident!("__plinth_make_{}", struct_name);

    let expanded = quote! {
        #input

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #factory() -> ::std::sync::Arc<dyn ::plinth::Plugin> {
            ::std::sync::Arc::new(<#struct_name as ::core::default::Default>::default())
        }

        ::plinth::inventory::submit! {
            ::plinth::CollectedPlugin::new(#name, #factory)
        }
    };

    TokenStream::from(expanded)
}
