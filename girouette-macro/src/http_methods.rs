use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::format_ident;

pub const HTTP_METHODS: [&str; 6] = ["get", "post", "put", "patch", "delete", "any"];

/// `HttpMethod` variant for a verb attribute.
pub fn method_variant(verb: &str, span: Span) -> syn::Result<syn::Ident> {
    let variant = match verb {
        "get" => "Get",
        "post" => "Post",
        "put" => "Put",
        "patch" => "Patch",
        "delete" => "Delete",
        "any" => "Any",
        other => {
            return Err(syn::Error::new(
                span,
                format!("unknown route attribute `{other}`"),
            ));
        }
    };
    Ok(format_ident!("{}", variant, span = span))
}

/// Decorator attributes only mean something inside a `#[controller]` impl,
/// which consumes them before they expand. Reaching this is a misuse.
pub fn misplaced_attribute(name: &str, item: TokenStream) -> TokenStream {
    let item = TokenStream2::from(item);
    let message = format!("#[{name}] only works inside a #[controller] impl block");
    let error = syn::Error::new(Span::call_site(), message).to_compile_error();
    TokenStream::from(quote::quote! {
        #error
        #item
    })
}
