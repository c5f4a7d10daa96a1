use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{Expr, Ident, LitStr, Token, parse::Parse, parse::ParseStream, punctuated::Punctuated};

pub const RESOURCE_ACTIONS: [&str; 7] = [
    "index", "create", "store", "show", "edit", "update", "destroy",
];

/// `"/pattern"` optionally followed by `, name = "route.name"`.
pub struct PatternArgs {
    pub pattern: LitStr,
    pub name: Option<LitStr>,
}

impl Parse for PatternArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let pattern: LitStr = input.parse()?;
        let mut name = None;
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if key == "name" {
                name = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(key.span(), "expected `name = \"...\"`"));
            }
        }
        Ok(PatternArgs { pattern, name })
    }
}

pub enum MatcherArg {
    Literal(LitStr),
    Regex(LitStr),
    Expr(Expr),
}

/// `"key", "literal"`, `"key", regex = "..."` or `"key", matcher = expr`.
pub struct WhereArgs {
    pub key: LitStr,
    pub matcher: MatcherArg,
}

impl Parse for WhereArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: LitStr = input.parse()?;
        input.parse::<Token![,]>()?;

        let matcher = if input.peek(LitStr) {
            MatcherArg::Literal(input.parse()?)
        } else {
            let kind: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if kind == "regex" {
                let source: LitStr = input.parse()?;
                if let Err(err) = regex::Regex::new(&source.value()) {
                    return Err(syn::Error::new(
                        source.span(),
                        format!("invalid regex: {err}"),
                    ));
                }
                MatcherArg::Regex(source)
            } else if kind == "matcher" {
                MatcherArg::Expr(input.parse()?)
            } else {
                return Err(syn::Error::new(
                    kind.span(),
                    "expected a string literal, `regex = \"...\"` or `matcher = expr`",
                ));
            }
        };
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        Ok(WhereArgs { key, matcher })
    }
}

impl WhereArgs {
    pub fn matcher_tokens(&self) -> TokenStream2 {
        match &self.matcher {
            MatcherArg::Literal(source) => quote! { ::girouette::Matcher::literal(#source) },
            MatcherArg::Regex(source) => quote! {
                ::girouette::Matcher::regex(#source).expect("regex checked by #[controller]")
            },
            MatcherArg::Expr(expr) => quote! {
                ::core::convert::Into::<::girouette::Matcher>::into(#expr)
            },
        }
    }
}

/// Resource actions: `"*"`, `"store, update"`, `show` or `[store, update]`.
pub enum ActionsArg {
    All,
    Only(Vec<Ident>),
}

impl ActionsArg {
    fn from_names(names: Vec<(String, Span)>) -> syn::Result<Self> {
        let mut variants = Vec::with_capacity(names.len());
        for (name, span) in names {
            if !RESOURCE_ACTIONS.contains(&name.as_str()) {
                return Err(syn::Error::new(
                    span,
                    format!(
                        "unknown resource action `{name}`, expected one of: {}",
                        RESOURCE_ACTIONS.join(", ")
                    ),
                ));
            }
            variants.push(format_ident!("{}", capitalize(&name), span = span));
        }
        Ok(ActionsArg::Only(variants))
    }

    pub fn to_tokens(&self) -> TokenStream2 {
        match self {
            ActionsArg::All => quote! { ::girouette::ResourceActions::All },
            ActionsArg::Only(variants) => quote! {
                ::girouette::ResourceActions::Only(::std::vec![
                    #(::girouette::ResourceAction::#variants),*
                ])
            },
        }
    }
}

impl Parse for ActionsArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            let lit: LitStr = input.parse()?;
            let value = lit.value();
            if value.trim() == "*" {
                return Ok(ActionsArg::All);
            }
            let names = value
                .split(',')
                .map(|name| (name.trim().to_owned(), lit.span()))
                .collect();
            ActionsArg::from_names(names)
        } else if input.peek(syn::token::Bracket) {
            let content;
            syn::bracketed!(content in input);
            let idents: Punctuated<Ident, Token![,]> =
                content.parse_terminated(Ident::parse, Token![,])?;
            let names = idents
                .into_iter()
                .map(|ident| (ident.to_string(), ident.span()))
                .collect();
            ActionsArg::from_names(names)
        } else {
            let ident: Ident = input.parse()?;
            ActionsArg::from_names(vec![(ident.to_string(), ident.span())])
        }
    }
}

/// `actions, middleware`
pub struct ResourceMiddlewareArgs {
    pub actions: ActionsArg,
    pub middleware: Expr,
}

impl Parse for ResourceMiddlewareArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let actions = input.parse()?;
        input.parse::<Token![,]>()?;
        let middleware = input.parse()?;
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        Ok(ResourceMiddlewareArgs {
            actions,
            middleware,
        })
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_args() {
        let args: PatternArgs = syn::parse_str(r#""/users/:id", name = "users.show""#).unwrap();
        assert_eq!(args.pattern.value(), "/users/:id");
        assert_eq!(args.name.unwrap().value(), "users.show");

        assert!(syn::parse_str::<PatternArgs>(r#""/users", alias = "x""#).is_err());
    }

    #[test]
    fn test_where_args_validate_regex() {
        let args: WhereArgs = syn::parse_str(r#""id", regex = "^\\d+$""#).unwrap();
        assert!(matches!(args.matcher, MatcherArg::Regex(_)));

        assert!(syn::parse_str::<WhereArgs>(r#""id", regex = "(unclosed""#).is_err());
        assert!(syn::parse_str::<WhereArgs>(r#""id", pattern = "x""#).is_err());
    }

    #[test]
    fn test_resource_actions() {
        let all: ActionsArg = syn::parse_str(r#""*""#).unwrap();
        assert!(matches!(all, ActionsArg::All));

        let listed: ActionsArg = syn::parse_str("[store, update]").unwrap();
        match listed {
            ActionsArg::Only(variants) => {
                let names: Vec<String> = variants.iter().map(ToString::to_string).collect();
                assert_eq!(names, vec!["Store", "Update"]);
            }
            ActionsArg::All => panic!("expected listed actions"),
        }

        assert!(syn::parse_str::<ActionsArg>(r#""store, publish""#).is_err());
    }
}
