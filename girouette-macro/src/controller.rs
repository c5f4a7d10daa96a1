use crate::args::{PatternArgs, RESOURCE_ACTIONS, ResourceMiddlewareArgs, WhereArgs};
use crate::http_methods::{HTTP_METHODS, method_variant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Expr, FnArg, ImplItem, ImplItemFn, ItemImpl, parse_macro_input, spanned::Spanned};

const METHOD_ATTRS: [&str; 2] = ["where_param", "route_middleware"];
const CLASS_ATTRS: [&str; 2] = ["resource", "resource_middleware"];
const PARAM_ATTRS: [&str; 3] = ["body", "param", "query"];

#[derive(Clone, Copy)]
enum ParamKind {
    Body,
    Param,
    Query,
    Raw,
}

struct ParamInfo {
    ty: syn::Type,
    kind: ParamKind,
}

struct HandlerInfo {
    fn_name: syn::Ident,
    params: Vec<ParamInfo>,
}

pub fn controller_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    if !attr.is_empty() {
        return syn::Error::new(attr.span(), "#[controller] takes no arguments")
            .to_compile_error()
            .into();
    }
    let input = parse_macro_input!(item as ItemImpl);
    match generate_controller_impl(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn generate_controller_impl(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[controller] does not support generic impl blocks",
        ));
    }
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[controller] goes on an inherent impl block",
        ));
    }

    let mut decorations: Vec<TokenStream2> = Vec::new();
    let mut handlers: Vec<HandlerInfo> = Vec::new();

    for item in input.items.iter_mut() {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let key = method.sig.ident.to_string();
        let attrs = take_attrs(&mut method.attrs, |name| {
            HTTP_METHODS.contains(&name) || METHOD_ATTRS.contains(&name)
        });

        // Nearest to the fn applies first.
        for attr in attrs.iter().rev() {
            decorations.push(method_decoration(&key, attr)?);
        }

        if let Some(handler) = extract_handler(method, !attrs.is_empty())? {
            handlers.push(handler);
        }
    }

    let class_attrs = take_attrs(&mut input.attrs, |name| CLASS_ATTRS.contains(&name));
    for attr in class_attrs.iter().rev() {
        decorations.push(class_decoration(attr)?);
    }

    let self_ty = &input.self_ty;
    let decorate_body = if decorations.is_empty() {
        quote! { let _ = controller; }
    } else {
        quote! { #(controller #decorations;)* }
    };
    let endpoints_impl = generate_endpoints_impl(self_ty, &handlers);

    Ok(quote! {
        #input

        impl ::girouette::Controller for #self_ty {
            fn decorate(controller: &mut ::girouette::Decorate<'_>) {
                #decorate_body
            }
        }

        #endpoints_impl

        ::girouette::inventory::submit! {
            ::girouette::discovery::ControllerModule::new(
                ::core::module_path!(),
                ::girouette::discovery::load::<#self_ty>,
            )
        }
    })
}

fn attr_name(attr: &Attribute) -> Option<String> {
    attr.path()
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
}

/// Removes the attributes whose name matches `pred`, keeping their order.
fn take_attrs(attrs: &mut Vec<Attribute>, pred: impl Fn(&str) -> bool) -> Vec<Attribute> {
    let (taken, kept): (Vec<_>, Vec<_>) = attrs
        .drain(..)
        .partition(|attr| attr_name(attr).is_some_and(|name| pred(&name)));
    *attrs = kept;
    taken
}

fn method_decoration(key: &str, attr: &Attribute) -> syn::Result<TokenStream2> {
    let name = attr_name(attr).unwrap_or_default();
    let decorator = match name.as_str() {
        "where_param" => {
            let args: WhereArgs = attr.parse_args()?;
            let param = &args.key;
            let matcher = args.matcher_tokens();
            quote! { ::girouette::decorators::where_param(#param, #matcher) }
        }
        "route_middleware" => {
            let middleware: Expr = attr.parse_args()?;
            quote! { ::girouette::decorators::route_middleware(#middleware) }
        }
        verb => {
            let variant = method_variant(verb, attr.span())?;
            let args: PatternArgs = attr.parse_args()?;
            let pattern = &args.pattern;
            let route = quote! {
                ::girouette::decorators::Route::new(::girouette::HttpMethod::#variant, #pattern)
            };
            match &args.name {
                Some(route_name) => quote! { #route.name(#route_name) },
                None => route,
            }
        }
    };
    Ok(quote! { .method(#key, #decorator) })
}

fn class_decoration(attr: &Attribute) -> syn::Result<TokenStream2> {
    let decorator = if attr_name(attr).as_deref() == Some("resource_middleware") {
        let args: ResourceMiddlewareArgs = attr.parse_args()?;
        let actions = args.actions.to_tokens();
        let middleware = &args.middleware;
        quote! { ::girouette::decorators::resource_middleware(#actions, #middleware) }
    } else {
        let args: PatternArgs = attr.parse_args()?;
        let pattern = &args.pattern;
        match &args.name {
            Some(name) => quote! { ::girouette::decorators::resource(#pattern).name(#name) },
            None => quote! { ::girouette::decorators::resource(#pattern) },
        }
    };
    Ok(quote! { .class(#decorator) })
}

/// Collects the extractor shape of a route handler and strips its parameter
/// attributes. Handlers are the decorated methods plus those named after a
/// resource action; every other method is left alone.
fn extract_handler(method: &mut ImplItemFn, decorated: bool) -> syn::Result<Option<HandlerInfo>> {
    let sig = &method.sig;
    let is_action = RESOURCE_ACTIONS.contains(&sig.ident.to_string().as_str());
    if !decorated && !is_action {
        return Ok(None);
    }
    let takes_ref_self = matches!(
        sig.inputs.first(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    let is_handler = sig.asyncness.is_some() && takes_ref_self && sig.generics.params.is_empty();
    if !is_handler {
        if decorated {
            return Err(syn::Error::new(
                sig.span(),
                "route handlers must be non-generic `async fn(&self, ..)`",
            ));
        }
        // A non-handler method that happens to share an action name.
        return Ok(None);
    }

    let mut params = Vec::new();
    for input in method.sig.inputs.iter_mut() {
        if let FnArg::Typed(pat_type) = input {
            let kind = get_param_kind(&pat_type.attrs);
            pat_type
                .attrs
                .retain(|attr| !attr_name(attr).is_some_and(|name| PARAM_ATTRS.contains(&name.as_str())));
            params.push(ParamInfo {
                ty: (*pat_type.ty).clone(),
                kind,
            });
        }
    }
    Ok(Some(HandlerInfo {
        fn_name: method.sig.ident.clone(),
        params,
    }))
}

fn get_param_kind(attrs: &[Attribute]) -> ParamKind {
    for attr in attrs {
        match attr_name(attr).as_deref() {
            Some("body") => return ParamKind::Body,
            Some("param") => return ParamKind::Param,
            Some("query") => return ParamKind::Query,
            _ => {}
        }
    }
    ParamKind::Raw
}

fn generate_endpoints_impl(self_ty: &syn::Type, handlers: &[HandlerInfo]) -> TokenStream2 {
    let arms = handlers.iter().map(|handler| {
        let key = handler.fn_name.to_string();
        let fn_name = &handler.fn_name;

        let extractor_patterns: Vec<_> = handler
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let temp_ident = format_ident!("__p_{}", i);
                let ty = &p.ty;
                match p.kind {
                    ParamKind::Body => quote! { ::girouette::axum::Json(#temp_ident): ::girouette::axum::Json<#ty> },
                    ParamKind::Param => quote! { ::girouette::axum::extract::Path(#temp_ident): ::girouette::axum::extract::Path<#ty> },
                    ParamKind::Query => quote! { ::girouette::axum::extract::Query(#temp_ident): ::girouette::axum::extract::Query<#ty> },
                    ParamKind::Raw => quote! { #temp_ident: #ty },
                }
            })
            .collect();

        let internal_args: Vec<_> = (0..handler.params.len())
            .map(|i| format_ident!("__p_{}", i))
            .collect();

        quote! {
            #key => ::core::option::Option::Some(::girouette::host::axum::endpoint({
                let controller = self;
                move |#(#extractor_patterns),*| {
                    let controller = controller.clone();
                    async move {
                        use ::girouette::axum::response::IntoResponse;
                        controller.#fn_name(#(#internal_args),*).await.into_response()
                    }
                }
            })),
        }
    });

    let body = if handlers.is_empty() {
        quote! {
            let _ = (self, method);
            ::core::option::Option::None
        }
    } else {
        quote! {
            match method {
                #(#arms)*
                _ => ::core::option::Option::None,
            }
        }
    };

    quote! {
        impl ::girouette::host::axum::Endpoints for #self_ty {
            fn endpoint(
                self: ::std::sync::Arc<Self>,
                method: &str,
            ) -> ::core::option::Option<::girouette::host::axum::Endpoint> {
                #body
            }
        }
    }
}
