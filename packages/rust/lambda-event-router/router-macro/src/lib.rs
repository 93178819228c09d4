//! Procedural macros for the lambda-event-router crate.
//!
//! **Note**: This is a proc-macro implementation crate for [lambda-event-router](https://crates.io/crates/lambda-event-router)
//! and is not meant to be used directly. Please use the main crate instead.
//!
//! The macros in this crate are re-exported by the main crate, and using them directly
//! may lead to version conflicts or other issues.

use darling::{ast::NestedMeta, Error, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::ItemFn;

#[derive(Debug, FromMeta)]
struct RouteArgs {
    path: String,
    #[darling(default = "default_method")]
    method: String,
    #[darling(default)]
    auth: bool,
    #[darling(default = "default_module_name")]
    module: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_module_name() -> String {
    "__lambda_event_router_default_router".to_string()
}

/// Registers an async function as a route handler.
///
/// The function is added to the route registry before `main` runs and is picked
/// up by `RouterBuilder::from_registry()` for the router's state type.
///
/// # Arguments
///
/// * `path` - The path pattern to match (required). Segments starting with `:` capture a parameter
/// * `method` - The HTTP method to match (optional, defaults to "GET")
/// * `auth` - Marks the route as requiring authorization (optional, defaults to `false`)
/// * `module` - The module created by `define_router!` (optional, defaults to the unnamed router)
///
/// # Function Signature
///
/// The handler must be `async` and take exactly one `RouteContext` parameter:
///
/// ```rust,ignore
/// #[route(path = "/items/:id", method = "PUT", auth = true)]
/// async fn update_item(ctx: RouteContext) -> Result<NormalizedResult, Error> {
///     let id = ctx.get_param_or_empty("id");
///     Ok(NormalizedResult::json(200, &json!({ "updated": id })))
/// }
/// ```
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(args.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(Error::from(e).write_errors());
        }
    };
    let input = syn::parse_macro_input!(input as ItemFn);

    impl_route(attr_args, input).into()
}

fn impl_route(args: Vec<NestedMeta>, input: ItemFn) -> proc_macro2::TokenStream {
    let route_args = match RouteArgs::from_list(&args) {
        Ok(v) => v,
        Err(e) => return e.write_errors(),
    };

    if let Err(e) = validate_signature(&input) {
        return e.to_compile_error();
    }

    let fn_name = &input.sig.ident;
    let method = route_args.method.to_uppercase();
    let path = &route_args.path;
    let auth = route_args.auth;
    let module = format_ident!("{}", route_args.module);
    let register_fn = format_ident!("__register_{}", fn_name);

    quote! {
        #[::lambda_event_router::ctor::ctor]
        fn #register_fn() {
            ::lambda_event_router::register_route::<#module::State>(
                #method,
                #path,
                #auth,
                |ctx| Box::pin(async move {
                    #fn_name(ctx).await
                })
            );
        }

        #input
    }
}

fn validate_signature(input: &ItemFn) -> Result<(), syn::Error> {
    if input.sig.asyncness.is_none() {
        return Err(syn::Error::new(
            input.sig.fn_token.span(),
            "Route handler must be an async fn",
        ));
    }

    let mut inputs = input.sig.inputs.iter();
    let (Some(param), None) = (inputs.next(), inputs.next()) else {
        return Err(syn::Error::new(
            input.sig.span(),
            "Route handler must have exactly one parameter of type RouteContext",
        ));
    };

    let syn::FnArg::Typed(pat_type) = param else {
        return Err(syn::Error::new(
            param.span(),
            "Invalid parameter declaration",
        ));
    };

    let is_route_context = match &*pat_type.ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "RouteContext"),
        _ => false,
    };

    if !is_route_context {
        return Err(syn::Error::new(
            pat_type.ty.span(),
            "Parameter must be of type RouteContext",
        ));
    }

    Ok(())
}
