//! `#[tool]` attribute implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, FnArg, ItemFn, LitStr, Pat, ReturnType, Type};

use crate::utils::{doc_text, is_named, result_error_type, to_pascal_case};

#[derive(Default)]
struct ToolArgs {
    name: Option<String>,
    description: Option<String>,
    defaults: Vec<(syn::Ident, syn::Expr)>,
}

impl ToolArgs {
    fn default_for(&self, ident: &syn::Ident) -> Option<&syn::Expr> {
        self.defaults
            .iter()
            .find(|(name, _)| name == ident)
            .map(|(_, value)| value)
    }
}

/// Implementation for `#[tool]`.
pub fn tool_attribute_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ToolArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else if meta.path.is_ident("description") {
            args.description = Some(meta.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else if meta.path.is_ident("defaults") {
            meta.parse_nested_meta(|inner| {
                let ident = inner
                    .path
                    .get_ident()
                    .cloned()
                    .ok_or_else(|| inner.error("expected a parameter name"))?;
                let value = inner.value()?.parse::<syn::Expr>()?;
                args.defaults.push((ident, value));
                Ok(())
            })
        } else {
            Err(meta.error(
                "unsupported tool attribute; expected `name`, `description` or `defaults`",
            ))
        }
    });
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as ItemFn);
    match expand(&args, &input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct Param<'a> {
    ident: &'a syn::Ident,
    ty: &'a Type,
}

fn expand(args: &ToolArgs, input: &ItemFn) -> syn::Result<TokenStream2> {
    let sig = &input.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[tool] functions cannot be generic",
        ));
    }

    let mut params = Vec::new();
    for arg in &sig.inputs {
        match arg {
            FnArg::Receiver(r) => {
                return Err(syn::Error::new_spanned(
                    r,
                    "#[tool] functions cannot take `self`",
                ))
            }
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat) => params.push(Param {
                    ident: &pat.ident,
                    ty: &pat_type.ty,
                }),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "#[tool] parameters must be plain identifiers",
                    ))
                }
            },
        }
    }

    if let Some((unknown, _)) = args
        .defaults
        .iter()
        .find(|(name, _)| !params.iter().any(|p| p.ident == name))
    {
        return Err(syn::Error::new_spanned(
            unknown,
            format!("`defaults` names unknown parameter `{unknown}`"),
        ));
    }

    let fn_name = &sig.ident;
    let fn_name_str = fn_name.to_string();
    let tool_name = args.name.clone().unwrap_or_else(|| fn_name_str.clone());
    let pascal = to_pascal_case(&fn_name_str);
    let params_struct = format_ident!("{}Params", pascal);
    let tool_struct = format_ident!("{}Tool", pascal);
    let vis = &input.vis;

    let docs = doc_text(&input.attrs);
    let documentation = if docs.trim().is_empty() {
        quote!(None)
    } else {
        quote!(Some(#docs))
    };

    let descriptors: Vec<TokenStream2> = params
        .iter()
        .enumerate()
        .map(|(position, p)| {
            let name = p.ident.to_string();
            let ty = p.ty;
            let type_name = quote!(#ty).to_string();
            let default = args.default_for(p.ident).map(|value| {
                quote!(.with_default(::maestro_tools::__private::serde_json::json!(#value)))
            });
            quote! {
                ::maestro_tools::ParameterDescriptor::new(#name, #position)
                    .with_type_name(#type_name)
                    #default
            }
        })
        .collect();

    let extractions: Vec<TokenStream2> = params
        .iter()
        .map(|p| extract_param(p, args.default_for(p.ident)))
        .collect();
    let call_args: Vec<TokenStream2> = params.iter().map(call_arg).collect();

    let await_call = sig.asyncness.map(|_| quote!(.await));
    let call = quote!(#fn_name(#(#call_args),*) #await_call);

    let produce = match &sig.output {
        ReturnType::Default => quote! {
            #call;
            Ok(::maestro_tools::__private::serde_json::Value::Null)
        },
        ReturnType::Type(_, ty) => {
            let unwrap = match result_error_type(ty) {
                Some(err) if is_named(err, "ToolError") => quote!(?),
                Some(_) => quote! {
                    .map_err(|e| ::maestro_tools::ToolError::fault(e.to_string()))?
                },
                None => quote!(),
            };
            quote! {
                let output = #call #unwrap;
                Ok(::maestro_tools::__private::serde_json::to_value(output)?)
            }
        }
    };

    let description_default = match &args.description {
        Some(d) => quote! {
            if options.description.is_none() {
                options.description = Some(#d.to_string());
            }
        },
        None => quote!(),
    };

    let params_doc = format!("Compile-time parameter descriptors of [`{fn_name_str}`].");
    let tool_doc = format!("Tool wrapper generated for [`{fn_name_str}`].");

    Ok(quote! {
        #input

        #[doc = #params_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #params_struct;

        impl ::maestro_tools::ParameterSource for #params_struct {
            fn tool_name(&self) -> &str {
                #tool_name
            }

            fn documentation(&self) -> Option<&str> {
                #documentation
            }

            fn parameters(&self) -> Vec<::maestro_tools::ParameterDescriptor> {
                vec![#(#descriptors),*]
            }
        }

        #[doc = #tool_doc]
        #[derive(Debug, Clone)]
        #vis struct #tool_struct {
            definition: ::maestro_tools::ToolDefinition,
        }

        impl #tool_struct {
            /// Derive the tool with default options.
            #vis fn new() -> ::std::result::Result<Self, ::maestro_tools::SchemaError> {
                Self::with_options(&::maestro_tools::DeriveOptions::new())
            }

            /// Derive the tool with explicit options.
            #vis fn with_options(
                options: &::maestro_tools::DeriveOptions,
            ) -> ::std::result::Result<Self, ::maestro_tools::SchemaError> {
                #[allow(unused_mut)]
                let mut options = options.clone();
                #description_default
                Ok(Self {
                    definition: ::maestro_tools::SchemaDeriver::derive(&#params_struct, &options)?,
                })
            }
        }

        #[::maestro_tools::__private::async_trait]
        impl ::maestro_tools::Tool for #tool_struct {
            fn definition(&self) -> &::maestro_tools::ToolDefinition {
                &self.definition
            }

            #[allow(unused_mut, unused_variables)]
            async fn call(
                &self,
                mut __maestro_args: ::maestro_tools::ToolArgs,
            ) -> ::maestro_tools::ToolResult {
                #(#extractions)*
                #produce
            }
        }
    })
}

/// The owned type to deserialize for a parameter, and whether it is
/// borrowed (`&`), mutably borrowed (`&mut`) or passed by value.
fn owned_type(ty: &Type) -> (TokenStream2, Option<bool>) {
    match ty {
        Type::Reference(r) => {
            let owned = match &*r.elem {
                Type::Path(p) if p.path.is_ident("str") => quote!(::std::string::String),
                Type::Slice(s) => {
                    let elem = &s.elem;
                    quote!(::std::vec::Vec<#elem>)
                }
                elem => quote!(#elem),
            };
            (owned, Some(r.mutability.is_some()))
        }
        other => (quote!(#other), None),
    }
}

fn extract_param(p: &Param<'_>, default: Option<&syn::Expr>) -> TokenStream2 {
    let ident = p.ident;
    let name = ident.to_string();
    let (owned, borrow) = owned_type(p.ty);
    let mutability = matches!(borrow, Some(true)).then(|| quote!(mut));
    let fallback = match default {
        Some(value) => quote!(::maestro_tools::__private::serde_json::json!(#value)),
        None => quote!(::maestro_tools::__private::serde_json::Value::Null),
    };
    quote! {
        let #mutability #ident: #owned = ::maestro_tools::__private::serde_json::from_value(
            __maestro_args
                .remove(#name)
                .unwrap_or_else(|| #fallback),
        )
        .map_err(|e| ::maestro_tools::ToolError::invalid_field(#name, e.to_string()))?;
    }
}

fn call_arg(p: &Param<'_>) -> TokenStream2 {
    let ident = p.ident;
    match owned_type(p.ty).1 {
        Some(true) => quote!(&mut #ident),
        Some(false) => quote!(&#ident),
        None => quote!(#ident),
    }
}
