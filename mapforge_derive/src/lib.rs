mod args;
mod config_doc;

use crate::{args::Args, config_doc::*};
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::{ToTokens, quote};
use syn::{Fields, parse_macro_input, spanned::Spanned};

/// Generates `demo_yaml()` for a config struct.
///
/// Every named field becomes one YAML key. Doc comments are emitted as `#` comments, the value is
/// taken from `#[config_demo("...")]` or derived from the field type. Nested config structs must
/// derive `ConfigDoc` themselves.
#[proc_macro_derive(ConfigDoc, attributes(config_demo))]
pub fn derive_config_doc(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as syn::DeriveInput);
	let name = &input.ident;

	let syn::Data::Struct(data) = &input.data else {
		return syn::Error::new(input.span(), "ConfigDoc can only be derived for structs with named fields")
			.to_compile_error()
			.into();
	};

	let Fields::Named(named) = &data.fields else {
		return syn::Error::new(data.struct_token.span(), "ConfigDoc requires a struct with named fields")
			.to_compile_error()
			.into();
	};

	let blocks = named.named.iter().map(|field| {
		let ident = field.ident.as_ref().expect("named field");
		let key = serde_rename(&field.attrs).unwrap_or_else(|| ident.to_string());
		let key_lit = syn::LitStr::new(&key, Span::call_site());
		let doc_lit = syn::LitStr::new(&collect_doc(&field.attrs), Span::call_site());
		let ty = &field.ty;

		let emit_doc = quote! {
			for line in #doc_lit.lines() {
				__s.push_str(&__sp(__indent));
				__s.push_str("# ");
				__s.push_str(line);
				__s.push('\n');
			}
		};

		let emit_value = match (demo_value(&field.attrs), classify(ty)) {
			(Some(demo), _) => {
				let demo_lit = syn::LitStr::new(&demo, Span::call_site());
				quote! {
					__s.push_str(": ");
					__s.push_str(#demo_lit);
					__s.push('\n');
				}
			}
			(None, FieldClass::Nested) => quote! {
				__s.push_str(":\n");
				__s.push_str(&<#ty>::demo_yaml_with_indent(__indent + 2));
			},
			(None, FieldClass::Primitive) => quote! {
				let __v: #ty = ::core::default::Default::default();
				let __y = ::serde_yaml_ng::to_string(&__v).unwrap_or_default();
				__s.push_str(": ");
				__s.push_str(__y.trim());
				__s.push('\n');
			},
			(None, FieldClass::Optional) => quote! { __s.push_str(": ~\n"); },
			(None, FieldClass::List) => quote! { __s.push_str(": []\n"); },
			(None, FieldClass::Map) => quote! { __s.push_str(": {}\n"); },
		};

		quote! {
			#emit_doc
			__s.push_str(&__sp(__indent));
			__s.push_str(#key_lit);
			#emit_value
		}
	});

	let expanded = quote! {
		impl #name {
			pub fn demo_yaml() -> String {
				Self::demo_yaml_with_indent(0)
			}

			pub(crate) fn demo_yaml_with_indent(__indent: usize) -> String {
				let mut __s = String::new();
				let __sp = |n: usize| -> String { " ".repeat(n) };
				#( { #blocks } )*
				__s
			}
		}
	};

	TokenStream::from(expanded)
}

/// Wraps the function body so that any error it returns gets the formatted message as context.
///
/// Works for sync and async functions returning `anyhow::Result`. Prefix the arguments with
/// `move,` when the body has to take ownership of captured values.
#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let Args(move_token, format_args) = parse_macro_input!(args);
	let mut input = parse_macro_input!(input as syn::ItemFn);

	let body = &input.block;
	let err = Ident::new("err", Span::mixed_site());

	let new_body = if input.sig.asyncness.is_some() {
		let return_type = match &input.sig.output {
			syn::ReturnType::Default => {
				return syn::Error::new_spanned(input, "function should return Result")
					.to_compile_error()
					.into();
			}
			syn::ReturnType::Type(_, return_type) => return_type,
		};
		let result = Ident::new("result", Span::mixed_site());
		quote! {
			let #result: #return_type = async #move_token { #body }.await;
			#result.map_err(|#err| #err.context(format!(#format_args)).into())
		}
	} else {
		let return_type = &input.sig.output;
		// an owned value moved into the closure keeps it FnOnce
		let once = Ident::new("once", Span::mixed_site());
		quote! {
			let #once = ::core::iter::empty::<()>();
			(#move_token || #return_type {
				::core::mem::drop(#once);
				#body
			})().map_err(|#err| #err.context(format!(#format_args)).into())
		}
	};
	input.block.stmts = vec![syn::Stmt::Expr(syn::Expr::Verbatim(new_body), None)];

	input.into_token_stream().into()
}
