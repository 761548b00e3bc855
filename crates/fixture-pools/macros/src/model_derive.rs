//! Implementation of `#[derive(Model)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

use crate::model_attr::{parse_field_options, parse_struct_options};

pub(crate) fn derive_model_impl(input: DeriveInput) -> syn::Result<TokenStream> {
	let struct_name = &input.ident;

	let fields = match &input.data {
		Data::Struct(data) => match &data.fields {
			Fields::Named(fields) => &fields.named,
			_ => {
				return Err(syn::Error::new_spanned(
					struct_name,
					"Model can only be derived for structs with named fields",
				));
			}
		},
		_ => {
			return Err(syn::Error::new_spanned(
				struct_name,
				"Model can only be derived for structs",
			));
		}
	};

	let struct_options = parse_struct_options(&input.attrs)?;

	// Embedded models go first so later `.field` calls replace their entries.
	let mut inherited = Vec::new();
	let mut declared = Vec::new();
	for field in fields {
		let options = parse_field_options(&field.attrs)?;
		if options.skip {
			continue;
		}
		let Some(ident) = &field.ident else {
			continue;
		};
		let ty = &field.ty;

		if options.inherit {
			inherited.push(quote! {
				.inherit(
					<#ty as ::fixture_pools::Model>::fields(),
					|m| &m.#ident,
					|m| &mut m.#ident,
				)
			});
		} else {
			let name = options
				.rename
				.unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
			declared.push(quote! {
				.field::<#ty>(#name, |m| &m.#ident, |m| &mut m.#ident)
			});
		}
	}

	let model_name = struct_options.name.map(|name| {
		quote! {
			fn model_name() -> &'static str {
				#name
			}
		}
	});

	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

	Ok(quote! {
		impl #impl_generics ::fixture_pools::Model for #struct_name #ty_generics #where_clause {
			fn fields() -> ::fixture_pools::FieldSet<Self> {
				::fixture_pools::FieldSet::<Self>::new()
					#(#inherited)*
					#(#declared)*
			}

			#model_name
		}
	})
}
