//! Parsing of `#[model(...)]` attributes.

use syn::{Attribute, LitStr};

/// Options from a struct-level `#[model(...)]`.
#[derive(Debug, Default)]
pub(crate) struct StructOptions {
	pub(crate) name: Option<String>,
}

/// Options from a field-level `#[model(...)]`.
#[derive(Debug, Default)]
pub(crate) struct FieldOptions {
	pub(crate) skip: bool,
	pub(crate) inherit: bool,
	pub(crate) rename: Option<String>,
}

pub(crate) fn parse_struct_options(attrs: &[Attribute]) -> syn::Result<StructOptions> {
	let mut options = StructOptions::default();
	for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("name") {
				let value: LitStr = meta.value()?.parse()?;
				options.name = Some(value.value());
				Ok(())
			} else {
				Err(meta.error("unsupported model attribute, expected `name`"))
			}
		})?;
	}
	Ok(options)
}

pub(crate) fn parse_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
	let mut options = FieldOptions::default();
	for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("skip") {
				options.skip = true;
				Ok(())
			} else if meta.path.is_ident("inherit") {
				options.inherit = true;
				Ok(())
			} else if meta.path.is_ident("rename") {
				let value: LitStr = meta.value()?.parse()?;
				options.rename = Some(value.value());
				Ok(())
			} else {
				Err(meta.error(
					"unsupported model field attribute, expected `skip`, `inherit` or `rename`",
				))
			}
		})?;

		if options.inherit && options.rename.is_some() {
			return Err(syn::Error::new_spanned(
				attr,
				"`inherit` and `rename` cannot be combined",
			));
		}
	}
	Ok(options)
}
