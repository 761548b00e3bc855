//! Procedural macros for fixture-pools.
//!
//! This crate provides the `#[derive(Model)]` macro, which generates the
//! field accessor table of a fixture model.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod model_attr;
mod model_derive;

/// Derives a `Model` implementation for a struct with named fields.
///
/// Every field becomes addressable by name from definition rules and
/// `fetch_by` lookups. Field types must implement `FieldValue` and `Clone`.
///
/// # Attributes
///
/// ## Struct-level attributes
///
/// - `#[model(name = "Name")]` - Overrides the model name matched against
///   `alias:TypeName` pool specs
///
/// ## Field-level attributes
///
/// - `#[model(skip)]` - Leaves the field out of the table
/// - `#[model(rename = "other")]` - Exposes the field under another name
/// - `#[model(inherit)]` - Embeds the fields of a nested model; fields
///   declared on the outer struct win name collisions
///
/// # Example
///
/// ```ignore
/// use fixture_pools::{Instance, Model};
///
/// #[derive(Default, Model)]
/// pub struct Person {
///     pub name: String,
/// }
///
/// #[derive(Default, Model)]
/// #[model(name = "Staff")]
/// pub struct Employee {
///     #[model(inherit)]
///     pub person: Person,
///
///     #[model(rename = "employer")]
///     pub company: Option<Instance<Company>>,
///
///     #[model(skip)]
///     pub cache: Vec<u8>,
/// }
/// ```
///
/// This generates:
///
/// ```ignore
/// impl ::fixture_pools::Model for Employee {
///     fn fields() -> ::fixture_pools::FieldSet<Self> {
///         ::fixture_pools::FieldSet::<Self>::new()
///             .inherit(<Person as ::fixture_pools::Model>::fields(), |m| &m.person, |m| &mut m.person)
///             .field::<Option<Instance<Company>>>("employer", |m| &m.company, |m| &mut m.company)
///     }
///
///     fn model_name() -> &'static str {
///         "Staff"
///     }
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	model_derive::derive_model_impl(input)
		.unwrap_or_else(|err| err.to_compile_error())
		.into()
}
