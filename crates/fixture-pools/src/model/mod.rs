//! Fixture model types.
//!
//! A model is any struct whose fields a [`Definition`](crate::Definition)
//! can populate by name. The accessor table is published through
//! [`Model::fields`] and cached by each definition on first use.

mod fields;

pub use fields::{FieldAccessor, FieldSet};

use crate::instance::short_type_name;

/// A type that fixture definitions can build and populate.
///
/// Usually derived:
///
/// ```ignore
/// use fixture_pools::Model;
///
/// #[derive(Default, Model)]
/// struct User {
///     id: String,
///     name: String,
///     group: Option<Instance<Group>>,
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
	/// Builds the field accessor table.
	fn fields() -> FieldSet<Self>;

	/// Name used in error messages and matched against the type part of
	/// an `alias:TypeName` pool spec.
	fn model_name() -> &'static str {
		short_type_name(std::any::type_name::<Self>())
	}
}
