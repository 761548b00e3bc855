//! Per-type field accessor tables.
//!
//! Definitions read and write fields by name. Rust has no runtime
//! reflection, so every model publishes an explicit table of accessors,
//! usually generated by `#[derive(Model)]`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::SeedingResult;
use crate::value::{FieldValue, Value};

type Reader<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type Writer<T> = Arc<dyn Fn(&mut T, Value) -> SeedingResult<()> + Send + Sync>;

/// Read and write capability for one named field.
pub struct FieldAccessor<T> {
	reader: Reader<T>,
	writer: Writer<T>,
}

impl<T> FieldAccessor<T> {
	/// Reads the current field value.
	pub fn read(&self, target: &T) -> Value {
		(self.reader)(target)
	}

	/// Assigns a value, converting it to the field type.
	pub fn write(&self, target: &mut T, value: Value) -> SeedingResult<()> {
		(self.writer)(target, value)
	}
}

impl<T> Clone for FieldAccessor<T> {
	fn clone(&self) -> Self {
		Self {
			reader: Arc::clone(&self.reader),
			writer: Arc::clone(&self.writer),
		}
	}
}

/// Named field accessors of one model type.
///
/// # Example
///
/// ```
/// use fixture_pools::{FieldSet, Model};
///
/// #[derive(Default)]
/// struct Tag {
///     label: String,
///     weight: i32,
/// }
///
/// impl Model for Tag {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::<Self>::new()
///             .field::<String>("label", |t| &t.label, |t| &mut t.label)
///             .field::<i32>("weight", |t| &t.weight, |t| &mut t.weight)
///     }
/// }
///
/// let fields = Tag::fields();
/// assert!(fields.contains("label"));
/// assert_eq!(fields.len(), 2);
/// ```
pub struct FieldSet<T> {
	fields: IndexMap<String, FieldAccessor<T>>,
}

impl<T: 'static> FieldSet<T> {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self {
			fields: IndexMap::new(),
		}
	}

	/// Declares a field through a pair of lenses.
	///
	/// Declaring the same name twice keeps the later declaration.
	pub fn field<V>(
		self,
		name: impl Into<String>,
		get: fn(&T) -> &V,
		get_mut: fn(&mut T) -> &mut V,
	) -> Self
	where
		V: FieldValue + Clone + 'static,
	{
		self.accessor(
			name,
			move |target: &T| -> Value { get(target).clone().into() },
			move |target: &mut T, value: Value| -> SeedingResult<()> {
				*get_mut(target) = V::from_value(value)?;
				Ok(())
			},
		)
	}

	/// Declares a field with arbitrary read and write functions.
	///
	/// Useful for fields that are not stored verbatim (a setter that
	/// normalizes, a field held behind a private wrapper).
	pub fn accessor<R, W>(mut self, name: impl Into<String>, read: R, write: W) -> Self
	where
		R: Fn(&T) -> Value + Send + Sync + 'static,
		W: Fn(&mut T, Value) -> SeedingResult<()> + Send + Sync + 'static,
	{
		self.fields.insert(
			name.into(),
			FieldAccessor {
				reader: Arc::new(read),
				writer: Arc::new(write),
			},
		);
		self
	}

	/// Embeds the fields of a parent model stored inside `T`.
	///
	/// Names already declared on `T` are kept: the embedding type always
	/// wins a collision, whichever order the calls are made in.
	pub fn inherit<P: 'static>(
		mut self,
		parent: FieldSet<P>,
		project: fn(&T) -> &P,
		project_mut: fn(&mut T) -> &mut P,
	) -> Self {
		for (name, accessor) in parent.fields {
			if let Entry::Vacant(slot) = self.fields.entry(name) {
				let FieldAccessor { reader, writer } = accessor;
				slot.insert(FieldAccessor {
					reader: Arc::new(move |target: &T| reader(project(target))),
					writer: Arc::new(move |target: &mut T, value: Value| {
						writer(project_mut(target), value)
					}),
				});
			}
		}
		self
	}

	/// Looks up a field accessor.
	pub fn get(&self, name: &str) -> Option<&FieldAccessor<T>> {
		self.fields.get(name)
	}

	/// Returns true if the field exists.
	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	/// Field names in declaration order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	/// Number of fields.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Returns true if no fields are declared.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

impl<T: 'static> Default for FieldSet<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> fmt::Debug for FieldSet<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.fields.keys()).finish()
	}
}
