//! Runtime field values.
//!
//! Rules produce [`Value`]s and field accessors read and write them. Field
//! matching compares values exactly: no coercion between integers and floats,
//! and object references compare by identity.

use crate::error::{SeedingError, SeedingResult};
use crate::instance::{AnyInstance, Instance};

/// A value stored in, or compared against, a fixture field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	/// Absent value (`None` fields, unset references).
	#[default]
	Null,

	/// Boolean.
	Bool(bool),

	/// Any integer that fits in an `i64`.
	Int(i64),

	/// Unsigned integers above `i64::MAX`.
	UInt(u64),

	/// Floating point number.
	Float(f64),

	/// String.
	Str(String),

	/// Reference to another fixture object.
	Ref(AnyInstance),

	/// Ordered list of values.
	List(Vec<Value>),
}

impl Value {
	/// Short name of the variant, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::UInt(_) => "uint",
			Self::Float(_) => "float",
			Self::Str(_) => "string",
			Self::Ref(_) => "reference",
			Self::List(_) => "list",
		}
	}

	/// Returns true for [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Returns the string slice if this is a [`Value::Str`].
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the integer if this is a [`Value::Int`].
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Returns the boolean if this is a [`Value::Bool`].
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the typed handle if this references a `T`.
	pub fn as_instance<T: Send + Sync + 'static>(&self) -> Option<Instance<T>> {
		match self {
			Self::Ref(any) => any.downcast::<T>(),
			_ => None,
		}
	}
}

/// Conversion from a [`Value`] back into a concrete field type.
///
/// The opposite direction is plain `Into<Value>`. Conversions never cross
/// variants: an integer is not accepted by a float field, so a value read
/// back from a field always equals the value that was written.
pub trait FieldValue: Into<Value> + Sized {
	/// Converts the value, failing with [`SeedingError::InvalidValue`] when
	/// the variant does not fit the field type.
	fn from_value(value: Value) -> SeedingResult<Self>;
}

fn invalid<T>(value: &Value) -> SeedingError {
	SeedingError::InvalidValue {
		expected: std::any::type_name::<T>(),
		found: match value {
			Value::Ref(any) => format!("reference to {}", any.type_name()),
			other => other.kind().to_string(),
		},
	}
}

impl FieldValue for Value {
	fn from_value(value: Value) -> SeedingResult<Self> {
		Ok(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl FieldValue for bool {
	fn from_value(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Bool(b) => Ok(b),
			other => Err(invalid::<bool>(&other)),
		}
	}
}

macro_rules! small_integer_value {
	($($ty:ty),*) => {$(
		impl From<$ty> for Value {
			fn from(value: $ty) -> Self {
				Self::Int(i64::from(value))
			}
		}
	)*};
}

small_integer_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
	fn from(value: u64) -> Self {
		match i64::try_from(value) {
			Ok(i) => Self::Int(i),
			Err(_) => Self::UInt(value),
		}
	}
}

impl From<usize> for Value {
	fn from(value: usize) -> Self {
		Self::from(value as u64)
	}
}

macro_rules! integer_field_value {
	($($ty:ty),*) => {$(
		impl FieldValue for $ty {
			fn from_value(value: Value) -> SeedingResult<Self> {
				let converted = match &value {
					Value::Int(i) => <$ty>::try_from(*i).ok(),
					Value::UInt(u) => <$ty>::try_from(*u).ok(),
					_ => None,
				};
				converted.ok_or_else(|| invalid::<$ty>(&value))
			}
		}
	)*};
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<f32> for Value {
	fn from(value: f32) -> Self {
		Self::Float(f64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl FieldValue for f64 {
	fn from_value(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Float(f) => Ok(f),
			other => Err(invalid::<f64>(&other)),
		}
	}
}

impl FieldValue for f32 {
	fn from_value(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Float(f) => Ok(f as f32),
			other => Err(invalid::<f32>(&other)),
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Str(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl FieldValue for String {
	fn from_value(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Str(s) => Ok(s),
			other => Err(invalid::<String>(&other)),
		}
	}
}

impl<T: Send + Sync + 'static> From<Instance<T>> for Value {
	fn from(value: Instance<T>) -> Self {
		Self::Ref(value.erase())
	}
}

impl<T: Send + Sync + 'static> From<&Instance<T>> for Value {
	fn from(value: &Instance<T>) -> Self {
		Self::Ref(value.erase())
	}
}

impl From<AnyInstance> for Value {
	fn from(value: AnyInstance) -> Self {
		Self::Ref(value)
	}
}

impl<T: Send + Sync + 'static> FieldValue for Instance<T> {
	fn from_value(value: Value) -> SeedingResult<Self> {
		value
			.as_instance::<T>()
			.ok_or_else(|| invalid::<Instance<T>>(&value))
	}
}

impl<V: Into<Value>> From<Option<V>> for Value {
	fn from(value: Option<V>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

impl<V: FieldValue> FieldValue for Option<V> {
	fn from_value(value: Value) -> SeedingResult<Self> {
		match value {
			Value::Null => Ok(None),
			other => V::from_value(other).map(Some),
		}
	}
}

impl<V: Into<Value>> From<Vec<V>> for Value {
	fn from(value: Vec<V>) -> Self {
		Self::List(value.into_iter().map(Into::into).collect())
	}
}

impl<V: FieldValue> FieldValue for Vec<V> {
	fn from_value(value: Value) -> SeedingResult<Self> {
		match value {
			Value::List(items) => items.into_iter().map(V::from_value).collect(),
			other => Err(invalid::<Vec<V>>(&other)),
		}
	}
}

#[cfg(feature = "json")]
impl TryFrom<serde_json::Value> for Value {
	type Error = SeedingError;

	fn try_from(value: serde_json::Value) -> SeedingResult<Self> {
		use serde_json::Value as Json;

		Ok(match value {
			Json::Null => Self::Null,
			Json::Bool(b) => Self::Bool(b),
			Json::Number(n) => {
				if let Some(i) = n.as_i64() {
					Self::Int(i)
				} else if let Some(u) = n.as_u64() {
					Self::UInt(u)
				} else {
					Self::Float(n.as_f64().unwrap_or(f64::NAN))
				}
			}
			Json::String(s) => Self::Str(s),
			Json::Array(items) => Self::List(
				items
					.into_iter()
					.map(Self::try_from)
					.collect::<SeedingResult<_>>()?,
			),
			Json::Object(_) => {
				return Err(SeedingError::InvalidValue {
					expected: "scalar or array",
					found: "object".to_string(),
				});
			}
		})
	}
}
