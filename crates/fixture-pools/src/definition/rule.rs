//! Attribute and reference rules.
//!
//! A rule is explicitly either a literal or something to invoke; a function
//! stored as data is never mistaken for a producer.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::error::SeedingResult;
use crate::factory::Factory;
use crate::instance::Instance;
use crate::value::Value;

/// Producer invoked once per instance with the owning factory.
pub type Producer = Arc<dyn Fn(&Factory) -> SeedingResult<Value> + Send + Sync>;

/// Producer that also sees the object being populated.
pub type Computed<T> = Arc<dyn Fn(&Factory, &T) -> SeedingResult<Value> + Send + Sync>;

/// How one field gets its value.
pub enum Rule<T> {
	/// Assigned as-is to every instance.
	Literal(Value),

	/// Invoked for each instance; receives the factory for cross-pool lookups.
	Producer(Producer),

	/// Invoked for each instance with the fields applied so far.
	Computed(Computed<T>),
}

impl<T> Rule<T> {
	/// A literal value.
	pub fn literal(value: impl Into<Value>) -> Self {
		Self::Literal(value.into())
	}

	/// A producer called once per instance.
	pub fn producer<V, F>(produce: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory) -> SeedingResult<V> + Send + Sync + 'static,
	{
		Self::Producer(Arc::new(move |factory: &Factory| {
			produce(factory).map(Into::into)
		}))
	}

	/// A producer computed from the partially populated object.
	pub fn computed<V, F>(compute: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory, &T) -> SeedingResult<V> + Send + Sync + 'static,
	{
		Self::Computed(Arc::new(move |factory: &Factory, target: &T| {
			compute(factory, target).map(Into::into)
		}))
	}

	/// Strings from a template where `{n}` counts up from 1.
	pub fn sequence(template: impl Into<String>) -> Self {
		let sequence = Arc::new(Sequence::new(template));
		Self::Producer(Arc::new(move |_: &Factory| {
			Ok(Value::Str(sequence.next_value()))
		}))
	}

	/// Returns true for [`Rule::Literal`].
	pub fn is_literal(&self) -> bool {
		matches!(self, Self::Literal(_))
	}

	/// Produces the value for one instance.
	///
	/// A computed rule holds a read lock on the instance while it runs.
	pub(crate) fn evaluate(
		&self,
		factory: &Factory,
		instance: &Instance<T>,
	) -> SeedingResult<Value> {
		match self {
			Self::Literal(value) => Ok(value.clone()),
			Self::Producer(produce) => produce(factory),
			Self::Computed(compute) => {
				let target = instance.read();
				compute(factory, &target)
			}
		}
	}
}

impl<T> Clone for Rule<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Literal(value) => Self::Literal(value.clone()),
			Self::Producer(produce) => Self::Producer(Arc::clone(produce)),
			Self::Computed(compute) => Self::Computed(Arc::clone(compute)),
		}
	}
}

impl<T> fmt::Debug for Rule<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
			Self::Producer(_) => f.write_str("Producer"),
			Self::Computed(_) => f.write_str("Computed"),
		}
	}
}

impl<T> From<Value> for Rule<T> {
	fn from(value: Value) -> Self {
		Self::Literal(value)
	}
}

/// Counter rendering `{n}` in a template.
#[derive(Debug)]
pub struct Sequence {
	template: String,
	counter: AtomicU64,
}

impl Sequence {
	/// Creates a sequence starting at 1.
	pub fn new(template: impl Into<String>) -> Self {
		Self {
			template: template.into(),
			counter: AtomicU64::new(0),
		}
	}

	/// Advances the counter and renders the template.
	pub fn next_value(&self) -> String {
		let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
		self.template.replace("{n}", &n.to_string())
	}

	/// Number of values produced so far.
	pub fn current(&self) -> u64 {
		self.counter.load(Ordering::Relaxed)
	}
}

/// Per-call field overrides for `create`.
///
/// Keys already present in a definition's attributes keep their position;
/// new keys are applied after them, in insertion order.
pub struct Overrides<T> {
	rules: IndexMap<String, Rule<T>>,
}

impl<T> Overrides<T> {
	/// No overrides.
	pub fn new() -> Self {
		Self {
			rules: IndexMap::new(),
		}
	}

	/// Overrides a field with a literal.
	pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.rules.insert(field.into(), Rule::literal(value));
		self
	}

	/// Overrides a field with a producer.
	pub fn with<V, F>(mut self, field: impl Into<String>, produce: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory) -> SeedingResult<V> + Send + Sync + 'static,
	{
		self.rules.insert(field.into(), Rule::producer(produce));
		self
	}

	/// Overrides a field with any rule.
	pub fn rule(mut self, field: impl Into<String>, rule: impl Into<Rule<T>>) -> Self {
		self.rules.insert(field.into(), rule.into());
		self
	}

	/// Builds literal overrides from a JSON object.
	///
	/// # Example
	///
	/// ```
	/// use fixture_pools::Overrides;
	/// use serde_json::json;
	///
	/// let overrides = Overrides::<()>::from_json(json!({"name": "admin", "active": true})).unwrap();
	/// assert_eq!(overrides.len(), 2);
	/// ```
	#[cfg(feature = "json")]
	pub fn from_json(object: serde_json::Value) -> SeedingResult<Self> {
		match object {
			serde_json::Value::Object(map) => {
				let mut overrides = Self::new();
				for (field, value) in map {
					overrides
						.rules
						.insert(field, Rule::Literal(Value::try_from(value)?));
				}
				Ok(overrides)
			}
			other => Err(crate::SeedingError::InvalidValue {
				expected: "JSON object",
				found: json_kind(&other).to_string(),
			}),
		}
	}

	/// Number of overridden fields.
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	/// Returns true if nothing is overridden.
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub(crate) fn into_rules(self) -> IndexMap<String, Rule<T>> {
		self.rules
	}
}

#[cfg(feature = "json")]
fn json_kind(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "bool",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

impl<T> Default for Overrides<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for Overrides<T> {
	fn clone(&self) -> Self {
		Self {
			rules: self.rules.clone(),
		}
	}
}

impl<T> fmt::Debug for Overrides<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.rules.iter()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_sequence_counts_from_one() {
		let sequence = Sequence::new("user_{n}");
		assert_eq!(sequence.next_value(), "user_1");
		assert_eq!(sequence.next_value(), "user_2");
		assert_eq!(sequence.current(), 2);
	}

	#[rstest]
	fn test_literal_rule_evaluates_to_clone() {
		// Arrange
		let factory = Factory::new();
		let instance = Instance::new(());
		let rule = Rule::<()>::literal("fixed");

		// Act
		let first = rule.evaluate(&factory, &instance).unwrap();
		let second = rule.evaluate(&factory, &instance).unwrap();

		// Assert
		assert_eq!(first, Value::from("fixed"));
		assert_eq!(first, second);
		assert!(rule.is_literal());
	}

	#[rstest]
	fn test_producer_rule_is_invoked_each_time() {
		let factory = Factory::new();
		let instance = Instance::new(());
		let rule = Rule::<()>::sequence("n{n}");
		assert_eq!(rule.evaluate(&factory, &instance).unwrap(), Value::from("n1"));
		assert_eq!(rule.evaluate(&factory, &instance).unwrap(), Value::from("n2"));
	}

	#[rstest]
	fn test_computed_rule_sees_target() {
		let factory = Factory::new();
		let instance = Instance::new(20_i64);
		let rule = Rule::<i64>::computed(|_, n: &i64| Ok(n * 2));
		assert_eq!(rule.evaluate(&factory, &instance).unwrap(), Value::Int(40));
	}

	#[rstest]
	fn test_overrides_replace_in_place() {
		let overrides = Overrides::<()>::new()
			.set("a", 1)
			.set("b", 2)
			.set("a", 3);
		let rules = overrides.into_rules();
		assert_eq!(rules.keys().collect::<Vec<_>>(), ["a", "b"]);
		assert!(matches!(rules["a"], Rule::Literal(Value::Int(3))));
	}

	#[cfg(feature = "json")]
	#[rstest]
	fn test_overrides_from_json_rejects_non_object() {
		let result = Overrides::<()>::from_json(serde_json::json!([1, 2]));
		assert!(matches!(
			result,
			Err(crate::SeedingError::InvalidValue { expected: "JSON object", .. })
		));
	}
}
