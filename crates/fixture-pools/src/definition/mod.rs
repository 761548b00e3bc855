//! Definitions: how to construct and populate one kind of fixture.
//!
//! A [`Definition`] owns three rule tables:
//!
//! - **attributes**, applied while an object is constructed
//! - **references**, applied later, once every pool of the owning factory
//!   has materialized (this is what lets pools point at each other)
//! - an **after hook**, run once the object is fully referenced
//!
//! Definitions are cheap handles. Builder methods mutate the shared tables,
//! so a definition returned by
//! [`Factory::define_pool`](crate::Factory::define_pool) can be configured
//! after registration and before first use.

mod rule;

pub use rule::{Computed, Overrides, Producer, Rule, Sequence};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::{SeedingError, SeedingResult};
use crate::factory::Factory;
use crate::instance::Instance;
use crate::model::{FieldSet, Model};
use crate::value::Value;

/// Hook run once per instance after its references are resolved.
pub type AfterHook<T> = Arc<dyn Fn(&Factory, &Instance<T>) -> SeedingResult<()> + Send + Sync>;

type Constructor<T> = Arc<dyn Fn() -> T + Send + Sync>;

type RuleTable<T> = IndexMap<String, Rule<T>>;

struct Rules<T> {
	attributes: RuleTable<T>,
	references: RuleTable<T>,
	after: Option<AfterHook<T>>,
}

struct DefinitionInner<T> {
	constructor: RwLock<Constructor<T>>,
	rules: RwLock<Rules<T>>,
	fields: OnceCell<FieldSet<T>>,
}

/// Rules for constructing and attributing one model type.
///
/// # Example
///
/// ```
/// use fixture_pools::{Definition, Factory, FieldSet, Model, Overrides};
///
/// #[derive(Default)]
/// struct Example {
///     foo: String,
///     bar: String,
/// }
///
/// impl Model for Example {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::<Self>::new()
///             .field::<String>("foo", |e| &e.foo, |e| &mut e.foo)
///             .field::<String>("bar", |e| &e.bar, |e| &mut e.bar)
///     }
/// }
///
/// let factory = Factory::new();
/// let definition = Definition::<Example>::new()
///     .attr("foo", "foo")
///     .attr_with("bar", |_| Ok("bar"));
///
/// let example = definition
///     .create(&factory, Overrides::new().set("foo", "hello"))
///     .unwrap();
/// assert_eq!(example.read().foo, "hello");
/// assert_eq!(example.read().bar, "bar");
/// ```
pub struct Definition<T: Model> {
	inner: Arc<DefinitionInner<T>>,
}

impl<T: Model + Default> Definition<T> {
	/// Creates a definition that default-constructs `T`.
	pub fn new() -> Self {
		Self::with_constructor(T::default)
	}
}

impl<T: Model + Default> Default for Definition<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Model> Definition<T> {
	/// Creates a definition with a custom zero-argument constructor.
	pub fn with_constructor<F>(constructor: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
	{
		Self {
			inner: Arc::new(DefinitionInner {
				constructor: RwLock::new(Arc::new(constructor)),
				rules: RwLock::new(Rules {
					attributes: IndexMap::new(),
					references: IndexMap::new(),
					after: None,
				}),
				fields: OnceCell::new(),
			}),
		}
	}

	/// Replaces the constructor.
	pub fn constructor<F>(self, constructor: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
	{
		*self.inner.constructor.write() = Arc::new(constructor);
		self
	}

	/// Sets a literal attribute.
	pub fn attr(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attr_rule(field, Rule::literal(value))
	}

	/// Sets an attribute produced once per instance.
	pub fn attr_with<V, F>(self, field: impl Into<String>, produce: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory) -> SeedingResult<V> + Send + Sync + 'static,
	{
		self.attr_rule(field, Rule::producer(produce))
	}

	/// Sets an attribute computed from the attributes applied before it.
	pub fn attr_from<V, F>(self, field: impl Into<String>, compute: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory, &T) -> SeedingResult<V> + Send + Sync + 'static,
	{
		self.attr_rule(field, Rule::computed(compute))
	}

	/// Sets a string attribute rendered from a counting template (`"user_{n}"`).
	pub fn attr_sequence(self, field: impl Into<String>, template: impl Into<String>) -> Self {
		self.attr_rule(field, Rule::sequence(template))
	}

	/// Sets an attribute from any rule.
	pub fn attr_rule(self, field: impl Into<String>, rule: impl Into<Rule<T>>) -> Self {
		self.inner
			.rules
			.write()
			.attributes
			.insert(field.into(), rule.into());
		self
	}

	/// Sets several attributes at once.
	pub fn attrs<I, K>(self, rules: I) -> Self
	where
		I: IntoIterator<Item = (K, Rule<T>)>,
		K: Into<String>,
	{
		{
			let mut table = self.inner.rules.write();
			for (field, rule) in rules {
				table.attributes.insert(field.into(), rule);
			}
		}
		self
	}

	/// Sets a literal reference.
	pub fn reference(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.reference_rule(field, Rule::literal(value))
	}

	/// Sets a reference produced once per instance, after every pool of the
	/// factory has materialized.
	pub fn reference_with<V, F>(self, field: impl Into<String>, produce: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory) -> SeedingResult<V> + Send + Sync + 'static,
	{
		self.reference_rule(field, Rule::producer(produce))
	}

	/// Sets a reference computed from the populated object.
	pub fn reference_from<V, F>(self, field: impl Into<String>, compute: F) -> Self
	where
		V: Into<Value>,
		F: Fn(&Factory, &T) -> SeedingResult<V> + Send + Sync + 'static,
	{
		self.reference_rule(field, Rule::computed(compute))
	}

	/// Sets a reference from any rule.
	pub fn reference_rule(self, field: impl Into<String>, rule: impl Into<Rule<T>>) -> Self {
		self.inner
			.rules
			.write()
			.references
			.insert(field.into(), rule.into());
		self
	}

	/// Sets several references at once.
	pub fn references<I, K>(self, rules: I) -> Self
	where
		I: IntoIterator<Item = (K, Rule<T>)>,
		K: Into<String>,
	{
		{
			let mut table = self.inner.rules.write();
			for (field, rule) in rules {
				table.references.insert(field.into(), rule);
			}
		}
		self
	}

	/// Sets the per-instance after hook.
	pub fn after<F>(self, hook: F) -> Self
	where
		F: Fn(&Factory, &Instance<T>) -> SeedingResult<()> + Send + Sync + 'static,
	{
		self.inner.rules.write().after = Some(Arc::new(hook));
		self
	}

	/// Name of the target model.
	pub fn model_name(&self) -> &'static str {
		T::model_name()
	}

	/// The model's field accessors, resolved once and cached.
	pub fn field_set(&self) -> &FieldSet<T> {
		self.inner.fields.get_or_init(T::fields)
	}

	/// Returns true if the model has a field with this name.
	pub fn has_field(&self, field: &str) -> bool {
		self.field_set().contains(field)
	}

	/// Attribute field names in application order.
	pub fn attribute_names(&self) -> Vec<String> {
		self.inner.rules.read().attributes.keys().cloned().collect()
	}

	/// Reference field names in application order.
	pub fn reference_names(&self) -> Vec<String> {
		self.inner.rules.read().references.keys().cloned().collect()
	}

	/// Reads a field of an instance by name.
	pub fn read_field(&self, instance: &Instance<T>, field: &str) -> SeedingResult<Value> {
		let accessor = self
			.field_set()
			.get(field)
			.ok_or_else(|| SeedingError::missing_field(T::model_name(), field))?;
		let target = instance.read();
		Ok(accessor.read(&target))
	}

	/// Writes a field of an instance by name.
	pub fn write_field(
		&self,
		instance: &Instance<T>,
		field: &str,
		value: impl Into<Value>,
	) -> SeedingResult<()> {
		let accessor = self
			.field_set()
			.get(field)
			.ok_or_else(|| SeedingError::missing_field(T::model_name(), field))?;
		let mut target = instance.write();
		accessor.write(&mut target, value.into())
	}

	/// Builds one instance from the attribute table merged with `overrides`.
	///
	/// References and the after hook are not applied; the owning pool does
	/// that in later phases.
	pub fn create(&self, factory: &Factory, overrides: Overrides<T>) -> SeedingResult<Instance<T>> {
		let constructor = Arc::clone(&*self.inner.constructor.read());
		let mut rules = self.inner.rules.read().attributes.clone();
		for (field, rule) in overrides.into_rules() {
			rules.insert(field, rule);
		}

		let instance = Instance::new(constructor());
		self.apply(factory, &instance, &rules)?;
		tracing::trace!(model = T::model_name(), fields = rules.len(), "created instance");
		Ok(instance)
	}

	/// Applies the reference table to an existing instance.
	pub fn resolve_references(&self, factory: &Factory, instance: &Instance<T>) -> SeedingResult<()> {
		let rules = self.inner.rules.read().references.clone();
		self.apply(factory, instance, &rules)
	}

	/// Runs the after hook, if any.
	pub fn finish(&self, factory: &Factory, instance: &Instance<T>) -> SeedingResult<()> {
		let hook = self.inner.rules.read().after.clone();
		match hook {
			Some(hook) => hook(factory, instance),
			None => Ok(()),
		}
	}

	/// Creates a detached instance and runs all three phases on it at once.
	pub fn build(&self, factory: &Factory, overrides: Overrides<T>) -> SeedingResult<Instance<T>> {
		let instance = self.create(factory, overrides)?;
		self.resolve_references(factory, &instance)?;
		self.finish(factory, &instance)?;
		Ok(instance)
	}

	// Rule tables are cloned out before this runs, so producers may re-enter
	// the definition or the factory freely.
	fn apply(
		&self,
		factory: &Factory,
		instance: &Instance<T>,
		rules: &RuleTable<T>,
	) -> SeedingResult<()> {
		let fields = self.field_set();
		for (field, rule) in rules {
			let accessor = fields
				.get(field)
				.ok_or_else(|| SeedingError::missing_field(T::model_name(), field))?;
			let value = rule.evaluate(factory, instance)?;
			let mut target = instance.write();
			accessor.write(&mut target, value)?;
		}
		Ok(())
	}
}

impl<T: Model> Clone for Definition<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: Model> fmt::Debug for Definition<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rules = self.inner.rules.read();
		f.debug_struct("Definition")
			.field("model", &T::model_name())
			.field("attributes", &rules.attributes.keys().collect::<Vec<_>>())
			.field("references", &rules.references.keys().collect::<Vec<_>>())
			.field("after", &rules.after.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Debug, Default)]
	struct Example {
		foo: String,
		bar: String,
		baz: String,
		rand: i64,
	}

	impl Model for Example {
		fn fields() -> FieldSet<Self> {
			FieldSet::<Self>::new()
				.field::<String>("foo", |e| &e.foo, |e| &mut e.foo)
				.field::<String>("bar", |e| &e.bar, |e| &mut e.bar)
				.field::<String>("baz", |e| &e.baz, |e| &mut e.baz)
				.field::<i64>("rand", |e| &e.rand, |e| &mut e.rand)
		}
	}

	#[rstest]
	fn test_create_plain() {
		// Arrange
		let factory = Factory::new();
		let definition = Definition::<Example>::new().attr("foo", "foo").attr("bar", "bar");

		// Act
		let instance = definition.create(&factory, Overrides::new()).unwrap();

		// Assert
		let example = instance.read();
		assert_eq!(example.foo, "foo");
		assert_eq!(example.bar, "bar");
		assert_eq!(example.baz, "");
	}

	#[rstest]
	fn test_create_with_producers() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new()
			.attr_with("foo", |_| Ok("foo"))
			.attr_with("bar", |_| Ok(String::from("bar")));

		let instance = definition.create(&factory, Overrides::new()).unwrap();

		assert_eq!(instance.read().foo, "foo");
		assert_eq!(instance.read().bar, "bar");
	}

	#[rstest]
	fn test_override_wins_and_untouched_fields_stay_default() {
		// Arrange
		let factory = Factory::new();
		let definition = Definition::<Example>::new()
			.attr_sequence("foo", "foo-{n}")
			.attr("bar", "bar");

		// Act
		let plain = definition.create(&factory, Overrides::new()).unwrap();
		let overridden = definition
			.create(&factory, Overrides::new().set("foo", "hello").set("rand", 7))
			.unwrap();

		// Assert
		assert_eq!(plain.read().foo, "foo-1");
		assert_eq!(overridden.read().foo, "hello");
		assert_eq!(overridden.read().bar, "bar");
		assert_eq!(overridden.read().rand, 7);
		assert_eq!(overridden.read().baz, "");
	}

	#[rstest]
	fn test_overridden_producer_is_not_invoked() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let factory = Factory::new();
		let definition = Definition::<Example>::new().attr_with("foo", move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok("produced")
		});

		// Act
		definition
			.create(&factory, Overrides::new().set("foo", "given"))
			.unwrap();

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	fn test_computed_attribute_sees_earlier_fields() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new()
			.attr("foo", "abc")
			.attr_from("bar", |_, example: &Example| Ok(example.foo.to_uppercase()));

		let instance = definition.create(&factory, Overrides::new()).unwrap();

		assert_eq!(instance.read().bar, "ABC");
	}

	#[rstest]
	fn test_unknown_attribute_fails() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new().attr("nope", 1);

		let result = definition.create(&factory, Overrides::new());

		assert!(matches!(
			result,
			Err(SeedingError::MissingField { ref field, .. }) if field == "nope"
		));
	}

	#[rstest]
	fn test_unknown_override_fails() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new();
		let result = definition.create(&factory, Overrides::new().set("missing", "x"));
		assert!(matches!(result, Err(SeedingError::MissingField { .. })));
	}

	#[rstest]
	fn test_references_are_not_applied_by_create() {
		// Arrange
		let factory = Factory::new();
		let definition = Definition::<Example>::new()
			.attr("foo", "foo")
			.reference("baz", "resolved");

		// Act
		let instance = definition.create(&factory, Overrides::new()).unwrap();
		let before = instance.read().baz.clone();
		definition.resolve_references(&factory, &instance).unwrap();

		// Assert
		assert_eq!(before, "");
		assert_eq!(instance.read().baz, "resolved");
	}

	#[rstest]
	fn test_after_hook() {
		// Arrange
		let factory = Factory::new();
		let definition = Definition::<Example>::new()
			.attr("foo", "foo")
			.attr("bar", "bar")
			.after(|_, instance| {
				instance.write().baz = "baz".to_string();
				Ok(())
			});

		// Act
		let instance = definition.create(&factory, Overrides::new()).unwrap();
		definition.finish(&factory, &instance).unwrap();

		// Assert
		let example = instance.read();
		assert_eq!(example.foo, "foo");
		assert_eq!(example.bar, "bar");
		assert_eq!(example.baz, "baz");
	}

	#[rstest]
	fn test_finish_without_hook_is_noop() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new();
		let instance = definition.create(&factory, Overrides::new()).unwrap();
		assert!(definition.finish(&factory, &instance).is_ok());
		assert!(definition.finish(&factory, &instance).is_ok());
	}

	#[rstest]
	fn test_build_runs_every_phase() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new()
			.attr("foo", "foo")
			.reference("bar", "ref")
			.after(|_, instance| {
				instance.write().baz = "done".to_string();
				Ok(())
			});

		let instance = definition.build(&factory, Overrides::new()).unwrap();

		let example = instance.read();
		assert_eq!(
			(example.foo.as_str(), example.bar.as_str(), example.baz.as_str()),
			("foo", "ref", "done")
		);
	}

	#[rstest]
	fn test_rules_added_through_a_clone_are_shared() {
		// Arrange
		let factory = Factory::new();
		let definition = Definition::<Example>::new();

		// Act
		let _ = definition.clone().attr("foo", "late");
		let instance = definition.create(&factory, Overrides::new()).unwrap();

		// Assert
		assert_eq!(instance.read().foo, "late");
		assert_eq!(definition.attribute_names(), ["foo"]);
	}

	#[rstest]
	fn test_custom_constructor() {
		let factory = Factory::new();
		let definition = Definition::<Example>::with_constructor(|| Example {
			baz: "constructed".to_string(),
			..Example::default()
		});
		let instance = definition.create(&factory, Overrides::new()).unwrap();
		assert_eq!(instance.read().baz, "constructed");
	}

	#[rstest]
	fn test_read_and_write_field() {
		let factory = Factory::new();
		let definition = Definition::<Example>::new().attr("rand", 1);
		let instance = definition.create(&factory, Overrides::new()).unwrap();

		definition.write_field(&instance, "foo", "written").unwrap();

		assert_eq!(
			definition.read_field(&instance, "rand").unwrap(),
			Value::Int(1)
		);
		assert_eq!(instance.read().foo, "written");
		assert!(definition.read_field(&instance, "missing").is_err());
	}
}
