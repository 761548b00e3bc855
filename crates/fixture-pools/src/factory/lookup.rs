//! Data-access requests as values, and deferred lookups.

use std::fmt;
use std::sync::Arc;

use crate::definition::{Overrides, Rule};
use crate::error::SeedingResult;
use crate::factory::Factory;
use crate::value::{FieldValue, Value};

/// Predicate used by [`Lookup::Matching`].
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// One data-access operation of a [`Factory`], with its arguments.
pub enum Lookup<T> {
	/// [`Factory::create`].
	Create(Overrides<T>),
	/// [`Factory::fetch_all`].
	All,
	/// [`Factory::fetch_random`].
	Random,
	/// [`Factory::fetch_multiple_random`].
	MultipleRandom {
		/// Number of instances.
		count: usize,
		/// Whether the instances must be distinct.
		unique: bool,
	},
	/// [`Factory::fetch_by`].
	By {
		/// Field to compare.
		field: String,
		/// Value the field must equal.
		value: Value,
	},
	/// [`Factory::fetch_multiple_by`].
	MultipleBy {
		/// Field to compare.
		field: String,
		/// Value the field must equal.
		value: Value,
		/// Upper bound on the result size.
		max: Option<usize>,
	},
	/// [`Factory::fetch_matching`].
	Matching {
		/// Filter on the model.
		predicate: Predicate<T>,
		/// Upper bound on the result size.
		max: Option<usize>,
	},
}

impl<T> Lookup<T> {
	/// Shorthand for [`Lookup::By`].
	pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::By {
			field: field.into(),
			value: value.into(),
		}
	}

	/// Shorthand for [`Lookup::MultipleBy`].
	pub fn multiple_by(field: impl Into<String>, value: impl Into<Value>, max: Option<usize>) -> Self {
		Self::MultipleBy {
			field: field.into(),
			value: value.into(),
			max,
		}
	}

	/// Shorthand for [`Lookup::Matching`].
	pub fn matching<F>(predicate: F, max: Option<usize>) -> Self
	where
		F: Fn(&T) -> bool + Send + Sync + 'static,
	{
		Self::Matching {
			predicate: Arc::new(predicate),
			max,
		}
	}

	pub(crate) fn operation(&self) -> &'static str {
		match self {
			Self::Create(_) => "create",
			Self::All => "fetch_all",
			Self::Random => "fetch_random",
			Self::MultipleRandom { .. } => "fetch_multiple_random",
			Self::By { .. } => "fetch_by",
			Self::MultipleBy { .. } => "fetch_multiple_by",
			Self::Matching { .. } => "fetch_matching",
		}
	}
}

impl<T> Clone for Lookup<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Create(overrides) => Self::Create(overrides.clone()),
			Self::All => Self::All,
			Self::Random => Self::Random,
			Self::MultipleRandom { count, unique } => Self::MultipleRandom {
				count: *count,
				unique: *unique,
			},
			Self::By { field, value } => Self::By {
				field: field.clone(),
				value: value.clone(),
			},
			Self::MultipleBy { field, value, max } => Self::MultipleBy {
				field: field.clone(),
				value: value.clone(),
				max: *max,
			},
			Self::Matching { predicate, max } => Self::Matching {
				predicate: Arc::clone(predicate),
				max: *max,
			},
		}
	}
}

impl<T> fmt::Debug for Lookup<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.operation())
	}
}

/// A lookup bound to a factory and an alias, run when called.
///
/// Usable as a producer: it converts into a [`Rule`], so a definition can
/// point a field at another pool without writing a closure.
///
/// ```
/// use fixture_pools::{Definition, Factory, FieldSet, Instance, Lookup, Model};
///
/// #[derive(Default)]
/// struct Group {
///     name: String,
/// }
///
/// #[derive(Default)]
/// struct User {
///     group: Option<Instance<Group>>,
/// }
///
/// impl Model for Group {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::<Self>::new().field::<String>("name", |g| &g.name, |g| &mut g.name)
///     }
/// }
///
/// impl Model for User {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::<Self>::new().field::<Option<Instance<Group>>>("group", |u| &u.group, |u| &mut u.group)
///     }
/// }
///
/// let factory = Factory::new();
/// factory.define_pool::<Group>("Group", 2).unwrap().attr("name", "staff");
/// factory
///     .define_pool::<User>("User", 5)
///     .unwrap()
///     .reference_rule("group", factory.close::<Group>("Group", Lookup::Random));
///
/// let user = factory.fetch_random::<User>("User").unwrap().unwrap();
/// assert!(user.read().group.is_some());
/// ```
#[derive(Clone)]
pub struct Deferred {
	run: Arc<dyn Fn() -> SeedingResult<Value> + Send + Sync>,
}

impl Deferred {
	pub(crate) fn new<F>(run: F) -> Self
	where
		F: Fn() -> SeedingResult<Value> + Send + Sync + 'static,
	{
		Self { run: Arc::new(run) }
	}

	/// Runs the lookup.
	pub fn call(&self) -> SeedingResult<Value> {
		(self.run)()
	}

	/// Runs the lookup and converts the result.
	pub fn get<V: FieldValue>(&self) -> SeedingResult<V> {
		V::from_value(self.call()?)
	}
}

impl fmt::Debug for Deferred {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Deferred")
	}
}

impl<T> From<Deferred> for Rule<T> {
	fn from(deferred: Deferred) -> Self {
		Rule::Producer(Arc::new(move |_: &Factory| deferred.call()))
	}
}
