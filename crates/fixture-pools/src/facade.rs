//! Process-wide default factory.
//!
//! The functions here mirror the data-access methods of [`Factory`] but
//! return a [`Deferred`] instead of running: handy as a producer inside a
//! definition.
//!
//! ```
//! use fixture_pools::facade;
//! use fixture_pools::{FieldSet, Model, Overrides};
//!
//! #[derive(Default)]
//! struct Foo {
//!     name: String,
//! }
//!
//! impl Model for Foo {
//!     fn fields() -> FieldSet<Self> {
//!         FieldSet::<Self>::new().field::<String>("name", |f| &f.name, |f| &mut f.name)
//!     }
//! }
//!
//! facade::reset();
//! facade::instance().define_pool::<Foo>("Foo", 10).unwrap();
//!
//! let created = facade::create::<Foo>("Foo", Overrides::new()).call().unwrap();
//! assert!(created.as_instance::<Foo>().is_some());
//! assert_eq!(facade::instance().fetch_all::<Foo>("Foo").unwrap().len(), 11);
//! ```

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::definition::Overrides;
use crate::factory::{Deferred, Factory, FactoryOptions, Lookup};
use crate::model::Model;
use crate::value::Value;

static DEFAULT_FACTORY: Lazy<RwLock<Factory>> =
	Lazy::new(|| RwLock::new(Factory::with_options(FactoryOptions::from_env())));

/// The default factory, created on first use.
pub fn instance() -> Factory {
	DEFAULT_FACTORY.read().clone()
}

/// Replaces the default factory with an empty one.
///
/// Deferred lookups closed over the previous factory fail with
/// [`SeedingError::FactoryDropped`](crate::SeedingError::FactoryDropped)
/// once no other handle keeps it alive.
pub fn reset() {
	*DEFAULT_FACTORY.write() = Factory::with_options(FactoryOptions::from_env());
}

/// Deferred [`Factory::create`].
pub fn create<T: Model>(name: &str, overrides: Overrides<T>) -> Deferred {
	instance().close(name, Lookup::Create(overrides))
}

/// Deferred [`Factory::fetch_all`].
pub fn fetch_all<T: Model>(name: &str) -> Deferred {
	instance().close::<T>(name, Lookup::All)
}

/// Deferred [`Factory::fetch_random`].
pub fn fetch_random<T: Model>(name: &str) -> Deferred {
	instance().close::<T>(name, Lookup::Random)
}

/// Deferred [`Factory::fetch_multiple_random`].
pub fn fetch_multiple_random<T: Model>(name: &str, count: usize, unique: bool) -> Deferred {
	instance().close::<T>(name, Lookup::MultipleRandom { count, unique })
}

/// Deferred [`Factory::fetch_by`].
pub fn fetch_by<T: Model>(name: &str, field: &str, value: impl Into<Value>) -> Deferred {
	instance().close::<T>(name, Lookup::by(field, value))
}

/// Deferred [`Factory::fetch_multiple_by`].
pub fn fetch_multiple_by<T: Model>(
	name: &str,
	field: &str,
	value: impl Into<Value>,
	max: Option<usize>,
) -> Deferred {
	instance().close::<T>(name, Lookup::multiple_by(field, value, max))
}

/// Deferred [`Factory::fetch_matching`].
pub fn fetch_matching<T, F>(name: &str, predicate: F, max: Option<usize>) -> Deferred
where
	T: Model,
	F: Fn(&T) -> bool + Send + Sync + 'static,
{
	instance().close::<T>(name, Lookup::matching(predicate, max))
}
