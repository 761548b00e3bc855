//! Alias registry of a factory.
//!
//! Pools and bare definitions of different model types share one ordered
//! map. They are stored behind object-safe traits and recovered with
//! `Any` downcasts when a typed handle is requested.

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::Definition;
use crate::error::{SeedingError, SeedingResult};
use crate::model::Model;
use crate::pool::Pool;

/// Type-erased pool, driven through the three initialization phases.
pub(crate) trait AnyPool: Send + Sync {
	/// Name of the pooled model.
	fn model_name(&self) -> &'static str;

	/// Builds the initial instances.
	fn initialize(&self) -> SeedingResult<()>;

	/// Resolves references of every instance.
	fn initialize_references(&self) -> SeedingResult<()>;

	/// Runs the after hooks.
	fn finish(&self) -> SeedingResult<()>;

	/// Returns true once the hooks have run.
	fn is_settled(&self) -> bool;

	/// Returns the pool as an Any reference for downcasting.
	fn as_any(&self) -> &dyn Any;
}

impl<T: Model> AnyPool for Pool<T> {
	fn model_name(&self) -> &'static str {
		T::model_name()
	}

	fn initialize(&self) -> SeedingResult<()> {
		Pool::initialize(self)
	}

	fn initialize_references(&self) -> SeedingResult<()> {
		Pool::initialize_references(self)
	}

	fn finish(&self) -> SeedingResult<()> {
		Pool::finish(self)
	}

	fn is_settled(&self) -> bool {
		Pool::is_settled(self)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Type-erased definition registered without a pool.
pub(crate) trait AnyDefinition: Send + Sync {
	/// Name of the defined model.
	fn model_name(&self) -> &'static str;

	/// Returns the definition as an Any reference for downcasting.
	fn as_any(&self) -> &dyn Any;
}

impl<T: Model> AnyDefinition for Definition<T> {
	fn model_name(&self) -> &'static str {
		T::model_name()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// One registered alias.
#[derive(Clone)]
pub(crate) enum Entry {
	Pool(Arc<dyn AnyPool>),
	Definition(Arc<dyn AnyDefinition>),
}

impl Entry {
	pub(crate) fn model_name(&self) -> &'static str {
		match self {
			Self::Pool(pool) => pool.model_name(),
			Self::Definition(definition) => definition.model_name(),
		}
	}

	/// Recovers the typed pool handle.
	pub(crate) fn pool<T: Model>(&self, alias: &str) -> SeedingResult<Pool<T>> {
		match self {
			Self::Pool(pool) => pool
				.as_any()
				.downcast_ref::<Pool<T>>()
				.cloned()
				.ok_or_else(|| self.mismatch::<T>(alias)),
			Self::Definition(_) => Err(SeedingError::DefinitionOnly(alias.to_string())),
		}
	}

	/// Recovers the typed definition, from a pool or a bare definition.
	pub(crate) fn definition<T: Model>(&self, alias: &str) -> SeedingResult<Definition<T>> {
		let definition = match self {
			Self::Pool(pool) => pool
				.as_any()
				.downcast_ref::<Pool<T>>()
				.map(|pool| pool.definition().clone()),
			Self::Definition(definition) => {
				definition.as_any().downcast_ref::<Definition<T>>().cloned()
			}
		};
		definition.ok_or_else(|| self.mismatch::<T>(alias))
	}

	fn mismatch<T: Model>(&self, alias: &str) -> SeedingError {
		SeedingError::TypeMismatch {
			name: alias.to_string(),
			expected: T::model_name().to_string(),
			actual: self.model_name().to_string(),
		}
	}
}

/// Ordered alias map. Iteration order is registration order.
#[derive(Default)]
pub(crate) struct Registry {
	entries: IndexMap<String, Entry>,
}

impl Registry {
	/// Registers an entry. Re-registering an alias replaces the entry in
	/// place and returns the previous one.
	pub(crate) fn insert(&mut self, alias: String, entry: Entry) -> Option<Entry> {
		self.entries.insert(alias, entry)
	}

	pub(crate) fn get(&self, alias: &str) -> Option<Entry> {
		self.entries.get(alias).cloned()
	}

	pub(crate) fn contains(&self, alias: &str) -> bool {
		self.entries.contains_key(alias)
	}

	pub(crate) fn names(&self) -> Vec<String> {
		self.entries.keys().cloned().collect()
	}

	/// Registered pools, in registration order.
	pub(crate) fn pools(&self) -> Vec<Arc<dyn AnyPool>> {
		self.entries
			.values()
			.filter_map(|entry| match entry {
				Entry::Pool(pool) => Some(Arc::clone(pool)),
				Entry::Definition(_) => None,
			})
			.collect()
	}
}

/// A parsed `alias` or `alias:TypeName` registration string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PoolSpec {
	pub(crate) alias: String,
	pub(crate) type_name: Option<String>,
}

impl PoolSpec {
	/// Splits on the first lone `:`; `::` inside a type path is kept.
	pub(crate) fn parse(spec: &str) -> SeedingResult<Self> {
		let bytes = spec.as_bytes();
		let separator = (0..bytes.len()).find(|&i| {
			bytes[i] == b':'
				&& bytes.get(i + 1) != Some(&b':')
				&& (i == 0 || bytes[i - 1] != b':')
		});
		let (alias, type_name) = match separator {
			Some(i) => (&spec[..i], Some(&spec[i + 1..])),
			None => (spec, None),
		};

		let alias = alias.trim();
		if alias.is_empty() {
			return Err(SeedingError::InvalidPoolSpec(spec.to_string()));
		}
		let type_name = type_name
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.map(str::to_string);

		Ok(Self {
			alias: alias.to_string(),
			type_name,
		})
	}

	/// Checks the declared type part against `T`.
	///
	/// Accepts the model name, the full type path, or any `::`-suffix of it.
	pub(crate) fn check<T: Model>(&self) -> SeedingResult<()> {
		let Some(declared) = &self.type_name else {
			return Ok(());
		};
		let full = std::any::type_name::<T>();
		let matches = declared == T::model_name()
			|| declared == full
			|| full.ends_with(&format!("::{declared}"));
		if matches {
			Ok(())
		} else {
			Err(SeedingError::TypeMismatch {
				name: self.alias.clone(),
				expected: declared.clone(),
				actual: T::model_name().to_string(),
			})
		}
	}
}
