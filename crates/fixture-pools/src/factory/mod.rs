//! The factory: a registry of pools plus the global initialization protocol.
//!
//! Pools that point at each other cannot be built one object at a time. The
//! factory therefore initializes every registered pool in three passes, in
//! registration order:
//!
//! 1. materialize each pool (attributes only)
//! 2. resolve the references of every instance
//! 3. run per-instance hooks, then per-pool hooks
//!
//! By pass 2 every pool holds its initial instances, so a reference producer
//! can fetch from any pool, including its own, without recursing.

mod lookup;
mod options;
mod registry;

pub use lookup::{Deferred, Lookup, Predicate};
pub use options::{FactoryOptions, SEED_ENV_VAR};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;

use crate::definition::{Definition, Overrides};
use crate::error::{SeedingError, SeedingResult};
use crate::instance::Instance;
use crate::model::Model;
use crate::pool::Pool;
use crate::value::Value;
use registry::{Entry, PoolSpec, Registry};

pub(crate) struct FactoryInner {
	options: FactoryOptions,
	registry: RwLock<Registry>,
	initialized: AtomicBool,
	completed: AtomicBool,
	failure: RwLock<Option<String>>,
	rng: Mutex<StdRng>,
}

/// Registry of named pools and definitions.
///
/// Handles are cheap to clone and share one registry. Every data-access
/// method initializes the factory first, so the first fetch builds the whole
/// graph.
///
/// # Example
///
/// ```
/// use fixture_pools::{Factory, FieldSet, Model, Overrides};
///
/// #[derive(Default)]
/// struct Example {
///     bar: String,
/// }
///
/// impl Model for Example {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::<Self>::new().field::<String>("bar", |e| &e.bar, |e| &mut e.bar)
///     }
/// }
///
/// let factory = Factory::new();
/// factory.define_pool::<Example>("Example", 20)?.attr("bar", "bar");
///
/// assert_eq!(factory.fetch_all::<Example>("Example")?.len(), 20);
/// factory.create::<Example>("Example", Overrides::new().set("bar", "new"))?;
/// assert_eq!(factory.fetch_all::<Example>("Example")?.len(), 21);
/// # Ok::<(), fixture_pools::SeedingError>(())
/// ```
#[derive(Clone)]
pub struct Factory {
	inner: Arc<FactoryInner>,
}

impl Factory {
	/// Creates an empty factory with default options.
	pub fn new() -> Self {
		Self::with_options(FactoryOptions::default())
	}

	/// Creates an empty factory.
	pub fn with_options(options: FactoryOptions) -> Self {
		let rng = options.rng();
		Self {
			inner: Arc::new(FactoryInner {
				options,
				registry: RwLock::new(Registry::default()),
				initialized: AtomicBool::new(false),
				completed: AtomicBool::new(false),
				failure: RwLock::new(None),
				rng: Mutex::new(rng),
			}),
		}
	}

	/// Options the factory was created with.
	pub fn options(&self) -> &FactoryOptions {
		&self.inner.options
	}

	pub(crate) fn downgrade(&self) -> Weak<FactoryInner> {
		Arc::downgrade(&self.inner)
	}

	pub(crate) fn upgrade(weak: &Weak<FactoryInner>) -> Option<Self> {
		weak.upgrade().map(|inner| Self { inner })
	}

	// Registration

	/// Registers a pool of `capacity` default-constructed `T` under `spec`
	/// (`"alias"` or `"alias:TypeName"`) and returns its definition for
	/// configuration.
	///
	/// # Errors
	///
	/// - [`SeedingError::InvalidPoolSpec`] for an empty alias
	/// - [`SeedingError::TypeMismatch`] when the type part does not name `T`
	/// - [`SeedingError::RegistryFrozen`] after initialization
	pub fn define_pool<T: Model + Default>(
		&self,
		spec: &str,
		capacity: impl Into<Option<usize>>,
	) -> SeedingResult<Definition<T>> {
		let definition = Definition::new();
		self.register_pool(spec, Pool::attached(definition.clone(), capacity, self))?;
		Ok(definition)
	}

	/// Registers a definition without a pool. Usable with [`Factory::build`].
	pub fn define<T: Model + Default>(&self, spec: &str) -> SeedingResult<Definition<T>> {
		self.register_definition(spec, Definition::new())
	}

	/// Registers a prebuilt pool and binds it to this factory.
	pub fn register_pool<T: Model>(&self, spec: &str, pool: Pool<T>) -> SeedingResult<Pool<T>> {
		let spec = PoolSpec::parse(spec)?;
		spec.check::<T>()?;
		self.register(spec.alias, Entry::Pool(Arc::new(pool.clone())))?;
		pool.attach(self);
		Ok(pool)
	}

	/// Registers a prebuilt definition without a pool.
	pub fn register_definition<T: Model>(
		&self,
		spec: &str,
		definition: Definition<T>,
	) -> SeedingResult<Definition<T>> {
		let spec = PoolSpec::parse(spec)?;
		spec.check::<T>()?;
		self.register(spec.alias, Entry::Definition(Arc::new(definition.clone())))?;
		Ok(definition)
	}

	fn register(&self, alias: String, entry: Entry) -> SeedingResult<()> {
		if self.inner.options.freeze_registry && self.is_initialized() {
			return Err(SeedingError::RegistryFrozen(alias));
		}
		let model = entry.model_name();
		let replaced = self.inner.registry.write().insert(alias.clone(), entry);
		match replaced {
			Some(previous) => tracing::warn!(
				pool = %alias,
				model,
				previous = previous.model_name(),
				"replaced existing registration"
			),
			None => tracing::trace!(pool = %alias, model, "registered"),
		}
		Ok(())
	}

	// Initialization

	/// Runs the three initialization passes over every registered pool.
	///
	/// Only the first call does anything, including calls made from inside
	/// producers and hooks while the passes run.
	///
	/// # Errors
	///
	/// The first error raised by a pass is returned as is. A failed run is
	/// not retried: every later call, and so every data access, returns
	/// [`SeedingError::InitializationFailed`] instead of exposing a partly
	/// built graph.
	pub fn initialize(&self) -> SeedingResult<()> {
		if self.inner.initialized.swap(true, Ordering::SeqCst) {
			return match &*self.inner.failure.read() {
				Some(message) => Err(SeedingError::InitializationFailed(message.clone())),
				None => Ok(()),
			};
		}
		if let Err(error) = self.run_passes() {
			tracing::warn!(%error, "factory initialization failed");
			*self.inner.failure.write() = Some(error.to_string());
			return Err(error);
		}
		self.inner.completed.store(true, Ordering::SeqCst);
		tracing::debug!("factory initialized");
		Ok(())
	}

	fn run_passes(&self) -> SeedingResult<()> {
		let pools = self.inner.registry.read().pools();

		tracing::debug!(count = pools.len(), "materializing pools");
		for pool in &pools {
			pool.initialize()?;
		}

		tracing::debug!(count = pools.len(), "resolving references");
		for pool in &pools {
			pool.initialize_references()?;
		}

		tracing::debug!(count = pools.len(), "running after hooks");
		for pool in &pools {
			pool.finish()?;
		}
		Ok(())
	}

	/// Returns true if an earlier initialization run failed.
	pub fn is_failed(&self) -> bool {
		self.inner.failure.read().is_some()
	}

	/// Returns true once initialization has started.
	pub fn is_initialized(&self) -> bool {
		self.inner.initialized.load(Ordering::SeqCst)
	}

	// Data access

	/// The pool registered under `name`.
	pub fn pool<T: Model>(&self, name: &str) -> SeedingResult<Pool<T>> {
		self.initialize()?;
		let pool = self.entry(name)?.pool::<T>(name)?;
		// A pool registered after initialization completed missed the
		// global passes.
		if self.inner.completed.load(Ordering::SeqCst) && !pool.is_settled() {
			pool.settle()?;
		}
		Ok(pool)
	}

	/// The definition registered under `name`, pooled or not. Does not
	/// initialize.
	pub fn definition<T: Model>(&self, name: &str) -> SeedingResult<Definition<T>> {
		self.entry(name)?.definition::<T>(name)
	}

	/// Builds one more instance into the pool `name`.
	pub fn create<T: Model>(&self, name: &str, overrides: Overrides<T>) -> SeedingResult<Instance<T>> {
		self.pool::<T>(name)?.create(overrides)
	}

	/// Every instance of the pool `name`.
	pub fn fetch_all<T: Model>(&self, name: &str) -> SeedingResult<Vec<Instance<T>>> {
		self.pool::<T>(name)?.fetch_all()
	}

	/// One random instance of the pool `name`.
	pub fn fetch_random<T: Model>(&self, name: &str) -> SeedingResult<Option<Instance<T>>> {
		self.pool::<T>(name)?.fetch_random()
	}

	/// `count` random instances of the pool `name`.
	pub fn fetch_multiple_random<T: Model>(
		&self,
		name: &str,
		count: usize,
		unique: bool,
	) -> SeedingResult<Vec<Instance<T>>> {
		self.pool::<T>(name)?.fetch_multiple_random(count, unique)
	}

	/// First instance of the pool `name` whose `field` equals `value`.
	pub fn fetch_by<T: Model>(
		&self,
		name: &str,
		field: &str,
		value: impl Into<Value>,
	) -> SeedingResult<Option<Instance<T>>> {
		self.pool::<T>(name)?.fetch_by(field, value)
	}

	/// Instances of the pool `name` whose `field` equals `value`.
	pub fn fetch_multiple_by<T: Model>(
		&self,
		name: &str,
		field: &str,
		value: impl Into<Value>,
		max: Option<usize>,
	) -> SeedingResult<Vec<Instance<T>>> {
		self.pool::<T>(name)?.fetch_multiple_by(field, value, max)
	}

	/// Instances of the pool `name` satisfying `predicate`.
	pub fn fetch_matching<T, F>(
		&self,
		name: &str,
		predicate: F,
		max: Option<usize>,
	) -> SeedingResult<Vec<Instance<T>>>
	where
		T: Model,
		F: Fn(&T) -> bool,
	{
		self.pool::<T>(name)?.fetch_matching(predicate, max)
	}

	/// Builds a detached instance from the definition `name`, running all
	/// three steps on it. The instance is not added to any pool.
	pub fn build<T: Model>(&self, name: &str, overrides: Overrides<T>) -> SeedingResult<Instance<T>> {
		self.initialize()?;
		self.definition::<T>(name)?.build(self, overrides)
	}

	/// Runs a lookup against the pool `name`.
	///
	/// Collections come back as [`Value::List`], single instances as
	/// [`Value::Ref`], and a miss as [`Value::Null`].
	pub fn call<T: Model>(&self, name: &str, lookup: &Lookup<T>) -> SeedingResult<Value> {
		tracing::trace!(pool = %name, operation = lookup.operation(), "lookup");
		Ok(match lookup {
			Lookup::Create(overrides) => self.create::<T>(name, overrides.clone())?.into(),
			Lookup::All => self.fetch_all::<T>(name)?.into(),
			Lookup::Random => self.fetch_random::<T>(name)?.into(),
			Lookup::MultipleRandom { count, unique } => {
				self.fetch_multiple_random::<T>(name, *count, *unique)?.into()
			}
			Lookup::By { field, value } => self.fetch_by::<T>(name, field, value.clone())?.into(),
			Lookup::MultipleBy { field, value, max } => self
				.fetch_multiple_by::<T>(name, field, value.clone(), *max)?
				.into(),
			Lookup::Matching { predicate, max } => self
				.fetch_matching::<T, _>(name, |target| predicate(target), *max)?
				.into(),
		})
	}

	/// Binds a lookup for later. The returned [`Deferred`] holds a weak
	/// handle; running it after the factory is dropped fails with
	/// [`SeedingError::FactoryDropped`].
	pub fn close<T: Model>(&self, name: impl Into<String>, lookup: Lookup<T>) -> Deferred {
		let factory = self.downgrade();
		let name = name.into();
		Deferred::new(move || {
			let factory = Self::upgrade(&factory).ok_or(SeedingError::FactoryDropped)?;
			factory.call(&name, &lookup)
		})
	}

	// Registry queries

	/// Registered aliases, in registration order.
	pub fn pool_names(&self) -> Vec<String> {
		self.inner.registry.read().names()
	}

	/// Returns true if `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.inner.registry.read().contains(name)
	}

	/// Runs `f` with the factory's random number generator.
	///
	/// The generator is locked while `f` runs; `f` must not call back into
	/// `with_rng`.
	pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
		f(&mut self.inner.rng.lock())
	}

	fn entry(&self, name: &str) -> SeedingResult<Entry> {
		self.inner
			.registry
			.read()
			.get(name)
			.ok_or_else(|| SeedingError::UnknownPool(name.to_string()))
	}
}

impl Default for Factory {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Factory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Factory")
			.field("pools", &self.pool_names())
			.field("initialized", &self.is_initialized())
			.field("failed", &self.is_failed())
			.field("options", &self.inner.options)
			.finish()
	}
}
