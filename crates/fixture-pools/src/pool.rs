//! Pools: fixed-size collections of instances of one definition.
//!
//! A pool moves through three states on its own ([`PoolState`]) and records
//! separately whether its owning factory has started resolving references
//! and running hooks for it. An instance created after either step started
//! has that step applied on the spot, so it is never skipped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use rand::seq::index;

use crate::definition::{Definition, Overrides};
use crate::error::{SeedingError, SeedingResult};
use crate::factory::{Factory, FactoryInner};
use crate::instance::Instance;
use crate::model::Model;
use crate::value::Value;

/// Materialization state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
	/// Nothing built yet.
	Uninitialized,
	/// Building the initial instances.
	Materializing,
	/// Initial instances built (or building stopped on an error).
	Initialized,
}

/// Hook run once per pool after every instance hook of that pool.
pub type PoolHook<T> = Arc<dyn Fn(&Factory, &Pool<T>) -> SeedingResult<()> + Send + Sync>;

enum FactoryLink {
	Detached(Factory),
	Attached(Weak<FactoryInner>),
}

struct PoolInner<T: Model> {
	definition: Definition<T>,
	capacity: Option<usize>,
	state: Mutex<PoolState>,
	resolving: AtomicBool,
	finishing: AtomicBool,
	settled: AtomicBool,
	instances: RwLock<Vec<Instance<T>>>,
	after: RwLock<Option<PoolHook<T>>>,
	link: RwLock<FactoryLink>,
}

/// A named collection of instances built from one [`Definition`].
///
/// Handles are cheap to clone and share state. A pool created with
/// [`Pool::new`] owns a private factory until it is registered; after
/// registration it draws on the registering factory for lookups and
/// randomness.
///
/// # Example
///
/// ```
/// use fixture_pools::{Definition, FieldSet, Model, Pool};
///
/// #[derive(Default)]
/// struct Tag {
///     label: String,
/// }
///
/// impl Model for Tag {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::<Self>::new().field::<String>("label", |t| &t.label, |t| &mut t.label)
///     }
/// }
///
/// let pool = Pool::new(Definition::<Tag>::new().attr_sequence("label", "tag-{n}"), 3);
/// assert_eq!(pool.fetch_all().unwrap().len(), 3);
/// assert!(pool.fetch_by("label", "tag-2").unwrap().is_some());
/// ```
pub struct Pool<T: Model> {
	inner: Arc<PoolInner<T>>,
}

impl<T: Model> Pool<T> {
	/// Creates a pool that materializes `capacity` instances on first use.
	///
	/// `None` creates an empty pool that only grows through [`Pool::create`].
	pub fn new(definition: Definition<T>, capacity: impl Into<Option<usize>>) -> Self {
		Self::with_factory(definition, capacity, Factory::new())
	}

	/// Creates a standalone pool drawing on the given factory until it is
	/// registered somewhere.
	pub fn with_factory(
		definition: Definition<T>,
		capacity: impl Into<Option<usize>>,
		factory: Factory,
	) -> Self {
		Self::linked(definition, capacity.into(), FactoryLink::Detached(factory))
	}

	/// Creates a pool bound to `factory` without owning it.
	pub(crate) fn attached(
		definition: Definition<T>,
		capacity: impl Into<Option<usize>>,
		factory: &Factory,
	) -> Self {
		Self::linked(
			definition,
			capacity.into(),
			FactoryLink::Attached(factory.downgrade()),
		)
	}

	fn linked(definition: Definition<T>, capacity: Option<usize>, link: FactoryLink) -> Self {
		Self {
			inner: Arc::new(PoolInner {
				definition,
				capacity,
				state: Mutex::new(PoolState::Uninitialized),
				resolving: AtomicBool::new(false),
				finishing: AtomicBool::new(false),
				settled: AtomicBool::new(false),
				instances: RwLock::new(Vec::new()),
				after: RwLock::new(None),
				link: RwLock::new(link),
			}),
		}
	}

	/// Sets the hook run once after every instance hook of this pool.
	pub fn after<F>(self, hook: F) -> Self
	where
		F: Fn(&Factory, &Pool<T>) -> SeedingResult<()> + Send + Sync + 'static,
	{
		*self.inner.after.write() = Some(Arc::new(hook));
		self
	}

	/// Materializes the initial instances, once.
	///
	/// Calls made while materializing (a producer of this pool fetching from
	/// it) return immediately and see the instances built so far. If building
	/// fails the pool keeps what it built, becomes [`PoolState::Initialized`]
	/// and the error is returned.
	pub fn initialize(&self) -> SeedingResult<()> {
		{
			let mut state = self.inner.state.lock();
			if *state != PoolState::Uninitialized {
				return Ok(());
			}
			*state = PoolState::Materializing;
		}

		let result = self.materialize();
		*self.inner.state.lock() = PoolState::Initialized;
		result
	}

	fn materialize(&self) -> SeedingResult<()> {
		let Some(capacity) = self.inner.capacity else {
			return Ok(());
		};
		let factory = self.factory()?;
		tracing::debug!(model = T::model_name(), capacity, "materializing pool");
		for _ in 0..capacity {
			let instance = self.inner.definition.create(&factory, Overrides::new())?;
			self.inner.instances.write().push(instance);
		}
		Ok(())
	}

	/// Resolves the references of every instance, in insertion order.
	///
	/// Runs at most once; instances created afterwards are resolved as they
	/// are created.
	pub fn initialize_references(&self) -> SeedingResult<()> {
		self.initialize()?;
		if self.inner.resolving.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		let factory = self.factory()?;
		for instance in self.snapshot() {
			self.inner.definition.resolve_references(&factory, &instance)?;
		}
		Ok(())
	}

	/// Runs the after hook of every instance, then the pool hook.
	///
	/// Runs at most once; instances created afterwards get their hook as they
	/// are created.
	pub fn finish(&self) -> SeedingResult<()> {
		self.initialize()?;
		if self.inner.finishing.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		let factory = self.factory()?;
		for instance in self.snapshot() {
			self.inner.definition.finish(&factory, &instance)?;
		}
		let hook = self.inner.after.read().clone();
		if let Some(hook) = hook {
			hook(&factory, self)?;
		}
		self.inner.settled.store(true, Ordering::SeqCst);
		Ok(())
	}

	/// Runs all three steps. For pools used without a factory.
	pub fn settle(&self) -> SeedingResult<()> {
		self.initialize()?;
		self.initialize_references()?;
		self.finish()
	}

	/// Builds one more instance and appends it.
	///
	/// The instance joins the pool before its references and hook run, so
	/// both already see it among the pool's members.
	pub fn create(&self, overrides: Overrides<T>) -> SeedingResult<Instance<T>> {
		self.initialize()?;
		let factory = self.factory()?;
		let instance = self.inner.definition.create(&factory, overrides)?;
		self.inner.instances.write().push(instance.clone());
		tracing::trace!(model = T::model_name(), size = self.len(), "appended instance");
		if self.inner.resolving.load(Ordering::SeqCst) {
			self.inner.definition.resolve_references(&factory, &instance)?;
		}
		if self.inner.finishing.load(Ordering::SeqCst) {
			self.inner.definition.finish(&factory, &instance)?;
		}
		Ok(instance)
	}

	/// Every instance, in insertion order.
	pub fn fetch_all(&self) -> SeedingResult<Vec<Instance<T>>> {
		self.initialize()?;
		Ok(self.snapshot())
	}

	/// One instance chosen uniformly at random, `None` if the pool is empty.
	pub fn fetch_random(&self) -> SeedingResult<Option<Instance<T>>> {
		self.initialize()?;
		let instances = self.snapshot();
		if instances.is_empty() {
			return Ok(None);
		}
		let factory = self.factory()?;
		Ok(factory.with_rng(|rng| instances.choose(rng).cloned()))
	}

	/// `count` random instances.
	///
	/// With `unique` the result holds `count` distinct instances; otherwise
	/// each pick is independent and may repeat.
	///
	/// # Errors
	///
	/// [`SeedingError::InsufficientPoolSize`] when the pool cannot supply
	/// `count` instances.
	pub fn fetch_multiple_random(
		&self,
		count: usize,
		unique: bool,
	) -> SeedingResult<Vec<Instance<T>>> {
		self.initialize()?;
		let instances = self.snapshot();
		let available = instances.len();
		if (unique && count > available) || (count > 0 && available == 0) {
			return Err(SeedingError::InsufficientPoolSize {
				requested: count,
				available,
			});
		}
		let factory = self.factory()?;
		Ok(factory.with_rng(|rng| {
			if unique {
				index::sample(rng, available, count)
					.into_iter()
					.map(|i| instances[i].clone())
					.collect()
			} else {
				(0..count)
					.filter_map(|_| instances.choose(rng).cloned())
					.collect()
			}
		}))
	}

	/// Instances satisfying `predicate`, in insertion order, at most `max`.
	pub fn fetch_matching<F>(&self, predicate: F, max: Option<usize>) -> SeedingResult<Vec<Instance<T>>>
	where
		F: Fn(&T) -> bool,
	{
		self.initialize()?;
		let mut matches = Vec::new();
		if max == Some(0) {
			return Ok(matches);
		}
		for instance in self.snapshot() {
			let matched = predicate(&instance.read());
			if matched {
				matches.push(instance);
				if max.is_some_and(|max| matches.len() >= max) {
					break;
				}
			}
		}
		Ok(matches)
	}

	/// First instance whose `field` equals `value`.
	pub fn fetch_by(
		&self,
		field: &str,
		value: impl Into<Value>,
	) -> SeedingResult<Option<Instance<T>>> {
		let predicate = self.field_equals(field, value.into())?;
		Ok(self.fetch_matching(predicate, Some(1))?.into_iter().next())
	}

	/// Every instance whose `field` equals `value`, at most `max`.
	pub fn fetch_multiple_by(
		&self,
		field: &str,
		value: impl Into<Value>,
		max: Option<usize>,
	) -> SeedingResult<Vec<Instance<T>>> {
		let predicate = self.field_equals(field, value.into())?;
		self.fetch_matching(predicate, max)
	}

	fn field_equals(&self, field: &str, value: Value) -> SeedingResult<impl Fn(&T) -> bool> {
		let accessor = self
			.inner
			.definition
			.field_set()
			.get(field)
			.cloned()
			.ok_or_else(|| SeedingError::missing_field(T::model_name(), field))?;
		Ok(move |target: &T| accessor.read(target) == value)
	}

	/// Number of instances currently held. Does not materialize.
	pub fn len(&self) -> usize {
		self.inner.instances.read().len()
	}

	/// Returns true if the pool holds no instances. Does not materialize.
	pub fn is_empty(&self) -> bool {
		self.inner.instances.read().is_empty()
	}

	/// Current materialization state.
	pub fn state(&self) -> PoolState {
		*self.inner.state.lock()
	}

	/// Returns true once every hook of this pool has run.
	pub fn is_settled(&self) -> bool {
		self.inner.settled.load(Ordering::SeqCst)
	}

	/// Number of instances built on initialization.
	pub fn capacity(&self) -> Option<usize> {
		self.inner.capacity
	}

	/// The definition instances are built from.
	pub fn definition(&self) -> &Definition<T> {
		&self.inner.definition
	}

	pub(crate) fn attach(&self, factory: &Factory) {
		*self.inner.link.write() = FactoryLink::Attached(factory.downgrade());
	}

	fn factory(&self) -> SeedingResult<Factory> {
		match &*self.inner.link.read() {
			FactoryLink::Detached(factory) => Ok(factory.clone()),
			FactoryLink::Attached(weak) => Factory::upgrade(weak).ok_or(SeedingError::FactoryDropped),
		}
	}

	fn snapshot(&self) -> Vec<Instance<T>> {
		self.inner.instances.read().clone()
	}
}

impl<T: Model> Clone for Pool<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: Model> fmt::Debug for Pool<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pool")
			.field("model", &T::model_name())
			.field("capacity", &self.inner.capacity)
			.field("len", &self.len())
			.field("state", &self.state())
			.field("settled", &self.is_settled())
			.finish()
	}
}
