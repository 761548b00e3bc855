//! Pool query integration tests
//!
//! Exercises the data-access operations through a factory, against the
//! 20-instance `Example` pool with a seeded `rand` field.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rstest::{fixture, rstest};

use fixture_pools::prelude::*;
use fixture_pools::PoolState;

mod helpers;
use helpers::models::{Example, Foo};

const SEED: u64 = 1;

fn example_factory(seed: u64) -> Factory {
	let factory = Factory::with_options(FactoryOptions::new().with_seed(seed));
	let ticks = Arc::new(AtomicU64::new(1_000));
	factory
		.define_pool::<Example>("Example", 20)
		.unwrap()
		.attr_with("foo", move |_| Ok(ticks.fetch_add(1, Ordering::SeqCst)))
		.attr("bar", "bar")
		.attr("baz", "baz")
		.attr_with("rand", |f| Ok(f.with_rng(|rng| rng.gen_range(0..=1_i64))));
	factory
}

#[fixture]
fn factory() -> Factory {
	example_factory(SEED)
}

#[rstest]
fn test_fetch_all(factory: Factory) {
	// Act
	let all = factory.fetch_all::<Example>("Example").unwrap();

	// Assert
	assert_eq!(all.len(), 20);
	assert!(all.iter().all(|e| e.read().baz == "baz"));
}

#[rstest]
fn test_pool_materializes_on_first_access(factory: Factory) {
	// Arrange
	let definition = factory.definition::<Example>("Example").unwrap();
	assert_eq!(definition.attribute_names(), ["foo", "bar", "baz", "rand"]);

	// Act
	let handle = factory.pool::<Example>("Example").unwrap();

	// Assert
	assert_eq!(handle.state(), PoolState::Initialized);
	assert!(handle.is_settled());
	assert_eq!(handle.len(), 20);
}

#[rstest]
fn test_create_grows_empty_pool() {
	// Arrange
	let factory = Factory::new();
	factory
		.define_pool::<Example>("Empty", None)
		.unwrap()
		.attr("bar", "bar");
	assert_eq!(factory.fetch_all::<Example>("Empty").unwrap().len(), 0);

	// Act
	factory.create::<Example>("Empty", Overrides::new()).unwrap();
	let first = factory.fetch_all::<Example>("Empty").unwrap();
	factory.create::<Example>("Empty", Overrides::new()).unwrap();
	let second = factory.fetch_all::<Example>("Empty").unwrap();

	// Assert
	assert_eq!(first.len(), 1);
	assert_eq!(second.len(), 2);
}

#[rstest]
fn test_fetch_random_returns_pool_members(factory: Factory) {
	// Arrange
	let all: HashSet<_> = factory
		.fetch_all::<Example>("Example")
		.unwrap()
		.into_iter()
		.collect();

	// Act
	let picks: Vec<_> = (0..10)
		.map(|_| factory.fetch_random::<Example>("Example").unwrap().unwrap())
		.collect();

	// Assert
	assert!(picks.iter().all(|pick| all.contains(pick)));
	let distinct: HashSet<_> = picks.into_iter().collect();
	assert!(distinct.len() > 1);
}

#[rstest]
fn test_fetch_multiple_random(factory: Factory) {
	// Act
	let picked = factory
		.fetch_multiple_random::<Example>("Example", 3, true)
		.unwrap();

	// Assert
	assert_eq!(picked.len(), 3);
	assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
}

#[rstest]
fn test_fetch_multiple_random_more_than_pool(factory: Factory) {
	let result = factory.fetch_multiple_random::<Example>("Example", 25, true);

	assert!(matches!(
		result,
		Err(SeedingError::InsufficientPoolSize {
			requested: 25,
			available: 20
		})
	));
}

#[rstest]
fn test_fetch_by(factory: Factory) {
	// Act
	let by_bar = factory.fetch_by::<Example>("Example", "bar", "bar").unwrap().unwrap();
	let by_rand = factory.fetch_by::<Example>("Example", "rand", 1).unwrap();

	// Assert
	assert_eq!(by_bar.read().bar, "bar");
	// Twenty draws under the fixed seed include a 1.
	assert_eq!(by_rand.unwrap().read().rand, 1);
}

#[rstest]
fn test_fetch_by_does_not_coerce_types(factory: Factory) {
	assert!(factory.fetch_by::<Example>("Example", "rand", "1").unwrap().is_none());
	assert!(factory.fetch_by::<Example>("Example", "rand", 1.0).unwrap().is_none());
}

#[rstest]
#[case::unbounded("bar", None, 20)]
#[case::bounded("bar", Some(5), 5)]
#[case::no_match("wrong", None, 0)]
fn test_fetch_multiple_by(
	factory: Factory,
	#[case] bar: &str,
	#[case] max: Option<usize>,
	#[case] expected: usize,
) {
	// Act
	let found = factory
		.fetch_multiple_by::<Example>("Example", "bar", bar, max)
		.unwrap();

	// Assert
	assert_eq!(found.len(), expected);
	assert!(found.iter().all(|e| e.read().bar == "bar"));
}

#[rstest]
fn test_fetch_multiple_by_random_field(factory: Factory) {
	let ones = factory.fetch_multiple_by::<Example>("Example", "rand", 1, None).unwrap();
	let zeros = factory.fetch_multiple_by::<Example>("Example", "rand", 0, None).unwrap();

	assert!(ones.iter().all(|e| e.read().rand == 1));
	assert_eq!(ones.len() + zeros.len(), 20);
}

#[rstest]
fn test_fetch_matching(factory: Factory) {
	// Act
	let zeros = factory
		.fetch_matching::<Example, _>("Example", |e| e.rand == 0, None)
		.unwrap();

	// Assert
	assert!(zeros.iter().all(|e| e.read().rand == 0));
	let foos: Vec<u64> = zeros.iter().map(|e| e.read().foo).collect();
	let mut sorted = foos.clone();
	sorted.sort_unstable();
	assert_eq!(foos, sorted);
}

#[rstest]
fn test_fetch_by_unknown_field(factory: Factory) {
	let result = factory.fetch_by::<Example>("Example", "qux", 1);

	assert!(matches!(
		result,
		Err(SeedingError::MissingField { field, .. }) if field == "qux"
	));
}

#[rstest]
fn test_same_seed_same_pool() {
	let snapshot = || {
		example_factory(SEED)
			.fetch_all::<Example>("Example")
			.unwrap()
			.iter()
			.map(|e| e.read().rand)
			.collect::<Vec<_>>()
	};

	assert_eq!(snapshot(), snapshot());
}

#[rstest]
fn test_typed_alias_pool_grows_by_create() {
	// Arrange
	let factory = Factory::new();
	factory
		.define_pool::<Foo>("Foo:TypeX", 10)
		.unwrap()
		.attr_sequence("label", "foo-{n}");

	// Act
	let created = factory.create::<Foo>("Foo", Overrides::new()).unwrap();

	// Assert
	let all = factory.fetch_all::<Foo>("Foo").unwrap();
	assert_eq!(all.len(), 11);
	assert_eq!(all[10], created);
}

#[rstest]
fn test_typed_alias_must_name_the_model() {
	let factory = Factory::new();

	let result = factory.define_pool::<Foo>("Foo:Example", 10);

	assert!(matches!(result, Err(SeedingError::TypeMismatch { .. })));
}

#[rstest]
fn test_overrides_from_json(factory: Factory) {
	// Arrange
	let overrides = Overrides::from_json(serde_json::json!({"bar": "json", "rand": 7})).unwrap();

	// Act
	let created = factory.create::<Example>("Example", overrides).unwrap();

	// Assert
	assert_eq!(created.read().bar, "json");
	assert_eq!(created.read().rand, 7);
	assert_eq!(created.read().baz, "baz");
}
