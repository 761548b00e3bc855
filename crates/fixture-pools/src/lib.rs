//! Pooled test fixtures with cross-references.
//!
//! This crate builds graphs of test objects: named pools of instances whose
//! fields come from declarative rules, including rules that point at other
//! pools, circularly if need be.
//!
//! - **Definitions** say how to construct a model and which value each field
//!   gets: attributes at construction, references once every pool exists,
//!   and a hook once the object is complete.
//! - **Pools** hold a fixed number of instances of one definition and answer
//!   random, indexed and predicate queries.
//! - **The factory** owns the pools by alias and initializes all of them in
//!   three passes on first use, which is what makes circular graphs work.
//!
//! # Features
//!
//! - `macros` - `#[derive(Model)]` (enabled by default)
//! - `json` - `serde_json` conversions and [`Overrides::from_json`] (enabled by default)
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! ```
//! use fixture_pools::prelude::*;
//!
//! #[derive(Default, Model)]
//! struct Group {
//!     name: String,
//!     owner: Option<Instance<User>>,
//! }
//!
//! #[derive(Default, Model)]
//! struct User {
//!     id: String,
//!     group: Option<Instance<Group>>,
//! }
//!
//! let factory = Factory::new();
//! factory
//!     .define_pool::<User>("User", 20)?
//!     .attr_sequence("id", "user-{n}")
//!     .reference_with("group", |f| f.fetch_random::<Group>("Group"));
//! factory
//!     .define_pool::<Group>("Group", 5)?
//!     .attr_sequence("name", "group-{n}")
//!     .reference_with("owner", |f| f.fetch_random::<User>("User"));
//!
//! let user = factory.fetch_random::<User>("User")?.expect("pool is not empty");
//! let group = user.read().group.clone().expect("references are resolved");
//! assert!(group.read().owner.is_some());
//! # Ok::<(), SeedingError>(())
//! ```
//!
//! # Architecture
//!
//! - [`Instance`] - shared, identity-compared handle to one object
//! - [`Value`] / [`FieldValue`] - what rules produce and fields accept
//! - [`Model`] / [`FieldSet`] - the per-type table of named fields
//! - [`Rule`], [`Overrides`] - literal and produced field values
//! - [`Definition`], [`Pool`], [`Factory`] - the fixture graph
//! - [`facade`] - a process-wide default factory

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

extern crate self as fixture_pools;

pub mod definition;
pub mod error;
pub mod facade;
pub mod factory;
pub mod instance;
pub mod model;
pub mod pool;
pub mod prelude;
pub mod value;

// Re-export commonly used types at crate root
pub use definition::{AfterHook, Definition, Overrides, Rule, Sequence};
pub use error::{SeedingError, SeedingResult};
pub use factory::{Deferred, Factory, FactoryOptions, Lookup};
pub use instance::{AnyInstance, Instance};
pub use model::{FieldAccessor, FieldSet, Model};
pub use pool::{Pool, PoolHook, PoolState};
pub use value::{FieldValue, Value};

// Re-export derive macro when available
#[cfg(feature = "macros")]
pub use fixture_pools_macros::Model;
