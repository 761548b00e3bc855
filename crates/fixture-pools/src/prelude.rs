//! Convenience re-exports for common usage.
//!
//! ```
//! use fixture_pools::prelude::*;
//!
//! let factory = Factory::new();
//! assert!(factory.pool_names().is_empty());
//! ```

pub use crate::error::{SeedingError, SeedingResult};

pub use crate::definition::{Definition, Overrides, Rule};
pub use crate::factory::{Deferred, Factory, FactoryOptions, Lookup};
pub use crate::instance::Instance;
pub use crate::model::{FieldSet, Model};
pub use crate::pool::Pool;
pub use crate::value::{FieldValue, Value};

#[cfg(feature = "macros")]
pub use fixture_pools_macros::Model;
