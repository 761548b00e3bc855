//! Error types for fixture pools.
//!
//! Every failure is immediate and fatal to the operation that raised it;
//! nothing in this crate retries.

use thiserror::Error;

/// Errors that can occur while defining, building or querying fixtures.
#[derive(Debug, Error)]
pub enum SeedingError {
	/// The alias was never registered on the factory.
	#[error("Requested unknown pool or definition: {0}")]
	UnknownPool(String),

	/// The alias resolves to a bare definition without a backing pool.
	#[error("No pool for {0}, definition only")]
	DefinitionOnly(String),

	/// A rule or match key does not name a field of the model.
	#[error("No field `{field}` on model {model}")]
	MissingField {
		/// Model the field was looked up on.
		model: String,
		/// The unknown field name.
		field: String,
	},

	/// More unique samples were requested than the pool holds.
	#[error("Requested {requested} instances from a pool of {available}")]
	InsufficientPoolSize {
		/// Number of instances requested.
		requested: usize,
		/// Number of instances currently in the pool.
		available: usize,
	},

	/// The registered model type differs from the one requested.
	#[error("Type mismatch for {name}: expected {expected}, found {actual}")]
	TypeMismatch {
		/// Alias or spec string the lookup used.
		name: String,
		/// Type the caller asked for.
		expected: String,
		/// Type actually registered.
		actual: String,
	},

	/// A pool spec string could not be parsed.
	#[error("Invalid pool spec: {0}")]
	InvalidPoolSpec(String),

	/// Registration attempted after the factory was initialized.
	#[error("Registry is frozen, cannot register {0} after initialization")]
	RegistryFrozen(String),

	/// A value could not be assigned to a field of a different type.
	#[error("Invalid value: expected {expected}, found {found}")]
	InvalidValue {
		/// Rust type of the receiving field.
		expected: &'static str,
		/// Kind of the value that was supplied.
		found: String,
	},

	/// An earlier initialization run failed; the graph is incomplete.
	#[error("Factory initialization failed: {0}")]
	InitializationFailed(String),

	/// A deferred lookup outlived the factory it was closed over.
	#[error("Factory was dropped before a deferred lookup ran")]
	FactoryDropped,

	/// A producer or hook reported a failure.
	#[error("Hook error: {0}")]
	Hook(String),

	/// JSON conversion error.
	#[cfg(feature = "json")]
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl SeedingError {
	/// Convenience constructor for producer and hook failures.
	pub fn hook(message: impl Into<String>) -> Self {
		Self::Hook(message.into())
	}

	pub(crate) fn missing_field(model: &str, field: &str) -> Self {
		Self::MissingField {
			model: model.to_string(),
			field: field.to_string(),
		}
	}
}

/// Result type alias for fixture operations.
pub type SeedingResult<T> = Result<T, SeedingError>;
