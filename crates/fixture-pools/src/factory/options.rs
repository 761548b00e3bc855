//! Factory configuration.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Environment variable read by [`FactoryOptions::from_env`].
pub const SEED_ENV_VAR: &str = "FIXTURE_POOLS_SEED";

/// Options for a [`Factory`](super::Factory).
///
/// # Example
///
/// ```
/// use fixture_pools::{Factory, FactoryOptions};
///
/// let factory = Factory::with_options(FactoryOptions::new().with_seed(42));
/// assert_eq!(factory.options().seed, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryOptions {
	/// Seed for the factory's random number generator. `None` seeds from
	/// system entropy.
	pub seed: Option<u64>,

	/// Reject registrations once initialization has started.
	pub freeze_registry: bool,
}

impl FactoryOptions {
	/// Default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Fixes the random seed.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Allows or rejects registrations after initialization.
	pub fn with_freeze_registry(mut self, freeze: bool) -> Self {
		self.freeze_registry = freeze;
		self
	}

	/// Default options with the seed taken from `FIXTURE_POOLS_SEED`, if set.
	///
	/// An unparsable value is logged and ignored.
	pub fn from_env() -> Self {
		let options = Self::default();
		match std::env::var(SEED_ENV_VAR) {
			Ok(raw) => match raw.trim().parse::<u64>() {
				Ok(seed) => options.with_seed(seed),
				Err(error) => {
					tracing::warn!(value = %raw, %error, "ignoring invalid {}", SEED_ENV_VAR);
					options
				}
			},
			Err(_) => options,
		}
	}

	pub(crate) fn rng(&self) -> StdRng {
		match self.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_entropy(),
		}
	}
}

impl Default for FactoryOptions {
	fn default() -> Self {
		Self {
			seed: None,
			freeze_registry: true,
		}
	}
}
