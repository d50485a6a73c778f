//! Exponential backoff policy.

// self
use crate::_prelude::*;

/// Delay schedule applied between retries of transient failures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
	/// Delay before the first retry.
	pub base_delay: Duration,
	/// Growth factor applied per attempt.
	pub multiplier: f64,
	/// Upper bound for any single delay.
	pub max_backoff: Duration,
	/// Number of retries allowed after the initial attempt.
	pub max_retries: u32,
}
impl BackoffPolicy {
	/// Delay to wait after the `attempt`-th failure (zero-based).
	///
	/// `min(base_delay × multiplier^attempt, max_backoff)`.
	pub fn delay(&self, attempt: u32) -> Duration {
		let cap = self.max_backoff.as_seconds_f64();
		let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
		let raw = self.base_delay.as_seconds_f64() * self.multiplier.powi(exponent);

		if !raw.is_finite() || raw >= cap {
			return self.max_backoff;
		}

		Duration::seconds_f64(raw.max(0.))
	}

	/// Returns `true` when another retry is allowed after `attempt` retries.
	pub fn should_retry(&self, attempt: u32) -> bool {
		attempt < self.max_retries
	}
}
impl Default for BackoffPolicy {
	fn default() -> Self {
		Self {
			base_delay: Duration::seconds(1),
			multiplier: 2.,
			max_backoff: Duration::seconds(60),
			max_retries: 3,
		}
	}
}
