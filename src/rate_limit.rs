//! Shared outbound pacing: a token bucket plus the backoff and throttle waits that go with it.
//!
//! A single [`RateLimiter`] is meant to be shared (behind `Arc`) by every component that talks
//! to the upstream API, so the aggregate request rate never exceeds
//! [`RateLimitConfig::requests_per_minute`] no matter how many callers are in flight.

pub mod backoff;
pub mod bucket;

pub use backoff::*;
pub use bucket::*;

// self
use crate::{_prelude::*, clock::Clock};

/// Limiter tuning knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
	/// Sustained request budget.
	pub requests_per_minute: u32,
	/// Bucket capacity (maximum burst).
	pub burst_limit: u32,
	/// Retry schedule for transient failures.
	pub backoff: BackoffPolicy,
	/// Wait applied after a throttling signal that carried no hint.
	pub max_throttle_wait: Duration,
	/// Upper bound on consecutive throttling-triggered retries for one task.
	pub max_throttled_retries: u32,
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self {
			requests_per_minute: 30,
			burst_limit: 5,
			backoff: BackoffPolicy::default(),
			max_throttle_wait: Duration::seconds(60),
			max_throttled_retries: 5,
		}
	}
}

/// Token-bucket limiter with cooperative waits.
///
/// The bucket lives behind an async mutex that stays locked while a caller waits for refill,
/// so concurrent callers queue up instead of racing for the same fractional token.
pub struct RateLimiter {
	bucket: AsyncMutex<TokenBucket>,
	config: RateLimitConfig,
	clock: Arc<dyn Clock>,
}
impl RateLimiter {
	/// Creates a limiter driven by the tokio-backed system clock.
	#[cfg(feature = "tokio")]
	pub fn new(config: RateLimitConfig) -> Self {
		Self::with_clock(config, Arc::new(crate::clock::SystemClock))
	}

	/// Creates a limiter driven by the provided clock.
	pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
		let bucket = TokenBucket::new(config.burst_limit, config.requests_per_minute, clock.now());

		Self { bucket: AsyncMutex::new(bucket), config, clock }
	}

	/// Active configuration.
	pub fn config(&self) -> &RateLimitConfig {
		&self.config
	}

	/// Clock used for every wait.
	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	/// Waits until a token is available and consumes it.
	pub async fn acquire(&self) {
		let mut bucket = self.bucket.lock().await;

		while !bucket.try_acquire(self.clock.now()) {
			let wait = bucket.wait_for_token();

			self.clock.sleep(wait).await;
		}
	}

	/// Snapshot of available tokens after refilling to "now".
	pub async fn available(&self) -> f64 {
		let mut bucket = self.bucket.lock().await;

		bucket.refill(self.clock.now());

		bucket.tokens()
	}

	/// Complies with explicit upstream backpressure.
	///
	/// Empties the bucket, then holds it for `retry_after` (or
	/// [`RateLimitConfig::max_throttle_wait`] without a hint). Returns the time waited.
	pub async fn report_throttled(&self, retry_after: Option<Duration>) -> Duration {
		let wait = retry_after.unwrap_or(self.config.max_throttle_wait);
		let mut bucket = self.bucket.lock().await;

		bucket.drain(self.clock.now());
		self.clock.sleep(wait).await;

		wait
	}

	/// Backoff delay for the `attempt`-th retry.
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		self.config.backoff.delay(attempt)
	}

	/// Returns `true` while the transient retry budget is not exhausted.
	pub fn should_retry(&self, attempt: u32) -> bool {
		self.config.backoff.should_retry(attempt)
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter").field("config", &self.config).finish()
	}
}
