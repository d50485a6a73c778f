//! Time sources and cooperative sleeping.
//!
//! Every wait the scout performs (token refill, backoff, throttling) is routed through a
//! [`Clock`] so tests and simulations can swap in [`ManualClock`] and observe exact durations
//! without real sleeping.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type ClockFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Wall-clock source plus a cooperative sleep primitive.
pub trait Clock
where
	Self: 'static + Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends the caller for `duration` without blocking other tasks.
	fn sleep(&self, duration: Duration) -> ClockFuture<'_>;
}

/// Real clock backed by the tokio timer.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
#[cfg(feature = "tokio")]
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> ClockFuture<'_> {
		let duration =
			if duration.is_positive() { duration.unsigned_abs() } else { StdDuration::ZERO };

		Box::pin(tokio::time::sleep(duration))
	}
}

/// Deterministic clock whose `sleep` advances time instantly and records the request.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<OffsetDateTime>,
	sleeps: Mutex<Vec<Duration>>,
}
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self { now: Mutex::new(start), sleeps: Default::default() }
	}

	/// Moves the clock forward without recording a sleep.
	pub fn advance(&self, by: Duration) {
		*self.now.lock() += by;
	}

	/// Returns every sleep requested so far, in order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}

	/// Sum of all recorded sleeps.
	pub fn total_slept(&self) -> Duration {
		self.sleeps.lock().iter().copied().sum()
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::UNIX_EPOCH)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) -> ClockFuture<'_> {
		self.sleeps.lock().push(duration);
		self.advance(duration);

		Box::pin(std::future::ready(()))
	}
}
