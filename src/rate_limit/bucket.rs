//! Token bucket state with time-proportional refill.

// self
use crate::_prelude::*;

/// Capped, time-refilling permit counter.
///
/// The bucket is a plain value; callers that share it across tasks wrap it in a mutex (see
/// [`RateLimiter`](crate::rate_limit::RateLimiter)) so refill and decrement happen as one step.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenBucket {
	capacity: f64,
	requests_per_minute: f64,
	tokens: f64,
	last_refill: OffsetDateTime,
}
impl TokenBucket {
	/// Creates a full bucket.
	///
	/// `capacity` and `requests_per_minute` are clamped to at least one permit.
	pub fn new(capacity: u32, requests_per_minute: u32, now: OffsetDateTime) -> Self {
		let capacity = f64::from(capacity.max(1));

		Self {
			capacity,
			requests_per_minute: f64::from(requests_per_minute.max(1)),
			tokens: capacity,
			last_refill: now,
		}
	}

	/// Burst limit.
	pub fn capacity(&self) -> f64 {
		self.capacity
	}

	/// Tokens currently available (as of the last refill).
	pub fn tokens(&self) -> f64 {
		self.tokens
	}

	/// Adds tokens for the time elapsed since the previous refill.
	///
	/// An instant earlier than the last refill is ignored; the refill mark never moves back.
	pub fn refill(&mut self, now: OffsetDateTime) {
		let elapsed = now - self.last_refill;

		if !elapsed.is_positive() {
			return;
		}

		let earned = elapsed.as_seconds_f64() * self.requests_per_minute / 60.;

		self.tokens = (self.tokens + earned).min(self.capacity);
		self.last_refill = now;
	}

	/// Refills, then consumes one token if available.
	pub fn try_acquire(&mut self, now: OffsetDateTime) -> bool {
		self.refill(now);

		if self.tokens >= 1. {
			self.tokens -= 1.;

			true
		} else {
			false
		}
	}

	/// Time until one full token will be available, assuming no other consumer.
	///
	/// Rounded up to the next nanosecond so a sleep of this length always makes progress.
	pub fn wait_for_token(&self) -> Duration {
		if self.tokens >= 1. {
			return Duration::ZERO;
		}

		let secs = (1. - self.tokens) * 60. / self.requests_per_minute;
		let nanos = (secs * 1_000_000_000.).ceil().max(1.);

		Duration::nanoseconds(nanos as i64)
	}

	/// Drops every available token, as if the upstream had consumed the whole budget.
	pub fn drain(&mut self, now: OffsetDateTime) {
		self.tokens = 0.;
		self.last_refill = self.last_refill.max(now);
	}
}
