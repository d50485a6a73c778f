//! Retrying executor that pairs every attempt with a rate-limiter permit.
//!
//! Tasks report failures as [`TaskFailure`] so the executor can tell explicit upstream
//! throttling (wait for the server-provided window, then retry) apart from ordinary transient
//! errors (exponential backoff against a fixed budget) and fatal ones (surface immediately).

// self
use crate::{
	_prelude::*,
	obs::{self, RequestOutcome},
	rate_limit::RateLimiter,
};

/// Failure classification returned by a task driven by [`RetryingExecutor`].
#[derive(Debug)]
pub enum TaskFailure<E> {
	/// Upstream explicitly signaled rate limiting.
	Throttled {
		/// Server-provided wait, if any.
		retry_after: Option<Duration>,
		/// Error to surface if the throttle budget runs out.
		error: E,
	},
	/// Any other retryable failure.
	Transient(E),
	/// Failure that retrying cannot fix.
	Fatal(E),
}

/// Retry boundary reported to a [`RetryObserver`].
pub enum RetryEvent<'a> {
	/// A transient failure is about to be retried after `delay`.
	Backoff {
		/// One-based retry number.
		attempt: u32,
		/// Delay applied before the retry.
		delay: Duration,
		/// Failure that triggered the retry.
		error: &'a (dyn Display + Send + Sync),
	},
	/// A throttled attempt is about to be retried after `wait`.
	Throttled {
		/// One-based count of throttling signals seen by the task.
		occurrence: u32,
		/// Wait enforced before the retry.
		wait: Duration,
		/// Failure that triggered the retry.
		error: &'a (dyn Display + Send + Sync),
	},
}
impl Debug for RetryEvent<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Backoff { attempt, delay, error } => f
				.debug_struct("Backoff")
				.field("attempt", attempt)
				.field("delay", delay)
				.field("error", &format_args!("{error}"))
				.finish(),
			Self::Throttled { occurrence, wait, error } => f
				.debug_struct("Throttled")
				.field("occurrence", occurrence)
				.field("wait", wait)
				.field("error", &format_args!("{error}"))
				.finish(),
		}
	}
}

/// Side-effect-only hook invoked synchronously at every retry boundary.
pub trait RetryObserver
where
	Self: Send + Sync,
{
	/// Receives a retry event; cannot influence the retry decision.
	fn on_retry(&self, event: &RetryEvent<'_>);
}

/// Default observer that forwards retry events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRetryObserver;
impl RetryObserver for TracingRetryObserver {
	fn on_retry(&self, event: &RetryEvent<'_>) {
		obs::log_retry(event);
	}
}

/// Runs tasks under the shared limiter with throttle compliance and transient backoff.
#[derive(Clone)]
pub struct RetryingExecutor {
	limiter: Arc<RateLimiter>,
	observer: Arc<dyn RetryObserver>,
}
impl RetryingExecutor {
	/// Creates an executor that logs retries through `tracing`.
	pub fn new(limiter: Arc<RateLimiter>) -> Self {
		Self { limiter, observer: Arc::new(TracingRetryObserver) }
	}

	/// Replaces the retry observer.
	pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Shared limiter behind this executor.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Drives `task` until it succeeds, fails fatally, or exhausts a retry budget.
	///
	/// A permit is acquired before every attempt. Throttled attempts are retried after
	/// [`RateLimiter::report_throttled`] and count only against
	/// `max_throttled_retries`; transient attempts count against the backoff budget.
	pub async fn run<T, E, F, Fut>(&self, mut task: F) -> Result<T, E>
	where
		E: Display + Send + Sync,
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, TaskFailure<E>>>,
	{
		let max_throttled = self.limiter.config().max_throttled_retries;
		let mut attempt = 0_u32;
		let mut throttled = 0_u32;

		loop {
			self.limiter.acquire().await;

			match task().await {
				Ok(value) => {
					obs::record_request_outcome(RequestOutcome::Success);

					return Ok(value);
				},
				Err(TaskFailure::Throttled { retry_after, error }) => {
					obs::record_request_outcome(RequestOutcome::Throttled);

					if throttled >= max_throttled {
						obs::record_request_outcome(RequestOutcome::Failure);

						return Err(error);
					}

					throttled += 1;

					let wait = retry_after.unwrap_or(self.limiter.config().max_throttle_wait);

					self.observer.on_retry(&RetryEvent::Throttled {
						occurrence: throttled,
						wait,
						error: &error,
					});
					self.limiter.report_throttled(Some(wait)).await;
				},
				Err(TaskFailure::Transient(error)) => {
					obs::record_request_outcome(RequestOutcome::Transient);

					if !self.limiter.should_retry(attempt) {
						obs::record_request_outcome(RequestOutcome::Failure);

						return Err(error);
					}

					let delay = self.limiter.backoff_delay(attempt);

					attempt += 1;

					self.observer.on_retry(&RetryEvent::Backoff { attempt, delay, error: &error });
					self.limiter.clock().sleep(delay).await;
				},
				Err(TaskFailure::Fatal(error)) => {
					obs::record_request_outcome(RequestOutcome::Failure);

					return Err(error);
				},
			}
		}
	}
}
impl Debug for RetryingExecutor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetryingExecutor").field("limiter", &self.limiter).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;
	use crate::{
		clock::ManualClock,
		rate_limit::{BackoffPolicy, RateLimitConfig},
	};

	#[derive(Default)]
	struct RecordingObserver(Mutex<Vec<String>>);
	impl RetryObserver for RecordingObserver {
		fn on_retry(&self, event: &RetryEvent<'_>) {
			let line = match event {
				RetryEvent::Backoff { attempt, delay, error } =>
					format!("backoff {attempt} {}s {error}", delay.whole_seconds()),
				RetryEvent::Throttled { occurrence, wait, error } =>
					format!("throttled {occurrence} {}s {error}", wait.whole_seconds()),
			};

			self.0.lock().push(line);
		}
	}

	fn build(
		config: RateLimitConfig,
	) -> (RetryingExecutor, Arc<ManualClock>, Arc<RecordingObserver>) {
		let clock = Arc::new(ManualClock::default());
		let limiter = Arc::new(RateLimiter::with_clock(config, clock.clone()));
		let observer = Arc::new(RecordingObserver::default());
		let executor = RetryingExecutor::new(limiter).with_observer(observer.clone());

		(executor, clock, observer)
	}

	fn roomy() -> RateLimitConfig {
		RateLimitConfig { requests_per_minute: 600, burst_limit: 50, ..Default::default() }
	}

	#[tokio::test]
	async fn success_short_circuits() {
		let (executor, clock, observer) = build(roomy());
		let calls = AtomicU32::new(0);
		let value = executor
			.run(|| async {
				calls.fetch_add(1, Ordering::SeqCst);

				Ok::<_, TaskFailure<String>>(7)
			})
			.await
			.expect("Successful task should return its value.");

		assert_eq!(value, 7);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(clock.sleeps().is_empty());
		assert!(observer.0.lock().is_empty());
	}

	#[tokio::test]
	async fn transient_failures_back_off_then_propagate() {
		let config = RateLimitConfig {
			backoff: BackoffPolicy { max_retries: 2, ..Default::default() },
			..roomy()
		};
		let (executor, clock, observer) = build(config);
		let calls = AtomicU32::new(0);
		let err = executor
			.run(|| async {
				let n = calls.fetch_add(1, Ordering::SeqCst);

				Err::<(), _>(TaskFailure::Transient(format!("boom-{n}")))
			})
			.await
			.expect_err("Exhausted retries should surface the last error.");

		assert_eq!(err, "boom-2");
		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert_eq!(clock.sleeps(), vec![Duration::seconds(1), Duration::seconds(2)]);
		assert_eq!(*observer.0.lock(), vec!["backoff 1 1s boom-0", "backoff 2 2s boom-1"]);
	}

	#[tokio::test]
	async fn throttling_waits_for_hint_without_spending_backoff_budget() {
		let config = RateLimitConfig {
			backoff: BackoffPolicy { max_retries: 0, ..Default::default() },
			..roomy()
		};
		let (executor, clock, observer) = build(config);
		let calls = AtomicU32::new(0);
		let value = executor
			.run(|| async {
				match calls.fetch_add(1, Ordering::SeqCst) {
					0 | 1 => Err(TaskFailure::Throttled {
						retry_after: Some(Duration::seconds(3)),
						error: "slow down".to_owned(),
					}),
					_ => Ok("done"),
				}
			})
			.await
			.expect("Throttled task should eventually succeed.");

		assert_eq!(value, "done");
		assert_eq!(clock.sleeps(), vec![Duration::seconds(3), Duration::seconds(3)]);
		assert_eq!(
			*observer.0.lock(),
			vec!["throttled 1 3s slow down", "throttled 2 3s slow down"]
		);
	}

	#[tokio::test]
	async fn throttling_is_bounded_by_its_own_cap() {
		let config = RateLimitConfig { max_throttled_retries: 2, ..roomy() };
		let (executor, clock, _observer) = build(config);
		let calls = AtomicU32::new(0);
		let err = executor
			.run(|| async {
				calls.fetch_add(1, Ordering::SeqCst);

				Err::<(), _>(TaskFailure::Throttled { retry_after: None, error: "429".to_owned() })
			})
			.await
			.expect_err("Endless throttling should eventually give up.");

		assert_eq!(err, "429");
		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert_eq!(clock.sleeps(), vec![Duration::seconds(60), Duration::seconds(60)]);
	}

	#[tokio::test]
	async fn fatal_failures_are_not_retried() {
		let (executor, clock, _observer) = build(roomy());
		let calls = AtomicU32::new(0);
		let err = executor
			.run(|| async {
				calls.fetch_add(1, Ordering::SeqCst);

				Err::<(), _>(TaskFailure::Fatal("denied".to_owned()))
			})
			.await
			.expect_err("Fatal failures should propagate.");

		assert_eq!(err, "denied");
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(clock.sleeps().is_empty());
	}

	#[test]
	fn events_debug_with_displayed_error() {
		let error = "slow down".to_owned();
		let event =
			RetryEvent::Throttled { occurrence: 2, wait: Duration::seconds(3), error: &error };
		let rendered = format!("{event:?}");

		assert!(rendered.starts_with("Throttled"));
		assert!(rendered.contains("occurrence: 2"));
		assert!(rendered.contains("error: slow down"));
	}
}
