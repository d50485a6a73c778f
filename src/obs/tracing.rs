// self
use crate::{_prelude::*, obs::Stage, retry::RetryEvent};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by pipeline stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage and a free-form subject
	/// (keyword, channel list, ...).
	pub fn new(stage: Stage, subject: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("lead_scout.stage", stage = stage.as_str(), subject);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, subject);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning for a scheduled retry.
pub fn log_retry(event: &RetryEvent<'_>) {
	#[cfg(feature = "tracing")]
	match event {
		RetryEvent::Backoff { attempt, delay, error } => tracing::warn!(
			attempt,
			delay_ms = delay.whole_milliseconds() as u64,
			%error,
			"Transient failure; backing off before retrying."
		),
		RetryEvent::Throttled { occurrence, wait, error } => tracing::warn!(
			occurrence,
			wait_ms = wait.whole_milliseconds() as u64,
			%error,
			"Upstream throttled the request; waiting before retrying."
		),
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = event;
	}
}

/// Emits a warning for a channel that was skipped during a search.
pub fn log_channel_failure(channel: &str, keyword: &str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(channel, keyword, %error, "Channel search failed; skipping channel.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (channel, keyword, error);
	}
}

/// Emits a debug event after a successful credential exchange.
pub fn log_credential_exchange(expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%expires_at, "Obtained a new access token.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}

/// Emits the end-of-run summary.
pub fn log_collect_summary(
	keywords: usize,
	fetched: usize,
	unique: usize,
	leads: usize,
	failures: usize,
) {
	#[cfg(feature = "tracing")]
	tracing::info!(keywords, fetched, unique, leads, failures, "Collection run finished.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (keywords, fetched, unique, leads, failures);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = StageSpan::new(Stage::Search, "screenshot api");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn loggers_accept_events_without_subscriber() {
		log_retry(&RetryEvent::Backoff { attempt: 1, delay: Duration::seconds(1), error: &"boom" });
		log_channel_failure("webdev", "screenshot api", &"HTTP 503");
		log_credential_exchange(OffsetDateTime::UNIX_EPOCH);
		log_collect_summary(1, 2, 2, 1, 0);
	}
}
