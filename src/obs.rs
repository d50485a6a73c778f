//! Optional observability helpers for scout runs.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `lead_scout.stage` with a `stage` field and
//!   warn/info events for retries, channel failures, and run summaries.
//! - Enable `metrics` to increment the `lead_scout_request_total` counter (labeled by `outcome`)
//!   for every executor attempt and `lead_scout_stage_total` (labeled by `stage` + `outcome`)
//!   per pipeline stage.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the scout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Whole collection run.
	Collect,
	/// Fan-out search for one keyword.
	Search,
	/// OAuth client-credentials exchange.
	CredentialExchange,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Collect => "collect",
			Stage::Search => "search",
			Stage::CredentialExchange => "credential_exchange",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each executor attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Attempt succeeded.
	Success,
	/// Upstream throttled the attempt.
	Throttled,
	/// Attempt failed with a retryable error.
	Transient,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Success => "success",
			RequestOutcome::Throttled => "throttled",
			RequestOutcome::Transient => "transient",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
