// self
use crate::obs::{RequestOutcome, Stage};

/// Records an executor attempt outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("lead_scout_request_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: Stage, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"lead_scout_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_request_outcome(RequestOutcome::Throttled);
		record_stage_outcome(Stage::CredentialExchange, RequestOutcome::Failure);
	}
}
