// self
use crate::{
	obs::{CallKind, CallOutcome},
	ratelimit::RateLimitStatus,
};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"strava_session_call_total",
			"call" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Publishes the request budget advertised by an API response (when enabled).
///
/// Each known window sets a usage and a limit gauge labeled `short_term` or `daily`.
pub fn record_rate_limit(status: &RateLimitStatus) {
	#[cfg(feature = "metrics")]
	{
		for (window, budget) in [("short_term", status.short_term), ("daily", status.daily)] {
			let Some(budget) = budget else { continue };

			metrics::gauge!("strava_session_rate_limit_usage", "window" => window)
				.set(f64::from(budget.usage));
			metrics::gauge!("strava_session_rate_limit_limit", "window" => window)
				.set(f64::from(budget.limit));
		}
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = status;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::ratelimit::RateLimitWindow;

	#[test]
	fn record_call_outcome_without_recorder_is_silent() {
		record_call_outcome(CallKind::Api, CallOutcome::Failure);
	}

	#[test]
	fn record_rate_limit_without_recorder_is_silent() {
		record_rate_limit(&RateLimitStatus {
			short_term: Some(RateLimitWindow { limit: 200, usage: 17 }),
			daily: None,
			retry_after: None,
		});
	}
}
