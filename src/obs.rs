//! Optional observability helpers for session calls.
//!
//! # Feature Flags
//!
//! - `tracing` (default) wraps every token exchange and API call in a span named
//!   `strava_session.call` carrying `call`, `stage`, the last HTTP `status` and the final
//!   `outcome`, and logs each outcome.
//! - `metrics` increments the `strava_session_call_total` counter for every
//!   attempt/success/failure, labeled by `call` + `outcome`, and publishes the rate-limit
//!   budget reported by the API as `strava_session_rate_limit_usage` and
//!   `strava_session_rate_limit_limit` gauges labeled by `window`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Call kinds observed by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// `grant_type=refresh_token` exchange.
	Refresh,
	/// `grant_type=authorization_code` exchange.
	AuthorizationCode,
	/// Deauthorization request.
	Deauthorization,
	/// Resource call through the API facade.
	Api,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Refresh => "refresh",
			CallKind::AuthorizationCode => "authorization_code",
			CallKind::Deauthorization => "deauthorization",
			CallKind::Api => "api",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a session helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl CallOutcome {
	/// Final outcome of a finished call.
	pub fn of<T>(result: &Result<T>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the final outcome of a call on both the metrics and logging pipelines.
pub(crate) fn record_result<T>(kind: CallKind, result: &Result<T>) {
	match result {
		Ok(_) => {
			record_call_outcome(kind, CallOutcome::Success);

			#[cfg(feature = "tracing")]
			::tracing::debug!(call = kind.as_str(), "call succeeded");
		},
		Err(err) => {
			record_call_outcome(kind, CallOutcome::Failure);

			#[cfg(feature = "tracing")]
			::tracing::warn!(
				call = kind.as_str(),
				kind = ?err.kind(),
				status = err.status(),
				error = %err,
				"call failed"
			);
			#[cfg(not(feature = "tracing"))]
			let _ = err;
		},
	}
}
