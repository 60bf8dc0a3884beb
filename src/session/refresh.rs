//! Single-flight refresh coordination.
//!
//! Refreshes are serialized by an async mutex. A caller that queued behind another refresh
//! checks whether the record was replaced while it waited; if the replacement is still valid it
//! is returned as is, so concurrent callers racing past the same expiry share one round trip.
//! The held record is swapped only after a successful exchange, so dropping the future at any
//! await point leaves it unchanged.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	obs::{self, CallKind, CallOutcome, CallSpan},
	oauth::TokenFacade,
	session::SessionState,
};

/// Thread-safe counters for refresh round trips.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of refresh requests sent to the token endpoint.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refresh round trips.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh round trips.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

impl SessionState {
	pub(crate) async fn refresh(&self) -> Result<Arc<Credentials>> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let observed = self.credentials();
				let _singleflight = self.refresh_guard.lock().await;
				let current = self.credentials();

				if !Arc::ptr_eq(&observed, &current)
					&& current.is_valid_at(OffsetDateTime::now_utc(), self.config.expiry_skew)
				{
					return Ok(current);
				}

				let facade =
					TokenFacade::new(&current, &self.config.endpoints.token, &self.http_client)?;

				self.refresh_metrics.record_attempt();

				let refreshed = facade.refresh(&current).await.inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;
				let refreshed = Arc::new(refreshed);

				self.install(Arc::clone(&refreshed));
				self.refresh_metrics.record_success();

				Ok(refreshed)
			})
			.await;

		span.finish(&result);

		result
	}
}
