// self
use crate::{
	_prelude::*,
	obs::{self, CallKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapping one session call.
///
/// The span starts with the `call` and `stage` fields. The last HTTP `status` seen while the
/// call runs and its final `outcome` are filled in as they become known.
#[derive(Clone, Debug)]
pub struct CallSpan {
	kind: CallKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"strava_session.call",
				call = kind.as_str(),
				stage,
				status = tracing::field::Empty,
				outcome = tracing::field::Empty,
			);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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

	/// Closes the call: fills in `outcome` (and the error's status, if any) and records the
	/// result on the metrics and logging pipelines.
	pub(crate) fn finish<T>(&self, result: &Result<T>) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", obs::CallOutcome::of(result).as_str());

			if let Some(status) = result.as_ref().err().and_then(Error::status) {
				self.span.record("status", status);
			}
		}

		obs::record_result(self.kind, result);
	}
}

/// Records the HTTP status of a response on the call span currently entered.
pub(crate) fn record_response_status(status: u16) {
	#[cfg(feature = "tracing")]
	tracing::Span::current().record("status", status);
	#[cfg(not(feature = "tracing"))]
	let _ = status;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = CallSpan::new(CallKind::Refresh, "instrument_passes_output_through");
		let value = span
			.instrument(async {
				record_response_status(200);

				42
			})
			.await;

		assert_eq!(value, 42);
	}

	#[test]
	fn finish_accepts_both_outcomes() {
		let span = CallSpan::new(CallKind::Api, "finish_accepts_both_outcomes");

		span.finish(&Ok::<_, Error>(()));
		span.finish::<()>(&Err(Error::auth("rejected")));
	}
}
