// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::RefreshCause, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// Span wrapping one refresh or send.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Opens a `relay_auth.operation` span for `kind` at `stage`.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("relay_auth.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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

pub(super) fn failed<E>(kind: OperationKind, error: &E)
where
	E: ?Sized + Display,
{
	#[cfg(feature = "tracing")]
	tracing::warn!(operation = kind.as_str(), error = %error, "Operation failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, error);
}

pub(super) fn retrying(
	attempt: u32,
	max_attempts: u32,
	delay: StdDuration,
	cause: &RefreshCause,
) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		attempt,
		max_attempts,
		delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
		error = %cause,
		"Token refresh attempt failed; retrying."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, max_attempts, delay, cause);
}

pub(super) fn joined() {
	#[cfg(feature = "tracing")]
	tracing::debug!("Joining in-flight token refresh.");
}

#[cfg(all(test, feature = "tracing"))]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::TokenRefresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
