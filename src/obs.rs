//! Optional observability for token refreshes and relay sends.
//!
//! # Feature Flags
//!
//! - `tracing`: every operation runs inside a `relay_auth.operation` span carrying the
//!   `operation` and `stage` fields. Retries, singleflight joins, and failures are logged
//!   as events.
//! - `metrics`: `relay_auth_operation_total{operation, outcome}` counts started, succeeded,
//!   and failed operations; `relay_auth_singleflight_join_total` counts callers that joined a
//!   refresh already in flight.
//!
//! Call sites only use [`start`], [`finish`], and the event helpers below, so both backends
//! compile to nothing when their feature is off. Neither ever records a secret or token
//! value.

mod metrics;
mod tracing;

pub use tracing::{InstrumentedOperation, OperationSpan};

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::RefreshCause};

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Token endpoint exchange, retries included. One per singleflight leader.
	TokenRefresh,
	/// Decorated payload request.
	Send,
}
impl OperationKind {
	/// Label used for the `operation` span field and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::TokenRefresh => "token_refresh",
			Self::Send => "send",
		}
	}
}

/// Lifecycle point of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// The operation began.
	Started,
	/// The operation produced a value.
	Succeeded,
	/// The operation produced an error.
	Failed,
}
impl OperationOutcome {
	/// Classifies a finished operation.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Succeeded } else { Self::Failed }
	}

	/// Label used for the `outcome` metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Started => "started",
			Self::Succeeded => "succeeded",
			Self::Failed => "failed",
		}
	}
}

/// Opens the span for `kind` at `stage` and counts the start.
pub fn start(kind: OperationKind, stage: &'static str) -> OperationSpan {
	metrics::count(kind, OperationOutcome::Started);

	OperationSpan::new(kind, stage)
}

/// Counts the end of an operation and logs its error, if any.
pub fn finish<T, E>(kind: OperationKind, result: &Result<T, E>) -> OperationOutcome
where
	E: Display,
{
	let outcome = OperationOutcome::of(result);

	metrics::count(kind, outcome);

	if let Err(e) = result {
		tracing::failed(kind, e);
	}

	outcome
}

/// Logs a failed token attempt that is about to be retried.
pub fn refresh_retry(attempt: u32, max_attempts: u32, delay: StdDuration, cause: &RefreshCause) {
	tracing::retrying(attempt, max_attempts, delay, cause);
}

/// Records a caller joining the refresh already in flight.
pub fn singleflight_join() {
	metrics::count_join();
	tracing::joined();
}
