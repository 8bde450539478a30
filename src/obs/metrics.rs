// self
use crate::obs::{OperationKind, OperationOutcome};

const OPERATION_TOTAL: &str = "relay_auth_operation_total";
const SINGLEFLIGHT_JOIN_TOTAL: &str = "relay_auth_singleflight_join_total";

pub(super) fn count(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(OPERATION_TOTAL, "operation" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (OPERATION_TOTAL, kind, outcome);
}

pub(super) fn count_join() {
	#[cfg(feature = "metrics")]
	metrics::counter!(SINGLEFLIGHT_JOIN_TOTAL).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = SINGLEFLIGHT_JOIN_TOTAL;
}
