//! Token refresh timing and retry policy.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Governs how early a token is treated as expiring and how failed refreshes are retried.
///
/// The serialized form uses plain integers so the policy can live in a host configuration
/// file: `refresh_offset_secs`, `max_retries`, and `initial_backoff_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshPolicy {
	refresh_offset_secs: u32,
	max_retries: u32,
	initial_backoff_ms: u64,
}
impl RefreshPolicy {
	const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;
	const DEFAULT_MAX_RETRIES: u32 = 3;
	const DEFAULT_REFRESH_OFFSET_SECS: u32 = 300;

	/// Creates the default policy (300 s offset, 3 attempts, 1 s initial backoff).
	pub fn new() -> Self {
		Self {
			refresh_offset_secs: Self::DEFAULT_REFRESH_OFFSET_SECS,
			max_retries: Self::DEFAULT_MAX_RETRIES,
			initial_backoff_ms: Self::DEFAULT_INITIAL_BACKOFF_MS,
		}
	}

	/// Overrides the refresh offset; negative values clamp to zero.
	pub fn with_refresh_offset(mut self, offset: Duration) -> Self {
		self.refresh_offset_secs = if offset.is_negative() {
			0
		} else {
			u32::try_from(offset.whole_seconds()).unwrap_or(u32::MAX)
		};

		self
	}

	/// Overrides the total number of token endpoint attempts per refresh.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the delay before the second attempt.
	pub fn with_initial_backoff(mut self, backoff: StdDuration) -> Self {
		self.initial_backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);

		self
	}

	/// Safety margin subtracted from every server-reported expiry.
	pub fn refresh_offset(&self) -> Duration {
		Duration::seconds(self.refresh_offset_secs.into())
	}

	/// Total attempts per refresh, including the first one.
	pub fn max_retries(&self) -> u32 {
		self.max_retries
	}

	/// Delay before the second attempt.
	pub fn initial_backoff(&self) -> StdDuration {
		StdDuration::from_millis(self.initial_backoff_ms)
	}

	/// Delay to wait after the failed attempt with 0-based index `attempt`:
	/// `initial_backoff * 2^attempt`, saturating.
	pub fn backoff(&self, attempt: u32) -> StdDuration {
		let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);

		self.initial_backoff().saturating_mul(factor)
	}

	/// Rejects policies that would never contact the token endpoint.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_retries == 0 {
			return Err(ConfigError::ZeroRetries);
		}

		Ok(())
	}
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_relay_client_settings() {
		let policy = RefreshPolicy::default();

		assert_eq!(policy.refresh_offset(), Duration::seconds(300));
		assert_eq!(policy.max_retries(), 3);
		assert_eq!(policy.initial_backoff(), StdDuration::from_secs(1));
		assert!(policy.validate().is_ok());
	}

	#[test]
	fn backoff_doubles_per_attempt_and_saturates() {
		let policy = RefreshPolicy::new().with_initial_backoff(StdDuration::from_millis(250));

		assert_eq!(policy.backoff(0), StdDuration::from_millis(250));
		assert_eq!(policy.backoff(1), StdDuration::from_millis(500));
		assert_eq!(policy.backoff(3), StdDuration::from_secs(2));
		assert_eq!(policy.backoff(64), StdDuration::from_millis(250).saturating_mul(u32::MAX));
	}

	#[test]
	fn negative_offsets_clamp_and_zero_attempts_fail_validation() {
		let policy =
			RefreshPolicy::new().with_refresh_offset(Duration::seconds(-5)).with_max_retries(0);

		assert_eq!(policy.refresh_offset(), Duration::ZERO);
		assert!(matches!(policy.validate(), Err(ConfigError::ZeroRetries)));
	}

	#[test]
	fn deserializes_partial_config_over_defaults() {
		let policy: RefreshPolicy = serde_json::from_str(r#"{"max_retries":5}"#)
			.expect("Partial policy should deserialize.");

		assert_eq!(policy.max_retries(), 5);
		assert_eq!(policy.refresh_offset(), Duration::seconds(300));
	}
}
