//! Cached access token snapshot and the cache that holds it.

// crates.io
use http::header::InvalidHeaderValue;
// self
use crate::{_prelude::*, auth::Secret};

/// Immutable access token snapshot.
///
/// `expires_at` already has the refresh offset subtracted, so a token is treated as expired
/// before the server would reject it. The `Authorization` header value is built once, when
/// the token is accepted, and marked sensitive.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	value: Secret,
	expires_at: OffsetDateTime,
	authorization: HeaderValue,
}
impl CachedToken {
	/// Pairs a token value with its (offset-adjusted) expiry instant.
	///
	/// Fails if the value cannot be carried in an HTTP header.
	pub fn new(
		value: impl Into<Secret>,
		expires_at: OffsetDateTime,
	) -> Result<Self, InvalidHeaderValue> {
		let value = value.into();
		let mut authorization = HeaderValue::from_str(&format!("Bearer {}", value.expose()))?;

		authorization.set_sensitive(true);

		Ok(Self { value, expires_at, authorization })
	}

	/// Bearer token value.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// `Bearer <token>` header value.
	pub fn authorization(&self) -> &HeaderValue {
		&self.authorization
	}

	/// Instant after which the token must no longer be used.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Returns `true` iff `now` is strictly before the expiry instant.
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("value", &self.value)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Holds the current token snapshot.
///
/// Snapshots are swapped wholesale, so readers never observe a value paired with another
/// token's expiry. Writers are serialized by the refresh coordinator; readers only take a
/// short read lock and never wait on a network call.
#[derive(Debug, Default)]
pub struct TokenCache(RwLock<Option<Arc<CachedToken>>>);
impl TokenCache {
	/// Returns `true` iff a token is present and `now` is before its expiry.
	pub fn is_valid(&self, now: OffsetDateTime) -> bool {
		self.valid_at(now).is_some()
	}

	/// Returns the cached token if it is still valid at `now`.
	pub fn valid_at(&self, now: OffsetDateTime) -> Option<Arc<CachedToken>> {
		self.0.read().as_ref().filter(|token| token.is_valid_at(now)).cloned()
	}

	/// Returns the current snapshot regardless of validity.
	pub fn snapshot(&self) -> Option<Arc<CachedToken>> {
		self.0.read().clone()
	}

	pub(crate) fn replace(&self, token: Arc<CachedToken>) {
		*self.0.write() = Some(token);
	}

	pub(crate) fn clear(&self) {
		*self.0.write() = None;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn token(value: &str, expires_at: OffsetDateTime) -> CachedToken {
		CachedToken::new(value, expires_at).expect("Test token should be a valid header value.")
	}

	#[test]
	fn empty_cache_is_never_valid() {
		let cache = TokenCache::default();

		assert!(!cache.is_valid(OffsetDateTime::now_utc()));
		assert!(cache.snapshot().is_none());
	}

	#[test]
	fn validity_boundary_is_exclusive() {
		let expires_at = time::macros::datetime!(2030-01-01 00:00:00 UTC);
		let cache = TokenCache::default();

		cache.replace(Arc::new(token("token", expires_at)));

		assert!(cache.is_valid(expires_at - Duration::seconds(1)));
		assert!(!cache.is_valid(expires_at));
		assert!(!cache.is_valid(expires_at + Duration::seconds(1)));
		assert!(cache.snapshot().is_some());
	}

	#[test]
	fn replace_swaps_value_and_expiry_together() {
		let first = time::macros::datetime!(2030-01-01 00:00:00 UTC);
		let second = first + Duration::hours(1);
		let cache = TokenCache::default();

		cache.replace(Arc::new(token("first", first)));
		cache.replace(Arc::new(token("second", second)));

		let current = cache.valid_at(first).expect("Second token should be valid.");

		assert_eq!(current.value().expose(), "second");
		assert_eq!(current.expires_at(), second);

		cache.clear();

		assert!(!cache.is_valid(first));
	}

	#[test]
	fn authorization_header_is_prebuilt_and_sensitive() {
		let token = token("bearer-value", OffsetDateTime::UNIX_EPOCH);

		assert_eq!(token.authorization(), "Bearer bearer-value");
		assert!(token.authorization().is_sensitive());
		assert!(!format!("{token:?}").contains("bearer-value"));
	}

	#[test]
	fn rejects_values_that_cannot_travel_in_a_header() {
		assert!(CachedToken::new("line\nbreak", OffsetDateTime::UNIX_EPOCH).is_err());
	}
}
