//! Bearer decoration of caller-supplied requests.

// crates.io
use http::header::AUTHORIZATION;
// self
use crate::{auth::CachedToken, http::RelayRequest};

/// Returns a copy of `request` carrying `Authorization: Bearer <token>`.
///
/// Every `Authorization` value already present is dropped first, so the copy carries exactly
/// one credential. Method, URI, body, remaining headers, timeout, version, and the
/// expect-continue flag are preserved. `request` itself is left untouched.
pub fn decorate(request: &RelayRequest, token: &CachedToken) -> RelayRequest {
	let mut decorated = request.clone();
	let headers = decorated.headers_mut();

	headers.remove(AUTHORIZATION);
	headers.insert(AUTHORIZATION, token.authorization().clone());

	decorated
}
