//! Buffered HTTP response value.

// std
use std::borrow::Cow;
// crates.io
use bytes::Bytes;
// self
use crate::_prelude::*;

/// Fully buffered HTTP response returned by an [`HttpTransport`](crate::http::HttpTransport).
#[derive(Clone, Debug, PartialEq)]
pub struct RelayResponse {
	status: StatusCode,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
}
impl RelayResponse {
	/// Creates an HTTP/1.1 response.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
		Self { status, version: Version::HTTP_11, headers, body: body.into() }
	}

	/// Records the protocol version the response arrived with.
	pub fn with_version(mut self, version: Version) -> Self {
		self.version = version;

		self
	}

	/// HTTP status code.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Protocol version.
	pub fn version(&self) -> Version {
		self.version
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body.
	pub fn body(&self) -> &Bytes {
		&self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Leading part of the body, for error messages.
	pub(crate) fn body_preview(&self, max_chars: usize) -> String {
		self.text().chars().take(max_chars).collect()
	}
}
