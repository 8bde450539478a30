//! Owned, cloneable HTTP request value.

// std
use std::time::Duration as StdDuration;
// crates.io
use bytes::Bytes;
use http::header::{CONTENT_TYPE, IntoHeaderName};
// self
use crate::_prelude::*;

/// Outbound HTTP request as a plain value.
///
/// Every property the relay cares about is carried explicitly so a copy can be derived
/// without touching the original: method, URI, headers, optional body, optional timeout,
/// optional protocol version, and the expect-continue flag.
#[derive(Clone, Debug, PartialEq)]
pub struct RelayRequest {
	method: Method,
	uri: Url,
	headers: HeaderMap,
	body: Option<Bytes>,
	timeout: Option<StdDuration>,
	version: Option<Version>,
	expect_continue: bool,
}
impl RelayRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, uri: Url) -> Self {
		Self {
			method,
			uri,
			headers: HeaderMap::new(),
			body: None,
			timeout: None,
			version: None,
			expect_continue: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(uri: Url) -> Self {
		Self::new(Method::GET, uri)
	}

	/// Shorthand for a `POST` request.
	pub fn post(uri: Url) -> Self {
		Self::new(Method::POST, uri)
	}

	/// Appends a header, keeping any existing values for the same name.
	pub fn with_header<K>(mut self, name: K, value: HeaderValue) -> Self
	where
		K: IntoHeaderName,
	{
		self.headers.append(name, value);

		self
	}

	/// Sets the request body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets a JSON body together with its content type.
	pub fn with_json_body(mut self, body: impl Into<Bytes>) -> Self {
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(body.into());

		self
	}

	/// Sets a per-request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Pins the HTTP protocol version.
	pub fn with_version(mut self, version: Version) -> Self {
		self.version = Some(version);

		self
	}

	/// Requests `Expect: 100-continue` semantics from transports that support them.
	pub fn with_expect_continue(mut self, enabled: bool) -> Self {
		self.expect_continue = enabled;

		self
	}

	/// Request method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Request URI.
	pub fn uri(&self) -> &Url {
		&self.uri
	}

	/// Request headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Mutable access to the request headers.
	pub fn headers_mut(&mut self) -> &mut HeaderMap {
		&mut self.headers
	}

	/// Request body, if one was set.
	pub fn body(&self) -> Option<&Bytes> {
		self.body.as_ref()
	}

	/// Per-request timeout, if one was set.
	pub fn timeout(&self) -> Option<StdDuration> {
		self.timeout
	}

	/// Pinned protocol version, if one was set.
	pub fn version(&self) -> Option<Version> {
		self.version
	}

	/// Whether expect-continue was requested.
	pub fn expect_continue(&self) -> bool {
		self.expect_continue
	}
}
