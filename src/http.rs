//! Transport seam and the HTTP value types that cross it.
//!
//! The module exposes [`HttpTransport`] alongside the owned [`RelayRequest`] and
//! [`RelayResponse`] values so downstream crates can plug in a custom HTTP stack. The token
//! manager and the request façade never touch a concrete client; both drive the transport
//! through this trait, and [`decorate`] derives the authorized copy of a caller's request.

pub mod decorate;
pub mod request;
pub mod response;

pub use decorate::*;
pub use request::*;
pub use response::*;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<RelayResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing relay and token requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// the refresh coordinator and the request façade, and the futures they return must be
/// `Send` so refreshes can be shared across tasks. Any received response, whatever its
/// status, is returned as `Ok`; `Err` is reserved for failures that produced no response.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and buffers the full response body.
	fn execute(&self, request: RelayRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Per-request timeouts and protocol versions are forwarded to reqwest. The
/// `expect_continue` flag has no reqwest equivalent and is not transmitted.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	type TransportError = ReqwestError;

	fn execute(&self, request: RelayRequest) -> TransportFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let mut builder = self
				.0
				.request(request.method().clone(), request.uri().clone())
				.headers(request.headers().clone());

			if let Some(timeout) = request.timeout() {
				builder = builder.timeout(timeout);
			}
			if let Some(version) = request.version() {
				builder = builder.version(version);
			}
			if let Some(body) = request.body() {
				builder = builder.body(body.clone());
			}

			let response = builder.send().await?;
			let status = response.status();
			let version = response.version();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?;

			Ok(RelayResponse::new(status, headers, body).with_version(version))
		})
	}
}
