//! OAuth 2.0 client-credentials token manager for mail-relay APIs: a shared token cache,
//! singleflight refreshes with bounded retries, and bearer decoration of outgoing requests.
//!
//! [`client::OAuthClient`] is the entry point for arbitrary requests; [`relay::RelayClient`]
//! wraps it for the relay's JSON send endpoint.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod policy;
pub mod refresh;
pub mod relay;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration as StdDuration,
	};
	// self
	use crate::{
		auth::Credentials,
		http::{HttpTransport, RelayRequest, RelayResponse, TransportFuture},
	};

	#[derive(Clone, Debug)]
	enum Step {
		Reply { status: u16, body: &'static str },
		Fail(String),
	}

	/// Transport failure produced by [`ScriptedTransport`].
	#[derive(Debug, ThisError)]
	#[error("{0}")]
	pub struct ScriptedTransportError(pub String);

	/// In-process [`HttpTransport`] that plays back a fixed script of responses.
	///
	/// Call `n` receives step `n`; once the script runs out the last step repeats. Every
	/// executed request is recorded for later inspection.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		steps: Mutex<Vec<Step>>,
		delay: Option<StdDuration>,
		calls: AtomicUsize,
		requests: Mutex<Vec<RelayRequest>>,
	}
	impl ScriptedTransport {
		/// Creates an empty script; executing it fails every call.
		pub fn new() -> Self {
			Self::default()
		}

		/// Appends a response with the given status and body.
		pub fn reply(mut self, status: u16, body: &'static str) -> Self {
			self.steps.get_mut().push(Step::Reply { status, body });

			self
		}

		/// Appends a transport failure.
		pub fn fail(mut self, message: impl Into<String>) -> Self {
			self.steps.get_mut().push(Step::Fail(message.into()));

			self
		}

		/// Delays every step, so concurrent callers overlap.
		pub fn with_delay(mut self, delay: StdDuration) -> Self {
			self.delay = Some(delay);

			self
		}

		/// Number of executed requests.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Requests executed so far, in call order.
		pub fn requests(&self) -> Vec<RelayRequest> {
			self.requests.lock().clone()
		}
	}
	impl HttpTransport for ScriptedTransport {
		type TransportError = ScriptedTransportError;

		fn execute(&self, request: RelayRequest) -> TransportFuture<'_, Self::TransportError> {
			let index = self.calls.fetch_add(1, Ordering::SeqCst);
			let step = {
				let steps = self.steps.lock();

				steps.get(index).or(steps.last()).cloned()
			};
			let delay = self.delay;

			self.requests.lock().push(request);

			Box::pin(async move {
				if let Some(delay) = delay {
					tokio::time::sleep(delay).await;
				}

				match step {
					Some(Step::Reply { status, body }) => Ok(RelayResponse::new(
						StatusCode::from_u16(status).expect("Scripted status should be valid."),
						HeaderMap::new(),
						body,
					)),
					Some(Step::Fail(message)) => Err(ScriptedTransportError(message)),
					None => Err(ScriptedTransportError("No scripted response.".into())),
				}
			})
		}
	}

	/// Builds credentials with fixed test values pointing at `token_endpoint`.
	pub fn test_credentials(token_endpoint: &str) -> Credentials {
		Credentials::new(
			"test-client",
			"test-secret",
			Url::parse(token_endpoint).expect("Test token endpoint should parse."),
		)
		.expect("Test credentials should be valid.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use http::{HeaderMap, HeaderValue, Method, StatusCode, Version};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
