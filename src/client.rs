//! Sending façade: ensure a token, decorate the request, dispatch it.
//!
//! [`OAuthClient`] never retries a payload request. Token refresh failures are retried
//! inside the [`RefreshCoordinator`]; once they surface here the payload is abandoned
//! without touching the network and the caller receives
//! [`RequestError::TokenUnavailable`].

// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials},
	error::RequestError,
	http::{self, HttpTransport, RelayRequest, RelayResponse},
	obs::{self, OperationKind},
	policy::RefreshPolicy,
	refresh::RefreshCoordinator,
};

/// Sends caller-supplied requests with a valid bearer token attached.
///
/// Clones share the transport, the token cache, and the in-flight refresh.
pub struct OAuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	coordinator: RefreshCoordinator<T>,
}
#[cfg(feature = "reqwest")]
impl OAuthClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(credentials: Credentials, policy: RefreshPolicy) -> Result<Self> {
		Self::with_transport(ReqwestTransport::default(), credentials, policy)
	}
}
impl<T> OAuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that drives both the token endpoint and payload requests through
	/// `transport`.
	pub fn with_transport(
		transport: impl Into<Arc<T>>,
		credentials: Credentials,
		policy: RefreshPolicy,
	) -> Result<Self> {
		let transport = transport.into();
		let coordinator = RefreshCoordinator::<T>::new(transport.clone(), credentials, policy)?;

		Ok(Self { transport, coordinator })
	}

	/// Token manager backing this client.
	pub fn coordinator(&self) -> &RefreshCoordinator<T> {
		&self.coordinator
	}

	/// Transport used for every call.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Returns a token that is valid now, refreshing it first if needed.
	pub async fn ensure_token(&self) -> Result<Arc<CachedToken>> {
		self.coordinator.ensure_token().await
	}

	/// Sends an authorized copy of `request` and returns the response unchanged.
	///
	/// Non-success statuses are returned as responses; only failures that produced no
	/// response become errors.
	pub async fn send(&self, request: &RelayRequest) -> Result<RelayResponse> {
		self.send_with(request, |response| response).await
	}

	/// Sends an authorized copy of `request` and passes the response to `handler`.
	pub async fn send_with<F, O>(&self, request: &RelayRequest, handler: F) -> Result<O>
	where
		F: FnOnce(RelayResponse) -> O,
	{
		let span = obs::start(OperationKind::Send, "send");
		let result = span.instrument(self.dispatch(request)).await;

		obs::finish(OperationKind::Send, &result);

		result.map(handler)
	}

	async fn dispatch(&self, request: &RelayRequest) -> Result<RelayResponse> {
		let token =
			self.coordinator.acquire().await.map_err(|source| RequestError::TokenUnavailable {
				method: request.method().clone(),
				uri: request.uri().clone(),
				source,
			})?;
		let response = self.transport.execute(http::decorate(request, &token)).await.map_err(
			|e| RequestError::Transport {
				method: request.method().clone(),
				uri: request.uri().clone(),
				source: Box::new(e),
			},
		)?;

		Ok(response)
	}
}
impl<T> Clone for OAuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), coordinator: self.coordinator.clone() }
	}
}
impl<T> Debug for OAuthClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthClient").field("coordinator", &self.coordinator).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use ::http::header::AUTHORIZATION;
	// self
	use super::*;
	use crate::{_preludet::*, error::RefreshCause};

	const TOKEN_BODY: &str = r#"{"access_token":"fresh-token","expires_in":3600}"#;

	fn client(
		transport: ScriptedTransport,
	) -> (OAuthClient<ScriptedTransport>, Arc<ScriptedTransport>) {
		let transport = Arc::new(transport);
		let client = OAuthClient::<ScriptedTransport>::with_transport(
			transport.clone(),
			test_credentials("https://auth.test/token"),
			RefreshPolicy::new().with_max_retries(1),
		)
		.expect("Test client should build.");

		(client, transport)
	}

	fn request() -> RelayRequest {
		RelayRequest::post(Url::parse("https://relay.test/v1/send").expect("Test URL should parse."))
			.with_header(AUTHORIZATION, HeaderValue::from_static("Basic stale"))
			.with_json_body(r#"{"subject":"hi"}"#)
			.with_timeout(StdDuration::from_secs(10))
	}

	#[tokio::test]
	async fn send_attaches_the_bearer_token_and_passes_the_response_through() {
		let (client, transport) =
			client(ScriptedTransport::new().reply(200, TOKEN_BODY).reply(503, "relay busy"));
		let original = request();
		let response = client.send(&original).await.expect("Send should resolve with a response.");

		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(response.text(), "relay busy");
		assert_eq!(original.headers()[AUTHORIZATION], "Basic stale");

		let sent = transport.requests();

		assert_eq!(sent.len(), 2);
		assert_eq!(sent[1].headers().get_all(AUTHORIZATION).iter().count(), 1);
		assert_eq!(sent[1].headers()[AUTHORIZATION], "Bearer fresh-token");
		assert_eq!(sent[1].body(), original.body());
		assert_eq!(sent[1].timeout(), original.timeout());
	}

	#[tokio::test]
	async fn token_failure_skips_the_payload_request() {
		let (client, transport) =
			client(ScriptedTransport::new().reply(401, r#"{"error":"invalid_client"}"#));
		let err = client.send(&request()).await.expect_err("Send should fail without a token.");

		match err {
			Error::Request(err @ RequestError::TokenUnavailable { .. }) => {
				assert_eq!(err.method(), &Method::POST);
				assert_eq!(err.uri().as_str(), "https://relay.test/v1/send");

				let refresh = err.token_refresh().expect("Refresh failure should be attached.");

				assert!(matches!(
					refresh.refresh_cause(),
					RefreshCause::Status { status: 401, .. }
				));
			},
			other => panic!("Unexpected error: {other:?}."),
		}

		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn transport_failures_are_wrapped_and_not_retried() {
		let (client, transport) =
			client(ScriptedTransport::new().reply(200, TOKEN_BODY).fail("broken pipe"));
		let err = client.send(&request()).await.expect_err("Send should surface the failure.");

		match err {
			Error::Request(err @ RequestError::Transport { .. }) => {
				assert_eq!(
					err.to_string(),
					"Asynchronous request failed: POST https://relay.test/v1/send."
				);
				assert!(err.token_refresh().is_none());
			},
			other => panic!("Unexpected error: {other:?}."),
		}

		assert_eq!(transport.calls(), 2);
	}

	#[tokio::test]
	async fn send_with_applies_the_handler_and_reuses_the_token() {
		let (client, transport) =
			client(ScriptedTransport::new().reply(200, TOKEN_BODY).reply(202, ""));
		let first = client
			.send_with(&request(), |response| response.status())
			.await
			.expect("First send should succeed.");
		let second = client
			.send_with(&request(), |response| response.status())
			.await
			.expect("Second send should succeed.");

		assert_eq!(first, StatusCode::ACCEPTED);
		assert_eq!(second, StatusCode::ACCEPTED);
		assert_eq!(transport.calls(), 3);
		assert_eq!(client.coordinator().metrics().refreshes(), 1);
	}
}
