//! Sends one JSON message through [`RelayClient`] against a local mock relay and prints the
//! parsed [`SendResult`](relay_auth::relay::SendResult).

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use relay_auth::{
	auth::Credentials,
	http::ReqwestTransport,
	relay::RelayClient,
	reqwest::Client,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":3600}");
		})
		.await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/send").header("authorization", "Bearer demo-access");
			then.status(202)
				.header("content-type", "application/json")
				.body("{\"message_id\":\"m-42\",\"reason\":\"queued\",\"request_id\":\"r-7\"}");
		})
		.await;
	// `RelayClient::new(id, secret, Region::Us)` targets the hosted relay instead.
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let credentials =
		Credentials::new("demo-client", "super-secret", Url::parse(&server.url("/v1/token"))?)?;
	let relay = RelayClient::<ReqwestTransport>::with_endpoints(
		transport,
		credentials,
		Url::parse(&server.url("/v1/send"))?,
	)?;
	let result = relay
		.send(&json!({
			"from": { "email": "noreply@example.com" },
			"headers": { "from": "Relay Demo <noreply@example.com>" },
			"subject": "Hello from relay-auth",
			"tos": [{ "email": "ops@example.com" }],
			"content": [{ "body": "It works.", "type": "text/plain" }],
		}))
		.await?;

	println!(
		"Relay answered {}: message_id={}, reason={}, request_id={}.",
		result.status(),
		result.message_id(),
		result.reason(),
		result.request_id()
	);

	token_mock.assert_async().await;
	send_mock.assert_async().await;

	Ok(())
}
