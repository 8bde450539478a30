//! Fires many [`OAuthClient::send`] calls at once on a cold cache. They all share a single
//! token request and every payload goes out with the same bearer.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use relay_auth::{
	auth::Credentials,
	client::OAuthClient,
	http::{RelayRequest, ReqwestTransport},
	policy::RefreshPolicy,
	reqwest::Client,
	url::Url,
};

const SENDERS: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"shared-access\",\"expires_in\":3600}")
				.delay(Duration::from_millis(200));
		})
		.await;
	let send_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/send").header("authorization", "Bearer shared-access");
			then.status(202).body("{\"reason\":\"queued\"}");
		})
		.await;
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let credentials =
		Credentials::new("demo-client", "super-secret", Url::parse(&server.url("/v1/token"))?)?;
	let client = OAuthClient::<ReqwestTransport>::with_transport(
		transport,
		credentials,
		RefreshPolicy::default(),
	)?;
	let send_endpoint = Url::parse(&server.url("/v1/send"))?;
	let handles = (0..SENDERS)
		.map(|i| {
			let client = client.clone();
			let request = RelayRequest::post(send_endpoint.clone())
				.with_json_body(format!("{{\"subject\":\"message {i}\"}}"));

			tokio::spawn(async move { client.send(&request).await })
		})
		.collect::<Vec<_>>();

	for (i, handle) in handles.into_iter().enumerate() {
		let response = handle.await??;

		println!("Sender {i}: {} {}.", response.status(), response.text());
	}

	let metrics = client.coordinator().metrics();

	println!(
		"{SENDERS} sends used {} token refresh(es) and {} singleflight join(s).",
		metrics.refreshes(),
		metrics.joins()
	);

	token_mock.assert_calls_async(1).await;
	send_mock.assert_calls_async(SENDERS).await;

	Ok(())
}
