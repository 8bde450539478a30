// self
use relay_auth::{http::ReqwestTransport, reqwest::Client as ReqwestClient};

/// Builds a reqwest transport that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_transport() -> ReqwestTransport {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestTransport::with_client(client)
}
