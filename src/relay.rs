//! Mail-relay adapter: regional endpoints, JSON sends, and lenient result parsing.

// crates.io
use http::header::ACCEPT;
use serde_json::{Map, Value};
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{Credentials, Secret},
	client::OAuthClient,
	error::ConfigError,
	http::{HttpTransport, RelayRequest, RelayResponse},
	policy::RefreshPolicy,
};

const RELAY_REFRESH_OFFSET: Duration = Duration::minutes(5);

/// Relay deployment region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
	/// United States.
	#[default]
	Us,
	/// Canada.
	Ca,
	/// Europe.
	Eu,
	/// Australia.
	Au,
}
impl Region {
	/// Every supported region.
	pub const ALL: [Self; 4] = [Self::Us, Self::Ca, Self::Eu, Self::Au];

	/// Short lowercase label, matching the serde representation.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Us => "us",
			Self::Ca => "ca",
			Self::Eu => "eu",
			Self::Au => "au",
		}
	}

	/// Relay host serving this region.
	pub const fn host(self) -> &'static str {
		match self {
			Self::Us => "mail-us.ser.proofpoint.com",
			Self::Ca => "mail-ca.ser.proofpoint.com",
			Self::Eu => "mail-eu.ser.proofpoint.com",
			Self::Au => "mail-aus.ser.proofpoint.com",
		}
	}

	/// Token endpoint of this region.
	pub fn token_endpoint(self) -> Result<Url, ConfigError> {
		self.endpoint("/v1/token")
	}

	/// Send endpoint of this region.
	pub fn send_endpoint(self) -> Result<Url, ConfigError> {
		self.endpoint("/v1/send")
	}

	fn endpoint(self, path: &str) -> Result<Url, ConfigError> {
		Ok(Url::parse(&format!("https://{}{path}", self.host()))?)
	}
}
impl Display for Region {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Region {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|region| region.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| ConfigError::UnknownRegion(s.to_owned()))
	}
}

/// Outcome of a relay send.
///
/// The body is parsed leniently: absent, `null`, or unparsable fields read as empty strings
/// and never fail the send. The status and raw body are always kept.
#[derive(Clone, Debug, PartialEq)]
pub struct SendResult {
	message_id: String,
	reason: String,
	request_id: String,
	raw_body: String,
	response: RelayResponse,
}
impl SendResult {
	/// Extracts the relay fields from a buffered response.
	pub fn from_response(response: RelayResponse) -> Self {
		let raw_body = response.text().into_owned();
		let fields = if raw_body.trim().is_empty() {
			None
		} else {
			serde_json::from_str::<Map<String, Value>>(&raw_body).ok()
		};
		let field = |name: &str| {
			fields.as_ref().and_then(|fields| fields.get(name)).map(render).unwrap_or_default()
		};

		Self {
			message_id: field("message_id"),
			reason: field("reason"),
			request_id: field("request_id"),
			raw_body,
			response,
		}
	}

	/// HTTP status returned by the relay.
	pub fn status(&self) -> StatusCode {
		self.response.status()
	}

	/// Whether the relay answered with a 2xx status.
	pub fn is_success(&self) -> bool {
		self.status().is_success()
	}

	/// Relay-assigned message identifier, or `""`.
	pub fn message_id(&self) -> &str {
		&self.message_id
	}

	/// Human-readable status reason, or `""`.
	pub fn reason(&self) -> &str {
		&self.reason
	}

	/// Relay request identifier, or `""`.
	pub fn request_id(&self) -> &str {
		&self.request_id
	}

	/// Response body as received, decoded lossily.
	pub fn raw_body(&self) -> &str {
		&self.raw_body
	}

	/// Full buffered response.
	pub fn response(&self) -> &RelayResponse {
		&self.response
	}

	/// Consumes the result, returning the buffered response.
	pub fn into_response(self) -> RelayResponse {
		self.response
	}
}

fn render(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Sends JSON messages to the relay with an OAuth-managed bearer token.
///
/// Uses an empty scope and refreshes tokens five minutes before the relay reports expiry.
pub struct RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	client: OAuthClient<T>,
	send_endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl RelayClient<ReqwestTransport> {
	/// Creates a client for `region` backed by a default reqwest transport.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		region: Region,
	) -> Result<Self> {
		Self::with_transport(ReqwestTransport::default(), client_id, client_secret, region)
	}
}
impl<T> RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client for `region` using a custom transport.
	pub fn with_transport(
		transport: impl Into<Arc<T>>,
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		region: Region,
	) -> Result<Self> {
		let credentials = Credentials::for_region(region, client_id, client_secret)?;

		Self::with_endpoints(transport, credentials, region.send_endpoint()?)
	}

	/// Creates a client with explicit token and send endpoints.
	pub fn with_endpoints(
		transport: impl Into<Arc<T>>,
		credentials: Credentials,
		send_endpoint: Url,
	) -> Result<Self> {
		let policy = RefreshPolicy::new().with_refresh_offset(RELAY_REFRESH_OFFSET);
		let client = OAuthClient::<T>::with_transport(transport, credentials, policy)?;

		Ok(Self { client, send_endpoint })
	}

	/// Underlying request façade, for calls outside the send endpoint.
	pub fn client(&self) -> &OAuthClient<T> {
		&self.client
	}

	/// Endpoint messages are posted to.
	pub fn send_endpoint(&self) -> &Url {
		&self.send_endpoint
	}

	/// Serializes `message` as JSON and posts it to the send endpoint.
	///
	/// Any response, whatever its status, resolves to a [`SendResult`].
	pub async fn send<M>(&self, message: &M) -> Result<SendResult>
	where
		M: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(message).map_err(ConfigError::Serialize)?;
		let request = RelayRequest::post(self.send_endpoint.clone())
			.with_header(ACCEPT, HeaderValue::from_static("application/json"))
			.with_json_body(body);

		self.client.send_with(&request, SendResult::from_response).await
	}
}
impl<T> Clone for RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone(), send_endpoint: self.send_endpoint.clone() }
	}
}
impl<T> Debug for RelayClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RelayClient")
			.field("client", &self.client)
			.field("send_endpoint", &self.send_endpoint.as_str())
			.finish()
	}
}
