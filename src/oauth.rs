//! Client-credentials exchange against the relay's token endpoint.
//!
//! The relay's token endpoint does not follow RFC 6749 to the letter: it may report expiry
//! as an absolute `token_expires_date_time` instead of `expires_in`, and it omits
//! `token_type`. This module therefore builds the form request and parses the response
//! itself rather than going through a generic OAuth client.

// crates.io
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials},
	error::RefreshCause,
	http::{HttpTransport, RelayRequest, RelayResponse},
};

const BODY_PREVIEW_CHARS: usize = 256;
const USER_AGENT_VALUE: &str = concat!("relay-auth/", env!("CARGO_PKG_VERSION"));

/// Token endpoint response document.
///
/// Every field is optional at the JSON level so that absent fields surface as dedicated
/// [`RefreshCause`] variants instead of generic parse errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
	/// Issued bearer token.
	pub access_token: Option<String>,
	/// Absolute ISO-8601 expiry instant.
	pub token_expires_date_time: Option<String>,
	/// Lifetime in seconds, relative to receipt.
	pub expires_in: Option<i64>,
}
impl TokenResponse {
	/// Parses a response body, reporting the JSON path of any type mismatch.
	pub fn from_slice(body: &[u8]) -> Result<Self, RefreshCause> {
		let mut de = serde_json::Deserializer::from_slice(body);
		let response = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| RefreshCause::MalformedResponse { source })?;

		de.end().map_err(|source| RefreshCause::TrailingContent { source })?;

		Ok(response)
	}

	/// Converts the response into a cache snapshot.
	///
	/// The server expiry is taken from `token_expires_date_time` when present, otherwise
	/// from `now + expires_in`; `refresh_offset` is then subtracted from it.
	pub fn into_cached_token(
		self,
		now: OffsetDateTime,
		refresh_offset: Duration,
	) -> Result<CachedToken, RefreshCause> {
		let access_token = self.access_token.ok_or(RefreshCause::MissingAccessToken)?;
		let server_expiry = match (self.token_expires_date_time, self.expires_in) {
			(Some(raw), _) => OffsetDateTime::parse(&raw, &Rfc3339)
				.map_err(|source| RefreshCause::InvalidExpiry { value: raw.clone(), source })?,
			(None, Some(seconds)) => now
				.checked_add(Duration::seconds(seconds))
				.ok_or(RefreshCause::ExpiryOutOfRange)?,
			(None, None) => return Err(RefreshCause::MissingExpiry),
		};
		let expires_at =
			server_expiry.checked_sub(refresh_offset).ok_or(RefreshCause::ExpiryOutOfRange)?;

		CachedToken::new(access_token, expires_at).map_err(|_| RefreshCause::InvalidAccessToken)
	}
}

/// Performs one token endpoint call and parses the outcome.
pub(crate) async fn request_token<T>(
	transport: &T,
	credentials: &Credentials,
	refresh_offset: Duration,
) -> Result<CachedToken, RefreshCause>
where
	T: ?Sized + HttpTransport,
{
	let response =
		transport.execute(token_request(credentials)).await.map_err(RefreshCause::transport)?;

	parse_token_response(&response, OffsetDateTime::now_utc(), refresh_offset)
}

/// Builds the form-encoded `client_credentials` request.
///
/// The body carries the client secret; never log the returned value.
pub(crate) fn token_request(credentials: &Credentials) -> RelayRequest {
	let form = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("grant_type", "client_credentials")
		.append_pair("client_id", credentials.client_id())
		.append_pair("client_secret", credentials.client_secret().expose())
		.append_pair("scope", credentials.scope())
		.finish();

	RelayRequest::post(credentials.token_endpoint().clone())
		.with_header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
		.with_header(ACCEPT, HeaderValue::from_static("application/json"))
		.with_header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
		.with_body(form)
}

fn parse_token_response(
	response: &RelayResponse,
	now: OffsetDateTime,
	refresh_offset: Duration,
) -> Result<CachedToken, RefreshCause> {
	if !response.status().is_success() {
		return Err(RefreshCause::Status {
			status: response.status().as_u16(),
			body: response.body_preview(BODY_PREVIEW_CHARS),
		});
	}

	TokenResponse::from_slice(response.body())?.into_cached_token(now, refresh_offset)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const NOW: OffsetDateTime = datetime!(2030-06-01 12:00:00 UTC);

	fn ok(body: &'static str) -> RelayResponse {
		RelayResponse::new(StatusCode::OK, HeaderMap::new(), body)
	}

	fn credentials() -> Credentials {
		Credentials::new(
			"client id",
			"s3cr3t&more",
			Url::parse("https://auth.example.com/v1/token").expect("Test URL should parse."),
		)
		.expect("Test credentials should build.")
	}

	#[test]
	fn relative_expiry_subtracts_the_offset() {
		let token = parse_token_response(
			&ok(r#"{"access_token":"abc","expires_in":3600}"#),
			NOW,
			Duration::seconds(300),
		)
		.expect("Relative expiry should parse.");

		assert_eq!(token.value().expose(), "abc");
		assert_eq!(token.expires_at(), NOW + Duration::seconds(3300));
	}

	#[test]
	fn absolute_expiry_subtracts_the_offset() {
		let token = parse_token_response(
			&ok(r#"{"access_token":"abc","token_expires_date_time":"2030-06-01T13:00:00Z"}"#),
			NOW,
			Duration::seconds(300),
		)
		.expect("Absolute expiry should parse.");

		assert_eq!(token.expires_at(), datetime!(2030-06-01 12:55:00 UTC));
	}

	#[test]
	fn absolute_expiry_wins_when_both_fields_are_present() {
		let token = parse_token_response(
			&ok(
				r#"{"access_token":"abc","expires_in":10,"token_expires_date_time":"2030-06-01T13:00:00.000Z"}"#,
			),
			NOW,
			Duration::ZERO,
		)
		.expect("Both expiry fields should parse.");

		assert_eq!(token.expires_at(), datetime!(2030-06-01 13:00:00 UTC));
	}

	#[test]
	fn missing_fields_map_to_dedicated_causes() {
		let err = parse_token_response(&ok(r#"{"expires_in":3600}"#), NOW, Duration::ZERO)
			.expect_err("Missing access tokens should fail.");

		assert!(matches!(err, RefreshCause::MissingAccessToken));

		let err = parse_token_response(&ok(r#"{"access_token":"abc"}"#), NOW, Duration::ZERO)
			.expect_err("Missing expiry should fail.");

		assert!(matches!(err, RefreshCause::MissingExpiry));
		assert!(!err.is_retryable());
	}

	#[test]
	fn malformed_documents_report_parse_failures() {
		let err = parse_token_response(&ok("not json"), NOW, Duration::ZERO)
			.expect_err("Non-JSON bodies should fail.");

		assert!(matches!(err, RefreshCause::MalformedResponse { .. }));

		let err = parse_token_response(
			&ok(r#"{"access_token":"abc","expires_in":"soon"}"#),
			NOW,
			Duration::ZERO,
		)
		.expect_err("Mistyped fields should fail.");

		match err {
			RefreshCause::MalformedResponse { source } =>
				assert_eq!(source.path().to_string(), "expires_in"),
			other => panic!("Unexpected cause: {other:?}."),
		}

		let err = parse_token_response(
			&ok(r#"{"access_token":"abc","token_expires_date_time":"tomorrow"}"#),
			NOW,
			Duration::ZERO,
		)
		.expect_err("Unparsable instants should fail.");

		assert!(matches!(err, RefreshCause::InvalidExpiry { ref value, .. } if value == "tomorrow"));
	}

	#[test]
	fn trailing_content_after_the_document_is_rejected() {
		let err = parse_token_response(
			&ok(r#"{"access_token":"a","expires_in":3600} <html>oops</html>"#),
			NOW,
			Duration::ZERO,
		)
		.expect_err("Bodies with trailing markup should fail.");

		assert!(matches!(err, RefreshCause::TrailingContent { .. }));
		assert!(err.is_retryable());

		parse_token_response(
			&ok("{\"access_token\":\"a\",\"expires_in\":3600}\n"),
			NOW,
			Duration::ZERO,
		)
		.expect("Trailing whitespace should be accepted.");
	}

	#[test]
	fn non_success_status_keeps_a_body_preview() {
		let response = RelayResponse::new(
			StatusCode::UNAUTHORIZED,
			HeaderMap::new(),
			r#"{"error":"invalid_client"}"#,
		);
		let err = parse_token_response(&response, NOW, Duration::ZERO)
			.expect_err("Unauthorized responses should fail.");

		match err {
			RefreshCause::Status { status, body } => {
				assert_eq!(status, 401);
				assert!(body.contains("invalid_client"));
			},
			other => panic!("Unexpected cause: {other:?}."),
		}
	}

	#[test]
	fn token_request_is_form_encoded() {
		let request = token_request(&credentials().with_scope("relay send"));
		let body = request.body().expect("Token requests should carry a body.");

		assert_eq!(request.method(), &Method::POST);
		assert_eq!(request.uri().as_str(), "https://auth.example.com/v1/token");
		assert_eq!(request.headers()[CONTENT_TYPE], "application/x-www-form-urlencoded");
		assert_eq!(
			body.as_ref(),
			b"grant_type=client_credentials&client_id=client+id&client_secret=s3cr3t%26more&scope=relay+send"
		);
	}
}
