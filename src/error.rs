//! Error taxonomy shared by the token manager, the request façade, and the relay adapter.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The access token could not be obtained.
	///
	/// Shared behind an [`Arc`] because every caller waiting on the same refresh observes the
	/// identical failure.
	#[error(transparent)]
	TokenRefresh(Arc<TokenRefreshError>),
	/// The decorated payload request failed.
	#[error(transparent)]
	Request(#[from] RequestError),
}
impl From<Arc<TokenRefreshError>> for Error {
	fn from(e: Arc<TokenRefreshError>) -> Self {
		Self::TokenRefresh(e)
	}
}
impl From<TokenRefreshError> for Error {
	fn from(e: TokenRefreshError) -> Self {
		Self::TokenRefresh(Arc::new(e))
	}
}

/// Configuration and validation failures raised at construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required credential field was empty or whitespace.
	#[error("The {field} must not be empty.")]
	BlankCredential {
		/// Which credential field failed validation.
		field: &'static str,
	},
	/// The token endpoint is not an HTTP(S) URL.
	#[error("The token endpoint must use http or https: {url}.")]
	UnsupportedEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// An endpoint URL could not be parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint(#[from] url::ParseError),
	/// Refresh policy must allow at least one attempt.
	#[error("The refresh policy must allow at least one attempt.")]
	ZeroRetries,
	/// Region label is not recognized.
	#[error("Unknown relay region `{0}`.")]
	UnknownRegion(String),
	/// Outbound message could not be encoded as JSON.
	#[error("Failed to serialize the message to JSON.")]
	Serialize(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Terminal failure of a token refresh, reported once retries are exhausted or a fatal
/// response was received.
#[derive(Debug, ThisError)]
#[error("Token refresh failed after {attempts} attempt(s).")]
pub struct TokenRefreshError {
	/// Number of token endpoint calls made before giving up.
	pub attempts: u32,
	/// Failure observed on the last attempt.
	#[source]
	pub cause: RefreshCause,
}
impl TokenRefreshError {
	/// Returns the failure observed on the last attempt.
	pub fn refresh_cause(&self) -> &RefreshCause {
		&self.cause
	}
}

/// Reason a single token endpoint attempt failed.
#[derive(Debug, ThisError)]
pub enum RefreshCause {
	/// Network failure reaching the token endpoint.
	#[error("Failed to send the HTTP request for the OAuth token.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Leading part of the response body, for diagnostics.
		body: String,
	},
	/// Token endpoint body is not the expected JSON document.
	#[error("Failed to parse the JSON response for the OAuth token.")]
	MalformedResponse {
		/// Structured parsing failure including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token endpoint body carries content after the JSON document.
	#[error("OAuth token response has trailing content after the JSON document.")]
	TrailingContent {
		/// Parser failure at the first trailing character.
		#[source]
		source: serde_json::Error,
	},
	/// Response omitted `access_token`.
	#[error("OAuth token response did not contain an access token.")]
	MissingAccessToken,
	/// `access_token` cannot be carried in an `Authorization` header.
	#[error("OAuth access token contains characters that are not valid in an HTTP header.")]
	InvalidAccessToken,
	/// Response carried neither `token_expires_date_time` nor `expires_in`.
	#[error("OAuth token response is missing expiration details.")]
	MissingExpiry,
	/// `token_expires_date_time` is not an ISO-8601 instant.
	#[error("OAuth token expiry `{value}` is not a valid ISO-8601 instant.")]
	InvalidExpiry {
		/// Raw value returned by the token endpoint.
		value: String,
		/// Underlying parse failure.
		#[source]
		source: time::error::Parse,
	},
	/// Computed expiry does not fit in the supported time range.
	#[error("OAuth token expiry exceeds the supported range.")]
	ExpiryOutOfRange,
}
impl RefreshCause {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Whether another attempt may succeed.
	///
	/// Transport failures, malformed bodies, and throttling or server-side statuses are
	/// retried. Rejected credentials and responses that are well-formed but incomplete are
	/// not.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport { .. }
			| Self::MalformedResponse { .. }
			| Self::TrailingContent { .. } => true,
			Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
			Self::MissingAccessToken
			| Self::InvalidAccessToken
			| Self::MissingExpiry
			| Self::InvalidExpiry { .. }
			| Self::ExpiryOutOfRange => false,
		}
	}
}

/// Failure of a decorated payload request.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// No valid token could be ensured, so the payload was never sent.
	#[error("Failed to refresh token before sending request: {method} {uri}.")]
	TokenUnavailable {
		/// Request method.
		method: Method,
		/// Request URI.
		uri: Url,
		/// Refresh failure shared with every concurrent waiter.
		#[source]
		source: Arc<TokenRefreshError>,
	},
	/// The transport failed while dispatching the payload.
	#[error("Asynchronous request failed: {method} {uri}.")]
	Transport {
		/// Request method.
		method: Method,
		/// Request URI.
		uri: Url,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
}
impl RequestError {
	/// Returns the method of the failed request.
	pub fn method(&self) -> &Method {
		match self {
			Self::TokenUnavailable { method, .. } | Self::Transport { method, .. } => method,
		}
	}

	/// Returns the URI of the failed request.
	pub fn uri(&self) -> &Url {
		match self {
			Self::TokenUnavailable { uri, .. } | Self::Transport { uri, .. } => uri,
		}
	}

	/// Returns the token refresh failure that prevented sending, if any.
	pub fn token_refresh(&self) -> Option<&TokenRefreshError> {
		match self {
			Self::TokenUnavailable { source, .. } => Some(source.as_ref()),
			Self::Transport { .. } => None,
		}
	}
}
