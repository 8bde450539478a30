//! OAuth 2.0 client credentials for the token endpoint.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError, relay::Region};

/// Immutable client-credentials configuration supplied at construction.
///
/// `Debug` never prints the client secret.
#[derive(Clone)]
pub struct Credentials {
	client_id: String,
	client_secret: Secret,
	token_endpoint: Url,
	scope: String,
}
impl Credentials {
	/// Validates and builds credentials with an empty scope.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
		token_endpoint: Url,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();
		let client_secret = client_secret.into();

		if client_id.trim().is_empty() {
			return Err(ConfigError::BlankCredential { field: "client ID" });
		}
		if client_secret.is_blank() {
			return Err(ConfigError::BlankCredential { field: "client secret" });
		}
		if !matches!(token_endpoint.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedEndpoint { url: token_endpoint.to_string() });
		}

		Ok(Self { client_id, client_secret, token_endpoint, scope: String::new() })
	}

	/// Builds credentials targeting the token endpoint of a relay region.
	pub fn for_region(
		region: Region,
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
	) -> Result<Self, ConfigError> {
		Self::new(client_id, client_secret, region.token_endpoint()?)
	}

	/// Sets the scope requested with every token call.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// OAuth client secret.
	pub fn client_secret(&self) -> &Secret {
		&self.client_secret
	}

	/// Token endpoint URL.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Requested scope, possibly empty.
	pub fn scope(&self) -> &str {
		&self.scope
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("scope", &self.scope)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint(value: &str) -> Url {
		Url::parse(value).expect("Test endpoint should parse.")
	}

	#[test]
	fn rejects_blank_fields_and_foreign_schemes() {
		let err = Credentials::new(" ", "secret", endpoint("https://auth.example.com/token"))
			.expect_err("Blank client IDs should be rejected.");

		assert!(matches!(err, ConfigError::BlankCredential { field: "client ID" }));

		let err = Credentials::new("client", "", endpoint("https://auth.example.com/token"))
			.expect_err("Blank client secrets should be rejected.");

		assert!(matches!(err, ConfigError::BlankCredential { field: "client secret" }));

		let err = Credentials::new("client", "secret", endpoint("ftp://auth.example.com/token"))
			.expect_err("Non-HTTP token endpoints should be rejected.");

		assert!(matches!(err, ConfigError::UnsupportedEndpoint { .. }));
	}

	#[test]
	fn debug_output_redacts_the_secret() {
		let credentials =
			Credentials::new("client", "hunter2", endpoint("https://auth.example.com/token"))
				.expect("Credentials should build.")
				.with_scope("relay.send");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("client"));
		assert!(rendered.contains("relay.send"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn region_credentials_point_at_the_region_token_endpoint() {
		let credentials = Credentials::for_region(Region::Eu, "client", "secret")
			.expect("Region credentials should build.");

		assert_eq!(
			credentials.token_endpoint().as_str(),
			"https://mail-eu.ser.proofpoint.com/v1/token"
		);
		assert_eq!(credentials.scope(), "");
	}
}
