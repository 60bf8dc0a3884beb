//! Endpoint set and tuning knobs consumed by a [`Session`](crate::Session).

/// Builder API for assembling session configurations.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Tokens expiring within this window are treated as already expired.
pub const DEFAULT_EXPIRY_SKEW: Duration = Duration::seconds(30);
/// Upper bound for a single HTTP request issued by the default transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(30);

const STRAVA_AUTHORIZATION: &str = "https://www.strava.com/oauth/authorize";
const STRAVA_TOKEN: &str = "https://www.strava.com/oauth/token";
const STRAVA_DEAUTHORIZATION: &str = "https://www.strava.com/oauth/deauthorize";
const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3/";

/// Endpoint set used by a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// Optional deauthorization endpoint.
	pub deauthorization: Option<Url>,
	/// Base URL that relative resource URIs are resolved against. Always ends with `/`.
	pub api_base: Url,
}

/// Immutable session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
	/// Endpoints contacted by the session.
	pub endpoints: Endpoints,
	/// Guard window subtracted from the token expiry when checking validity.
	#[serde(default = "SessionConfig::default_expiry_skew")]
	pub expiry_skew: Duration,
	/// Per-request timeout of the HTTP client built by [`Session::with_config`](crate::Session::with_config).
	#[serde(default = "SessionConfig::default_request_timeout")]
	pub request_timeout: Duration,
}
impl SessionConfig {
	/// Production endpoints with default skew and timeout.
	pub fn strava() -> Self {
		Self {
			endpoints: Endpoints {
				authorization: builtin(STRAVA_AUTHORIZATION),
				token: builtin(STRAVA_TOKEN),
				deauthorization: Some(builtin(STRAVA_DEAUTHORIZATION)),
				api_base: builtin(STRAVA_API_BASE),
			},
			expiry_skew: DEFAULT_EXPIRY_SKEW,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Creates a new builder seeded with nothing but the defaults for skew and timeout.
	pub fn builder() -> SessionConfigBuilder {
		SessionConfigBuilder::new()
	}

	/// Checks the invariants enforced by [`SessionConfigBuilder::build`].
	///
	/// Useful for configurations loaded through serde, which skips the builder.
	pub fn validate(&self) -> Result<(), SessionConfigError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if let Some(deauthorization) = self.endpoints.deauthorization.as_ref() {
			validate_endpoint("deauthorization", deauthorization)?;
		}

		validate_endpoint("api_base", &self.endpoints.api_base)?;

		let api_base = &self.endpoints.api_base;

		if api_base.cannot_be_a_base() || !api_base.path().ends_with('/') {
			return Err(SessionConfigError::InvalidApiBase { url: api_base.to_string() });
		}
		if self.expiry_skew.is_negative() {
			return Err(SessionConfigError::NegativeExpirySkew);
		}
		if !self.request_timeout.is_positive() {
			return Err(SessionConfigError::NonPositiveTimeout);
		}

		Ok(())
	}

	fn default_expiry_skew() -> Duration {
		DEFAULT_EXPIRY_SKEW
	}

	fn default_request_timeout() -> Duration {
		DEFAULT_REQUEST_TIMEOUT
	}
}
impl Default for SessionConfig {
	fn default() -> Self {
		Self::strava()
	}
}

// The constants above are compile-time literals; parsing cannot fail.
fn builtin(raw: &str) -> Url {
	Url::parse(raw).unwrap_or_else(|_| unreachable!("built-in endpoint `{raw}` is a valid URL"))
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), SessionConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(SessionConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn strava_defaults_are_valid() {
		let config = SessionConfig::strava();

		assert!(config.validate().is_ok());
		assert_eq!(config.endpoints.token.as_str(), STRAVA_TOKEN);
		assert_eq!(config.expiry_skew, Duration::seconds(30));
		assert_eq!(
			config.endpoints.api_base.join("athlete").map(|url| url.to_string()).ok().as_deref(),
			Some("https://www.strava.com/api/v3/athlete")
		);
	}

	#[test]
	fn loopback_http_is_accepted_elsewhere_rejected() {
		let local =
			Url::parse("http://127.0.0.1:8080/oauth/token").expect("Loopback URL should parse.");
		let named =
			Url::parse("http://localhost/oauth/token").expect("Localhost URL should parse.");
		let remote =
			Url::parse("http://example.com/oauth/token").expect("Remote URL should parse.");

		assert!(validate_endpoint("token", &local).is_ok());
		assert!(validate_endpoint("token", &named).is_ok());
		assert!(matches!(
			validate_endpoint("token", &remote),
			Err(SessionConfigError::InsecureEndpoint { endpoint: "token", .. })
		));
	}

	#[test]
	fn deserialized_configs_fill_defaults() {
		let config: SessionConfig = serde_json::from_str(
			r#"{"endpoints":{"authorization":"https://www.strava.com/oauth/authorize","token":"https://www.strava.com/oauth/token","deauthorization":null,"api_base":"https://www.strava.com/api/v3/"}}"#,
		)
		.expect("Config without tuning fields should deserialize.");

		assert_eq!(config.expiry_skew, DEFAULT_EXPIRY_SKEW);
		assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
		assert!(config.endpoints.deauthorization.is_none());
		assert!(config.validate().is_ok());
	}
}
