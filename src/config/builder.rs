// self
use crate::{
	_prelude::*,
	config::{DEFAULT_EXPIRY_SKEW, DEFAULT_REQUEST_TIMEOUT, Endpoints, SessionConfig},
};

/// Errors raised while constructing or validating a [`SessionConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionConfigError {
	/// Authorization endpoint is required.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is required.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// API base URL is required.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// API base cannot have relative URIs resolved against it.
	#[error("The API base URL cannot be used as a base: {url}.")]
	InvalidApiBase {
		/// Offending URL.
		url: String,
	},
	/// Expiry skew must not be negative.
	#[error("Expiry skew must not be negative.")]
	NegativeExpirySkew,
	/// Request timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
}

/// Builder for [`SessionConfig`] values.
#[derive(Debug)]
pub struct SessionConfigBuilder {
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Optional deauthorization endpoint.
	pub deauthorization_endpoint: Option<Url>,
	/// Base URL for resource calls.
	pub api_base: Option<Url>,
	/// Guard window applied to token expiry.
	pub expiry_skew: Duration,
	/// Per-request timeout for the default transport.
	pub request_timeout: Duration,
}
impl SessionConfigBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self {
			authorization_endpoint: None,
			token_endpoint: None,
			deauthorization_endpoint: None,
			api_base: None,
			expiry_skew: DEFAULT_EXPIRY_SKEW,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Seeds the builder from an existing configuration.
	pub fn from_config(config: SessionConfig) -> Self {
		Self {
			authorization_endpoint: Some(config.endpoints.authorization),
			token_endpoint: Some(config.endpoints.token),
			deauthorization_endpoint: config.endpoints.deauthorization,
			api_base: Some(config.endpoints.api_base),
			expiry_skew: config.expiry_skew,
			request_timeout: config.request_timeout,
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the deauthorization endpoint.
	pub fn deauthorization_endpoint(mut self, url: Url) -> Self {
		self.deauthorization_endpoint = Some(url);

		self
	}

	/// Sets the API base URL. A missing trailing slash is added on build.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the expiry skew.
	pub fn expiry_skew(mut self, skew: Duration) -> Self {
		self.expiry_skew = skew;

		self
	}

	/// Overrides the request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SessionConfig, SessionConfigError> {
		let authorization =
			self.authorization_endpoint.ok_or(SessionConfigError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(SessionConfigError::MissingTokenEndpoint)?;
		let mut api_base = self.api_base.ok_or(SessionConfigError::MissingApiBase)?;

		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		let config = SessionConfig {
			endpoints: Endpoints {
				authorization,
				token,
				deauthorization: self.deauthorization_endpoint,
				api_base,
			},
			expiry_skew: self.expiry_skew,
			request_timeout: self.request_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for SessionConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
