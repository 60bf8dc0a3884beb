//! Session-level error types shared by the token endpoint, the API facade, and the codec.

mod transport;

pub use transport::*;

// self
use crate::{_prelude::*, config::SessionConfigError};

/// Session-wide result type alias returning [`Error`] by default.
///
/// Exactly one of the data or the error is present; success is `Ok`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by every public operation.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (missing client credentials, invalid URLs).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The token endpoint rejected the exchange or answered with something unusable.
	#[error("Authentication failed: {message}.")]
	Auth {
		/// Human-readable summary of the failure.
		message: String,
		/// HTTP status returned by the token endpoint, when one was received.
		status: Option<u16>,
		/// `Retry-After` hint sent with the rejection, e.g. on a throttled token request.
		retry_after: Option<Duration>,
		/// Structured fault reported by the server, if the body could be parsed.
		fault: Option<Fault>,
		/// Underlying parse or client failure.
		#[source]
		source: Option<BoxError>,
	},
	/// HTTP-level or network-level failure of a call.
	#[error("{0}")]
	Transport(
		#[from]
		#[source]
		TransportError,
	),
	/// Response payload could not be turned into the expected type.
	#[error(transparent)]
	Decode(#[from] DecodeError),
}
impl Error {
	pub(crate) fn auth(message: impl Into<String>) -> Self {
		Self::Auth {
			message: message.into(),
			status: None,
			retry_after: None,
			fault: None,
			source: None,
		}
	}

	/// Classifies the error into the session's failure taxonomy.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Config,
			Self::Auth { .. } => ErrorKind::Authentication,
			Self::Transport(err) => match err.kind() {
				TransportErrorKind::InvalidLogin => ErrorKind::InvalidLogin,
				TransportErrorKind::RateLimit => ErrorKind::RateLimit,
				TransportErrorKind::Status => ErrorKind::Http,
				TransportErrorKind::Network => ErrorKind::Transport,
			},
			Self::Decode(_) => ErrorKind::Decode,
		}
	}

	/// HTTP status associated with the failure, if any response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Auth { status, .. } => *status,
			Self::Transport(err) => err.status(),
			Self::Decode(err) => err.status(),
			Self::Config(_) => None,
		}
	}

	/// How long the server asked the caller to wait before trying again.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Auth { retry_after, .. } => *retry_after,
			Self::Transport(err) => err.rate_limit().and_then(|rate_limit| rate_limit.retry_after),
			_ => None,
		}
	}

	/// Structured server fault, if the failing response carried one.
	pub fn fault(&self) -> Option<&Fault> {
		match self {
			Self::Auth { fault, .. } => fault.as_ref(),
			Self::Transport(err) => err.fault(),
			_ => None,
		}
	}

	/// Returns the wrapped [`TransportError`] for HTTP and network failures.
	pub fn transport(&self) -> Option<&TransportError> {
		match self {
			Self::Transport(err) => Some(err),
			_ => None,
		}
	}
}

/// Failure taxonomy exposed through [`Error::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Local configuration is unusable.
	Config,
	/// Refresh or code exchange was rejected or malformed.
	Authentication,
	/// Resource call answered `401 Unauthorized`.
	InvalidLogin,
	/// Resource call answered `429 Too Many Requests`.
	RateLimit,
	/// Resource call answered with another non-success status.
	Http,
	/// DNS, TLS, timeout, or connection failure.
	Transport,
	/// Response body missing, logically null, or not of the expected shape.
	Decode,
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Session configuration violates an invariant.
	#[error(transparent)]
	InvalidConfig(#[from] SessionConfigError),
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint URL could not be used by the OAuth client.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Resource URI could not be resolved against the API base.
	#[error("Resource URI `{uri}` cannot be resolved.")]
	InvalidUri {
		/// Caller-supplied URI.
		uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Credentials carry an empty client identifier.
	#[error("Client identifier is missing.")]
	MissingClientId,
	/// Credentials carry an empty client secret.
	#[error("Client secret is missing.")]
	MissingClientSecret,
	/// Session configuration has no deauthorization endpoint.
	#[error("No deauthorization endpoint is configured.")]
	MissingDeauthorizationEndpoint,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Payload encoding and decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was empty or the JSON literal `null`.
	#[error("Response contained no data.")]
	NoData {
		/// HTTP status of the response, when known.
		status: Option<u16>,
	},
	/// Body is not valid JSON.
	#[error("Response body is not valid JSON.")]
	Malformed {
		/// Parser failure.
		#[source]
		source: serde_json::Error,
		/// HTTP status of the response, when known.
		status: Option<u16>,
	},
	/// Body is valid JSON but does not match the expected type.
	#[error("Response body could not be deserialized at `{path}`.", path = .source.path())]
	Shape {
		/// Structured deserialization failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the response, when known.
		status: Option<u16>,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Encode {
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl DecodeError {
	/// HTTP status of the response that failed to decode.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::NoData { status } | Self::Malformed { status, .. } | Self::Shape { status, .. } =>
				*status,
			Self::Encode { .. } => None,
		}
	}

	pub(crate) fn with_status(mut self, code: u16) -> Self {
		match &mut self {
			Self::NoData { status } | Self::Malformed { status, .. } | Self::Shape { status, .. } =>
				*status = Some(code),
			Self::Encode { .. } => {},
		}

		self
	}
}

/// Structured fault body returned by the API on failures.
///
/// ```json
/// { "message": "Bad Request", "errors": [{ "resource": "Application", "field": "client_id", "code": "invalid" }] }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
	/// Top-level message.
	pub message: String,
	/// Individual violations.
	#[serde(default)]
	pub errors: Vec<FaultDetail>,
}
impl Display for Fault {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.message)?;

		for (idx, detail) in self.errors.iter().enumerate() {
			f.write_str(if idx == 0 { ": " } else { ", " })?;
			write!(f, "{detail}")?;
		}

		Ok(())
	}
}
impl oauth2::ErrorResponse for Fault {}

/// One violation listed inside a [`Fault`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultDetail {
	/// Resource the violation refers to.
	pub resource: String,
	/// Offending field.
	pub field: String,
	/// Machine-readable violation code.
	pub code: String,
}
impl Display for FaultDetail {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}.{} {}", self.resource, self.field, self.code)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fault_renders_every_violation() {
		let fault: Fault = serde_json::from_str(
			r#"{"message":"Bad Request","errors":[{"resource":"Application","field":"client_id","code":"invalid"},{"resource":"RefreshToken","field":"refresh_token","code":"invalid"}]}"#,
		)
		.expect("Fault fixture should deserialize.");

		assert_eq!(fault.errors.len(), 2);
		assert_eq!(
			fault.to_string(),
			"Bad Request: Application.client_id invalid, RefreshToken.refresh_token invalid"
		);
	}

	#[test]
	fn fault_requires_a_message() {
		assert!(serde_json::from_str::<Fault>(r#"{"error":"invalid_grant"}"#).is_err());
	}

	#[test]
	fn kinds_follow_transport_classification() {
		let rate = Error::from(
			TransportError::new(TransportErrorKind::RateLimit, "Rate limit exceeded").with_status(429),
		);
		let login = Error::from(
			TransportError::new(TransportErrorKind::InvalidLogin, "Invalid login").with_status(401),
		);

		assert_eq!(rate.kind(), ErrorKind::RateLimit);
		assert_eq!(rate.status(), Some(429));
		assert_eq!(login.kind(), ErrorKind::InvalidLogin);
		assert_eq!(Error::from(ConfigError::MissingClientId).kind(), ErrorKind::Config);
		assert_eq!(Error::auth("refresh rejected").kind(), ErrorKind::Authentication);
	}

	#[test]
	fn transport_error_is_the_recorded_cause() {
		let err = Error::from(
			TransportError::new(TransportErrorKind::RateLimit, "Rate limit exceeded").with_status(429),
		);
		let cause = StdError::source(&err).expect("Transport errors should expose a cause.");

		assert!(cause.to_string().contains("HTTP 429"));
	}
}
