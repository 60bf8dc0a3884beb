// crates.io
use reqwest::{
	StatusCode,
	header::{HeaderMap, HeaderName},
};
// self
use crate::{_prelude::*, error::BoxError, error::Fault, ratelimit::RateLimitStatus};

/// Maximum number of body characters rendered by [`TransportError`]'s `Display`.
pub const BODY_PREVIEW_LIMIT: usize = 1024;

/// Coarse classification of a [`TransportError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
	/// `401 Unauthorized` on a resource call.
	InvalidLogin,
	/// `429 Too Many Requests`.
	RateLimit,
	/// Any other non-success status.
	Status,
	/// No HTTP response was received (DNS, TLS, timeout, reset).
	Network,
}
impl TransportErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidLogin => "invalid_login",
			Self::RateLimit => "rate_limit",
			Self::Status => "status",
			Self::Network => "network",
		}
	}
}

/// HTTP or network failure of a single call.
///
/// Response headers are copied when attached, so later changes to the caller's map are not
/// observed. `Display` renders the status line and at most [`BODY_PREVIEW_LIMIT`] characters
/// of the body.
pub struct TransportError {
	kind: TransportErrorKind,
	message: String,
	status: Option<u16>,
	body: Option<String>,
	headers: Option<HeaderMap>,
	fault: Option<Fault>,
	rate_limit: Option<RateLimitStatus>,
	source: Option<BoxError>,
}
impl TransportError {
	/// Creates an error of the given kind with a human-readable message.
	pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			status: None,
			body: None,
			headers: None,
			fault: None,
			rate_limit: None,
			source: None,
		}
	}

	/// Wraps a network-level failure.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		let message = format!("Network error occurred while calling the API: {src}");

		Self::new(TransportErrorKind::Network, message).with_source(src)
	}

	/// Builds the error matching a non-success HTTP status.
	pub fn from_status(status: u16) -> Self {
		let (kind, message) = match status {
			401 =>
				(TransportErrorKind::InvalidLogin, "Invalid login; the access token was rejected"),
			429 => (TransportErrorKind::RateLimit, "Rate limit exceeded"),
			_ => (TransportErrorKind::Status, "API call returned an unsuccessful status"),
		};

		Self::new(kind, message).with_status(status)
	}

	/// Records the HTTP status code.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Records the raw response body.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Stores a snapshot of the response headers.
	pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
		self.headers = Some(headers.clone());

		self
	}

	/// Attaches a structured server fault.
	pub fn with_fault(mut self, fault: Fault) -> Self {
		self.fault = Some(fault);

		self
	}

	/// Attaches rate-limit accounting parsed from the response.
	pub fn with_rate_limit(mut self, rate_limit: RateLimitStatus) -> Self {
		self.rate_limit = Some(rate_limit);

		self
	}

	/// Records the underlying cause.
	pub fn with_source(mut self, src: impl 'static + Send + Sync + StdError) -> Self {
		self.source = Some(Box::new(src));

		self
	}

	/// Failure classification.
	pub fn kind(&self) -> TransportErrorKind {
		self.kind
	}

	/// Human-readable message without the status line or body.
	pub fn message(&self) -> &str {
		&self.message
	}

	/// HTTP status code, if a response was received.
	pub fn status(&self) -> Option<u16> {
		self.status
	}

	/// Raw response body, if one was captured.
	pub fn body(&self) -> Option<&str> {
		self.body.as_deref()
	}

	/// Snapshot of the response headers.
	pub fn headers(&self) -> Option<&HeaderMap> {
		self.headers.as_ref()
	}

	/// Looks up a header value case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		let name = HeaderName::from_bytes(name.as_bytes()).ok()?;

		self.headers.as_ref()?.get(name)?.to_str().ok()
	}

	/// Structured server fault, if the body carried one.
	pub fn fault(&self) -> Option<&Fault> {
		self.fault.as_ref()
	}

	/// Rate-limit accounting, when the response advertised it.
	pub fn rate_limit(&self) -> Option<&RateLimitStatus> {
		self.rate_limit.as_ref()
	}
}
impl Debug for TransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TransportError")
			.field("kind", &self.kind)
			.field("message", &self.message)
			.field("status", &self.status)
			.field("body_len", &self.body.as_ref().map(String::len))
			.field("fault", &self.fault)
			.field("rate_limit", &self.rate_limit)
			.field("source", &self.source)
			.finish()
	}
}
impl Display for TransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.message)?;

		if let Some(status) = self.status {
			let reason = StatusCode::from_u16(status)
				.ok()
				.and_then(|code| code.canonical_reason())
				.unwrap_or("Unknown Status");

			write!(f, " (HTTP {status} {reason})")?;
		}
		if let Some(body) = self.body.as_deref().filter(|body| !body.is_empty()) {
			f.write_str(": ")?;
			write_preview(f, body)?;
		}

		Ok(())
	}
}
impl StdError for TransportError {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.source.as_ref().map(|err| err.as_ref() as &(dyn StdError + 'static))
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let status = e.status().map(|code| code.as_u16());
		let err = Self::network(e);

		match status {
			Some(code) => err.with_status(code),
			None => err,
		}
	}
}

fn write_preview(f: &mut Formatter, body: &str) -> FmtResult {
	match body.char_indices().nth(BODY_PREVIEW_LIMIT) {
		None => f.write_str(body),
		Some((cut, _)) => {
			let hidden = body[cut..].chars().count();

			write!(f, "{}… [truncated {hidden} chars]", &body[..cut])
		},
	}
}
