//! Resource-call facade bound to a [`Session`](crate::Session).
//!
//! Every call follows the same pipeline:
//!
//! 1. Resolve the URI against the configured API base (absolute URIs are used as is).
//! 2. Refresh first when the session is not authenticated; a failed refresh is returned without
//!    sending the request.
//! 3. Attach the bearer token captured for this attempt and send.
//! 4. Classify the response: 2xx is decoded, `401` is an invalid login, `429` is a rate limit,
//!    anything else is a status failure carrying the body and headers.
//!
//! A call refreshes at most once. When no pre-flight refresh happened, a `401` triggers one
//! refresh followed by one retry; a second `401` is returned to the caller.

mod stream;

pub use stream::*;

// crates.io
use reqwest::{
	Method, Response, StatusCode,
	header::{ACCEPT, CONTENT_TYPE, HeaderMap},
};
// self
use crate::{
	_prelude::*,
	codec,
	error::{ConfigError, Fault, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	ratelimit::RateLimitStatus,
	session::SessionState,
};

const JSON: &str = "application/json";

/// Typed access to the resource API.
///
/// Obtained from [`Session::api`](crate::Session::api); clones share the session state.
#[derive(Clone)]
pub struct Api {
	state: Arc<SessionState>,
}
impl Api {
	pub(crate) fn new(state: Arc<SessionState>) -> Self {
		Self { state }
	}

	/// `GET`s `uri` and decodes the JSON response as `T`.
	pub async fn get_result<T>(&self, uri: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		observe("get_result", async {
			let response = self.send(Method::GET, uri, None).await?;

			decode(response).await
		})
		.await
	}

	/// `PUT`s `body` as JSON to `uri` and decodes the response as `T`.
	pub async fn put_result<B, T>(&self, uri: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		observe("put_result", async {
			let payload = codec::serialize(body)?;
			let response = self.send(Method::PUT, uri, Some(payload)).await?;

			decode(response).await
		})
		.await
	}

	/// `POST`s `body` as JSON to `uri` and decodes the response as `T`.
	pub async fn post_result<B, T>(&self, uri: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		observe("post_result", async {
			let payload = codec::serialize(body)?;
			let response = self.send(Method::POST, uri, Some(payload)).await?;

			decode(response).await
		})
		.await
	}

	/// `DELETE`s `uri`, discarding any response body.
	pub async fn delete(&self, uri: &str) -> Result<()> {
		observe("delete", async {
			self.send(Method::DELETE, uri, None).await?;

			Ok(())
		})
		.await
	}

	/// `GET`s `uri` and hands the undecoded body to the caller.
	///
	/// The returned stream owns the connection; dropping it closes the response.
	pub async fn get_stream(&self, uri: &str) -> Result<ResponseStream> {
		observe("get_stream", async {
			let response = self.send(Method::GET, uri, None).await?;

			Ok(ResponseStream::new(response))
		})
		.await
	}

	fn resolve(&self, uri: &str) -> Result<Url> {
		let resolved = match Url::parse(uri) {
			Ok(absolute) => Ok(absolute),
			Err(url::ParseError::RelativeUrlWithoutBase) =>
				self.state.config.endpoints.api_base.join(uri.trim_start_matches('/')),
			Err(err) => Err(err),
		};

		resolved.map_err(|source| ConfigError::InvalidUri { uri: uri.to_owned(), source }.into())
	}

	async fn send(&self, method: Method, uri: &str, body: Option<Vec<u8>>) -> Result<Response> {
		let url = self.resolve(uri)?;
		let mut refreshed = false;

		if !self.state.is_authenticated_at(OffsetDateTime::now_utc()) {
			self.state.refresh().await?;

			refreshed = true;
		}

		loop {
			let credentials = self.state.credentials();
			let mut request = self
				.state
				.http_client
				.request(method.clone(), url.clone())
				.bearer_auth(credentials.access_token().expose())
				.header(ACCEPT, JSON);

			if let Some(payload) = &body {
				request = request.header(CONTENT_TYPE, JSON).body(payload.clone());
			}

			let response = request.send().await.map_err(TransportError::from)?;
			let status = response.status();

			obs::record_response_status(status.as_u16());

			if let Some(rate_limit) = RateLimitStatus::from_headers(response.headers()) {
				obs::record_rate_limit(&rate_limit);
			}

			if status.is_success() {
				return Ok(response);
			}

			let failure = read_failure(response).await;

			if status == StatusCode::UNAUTHORIZED && !refreshed {
				refreshed = true;

				#[cfg(feature = "tracing")]
				tracing::debug!(%url, "access token rejected; refreshing once before retrying");

				if self.state.refresh().await.is_ok() {
					continue;
				}
			}

			return Err(failure.into());
		}
	}
}
impl Debug for Api {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Api").field("api_base", &self.state.config.endpoints.api_base).finish()
	}
}

/// Builds the classified error for a non-success response.
fn status_error(status: u16, headers: &HeaderMap, body: String) -> TransportError {
	let mut err = status_failure(status, headers);

	if let Ok(fault) = serde_json::from_str::<Fault>(&body) {
		err = err.with_fault(fault);
	}

	err.with_body(body)
}

/// Drains a non-success response into its classified error.
///
/// A body that cannot be read becomes the error's source; status and headers are kept.
pub(crate) async fn read_failure(response: Response) -> TransportError {
	let status = response.status().as_u16();
	let headers = response.headers().clone();

	match response.text().await {
		Ok(body) => status_error(status, &headers, body),
		Err(err) => {
			#[cfg(feature = "tracing")]
			tracing::debug!(status, error = %err, "failed to read the error response body");

			status_failure(status, &headers).with_source(err)
		},
	}
}

fn status_failure(status: u16, headers: &HeaderMap) -> TransportError {
	let err = TransportError::from_status(status).with_headers(headers);

	match RateLimitStatus::from_headers(headers) {
		Some(rate_limit) => err.with_rate_limit(rate_limit),
		None => err,
	}
}

async fn decode<T>(response: Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status().as_u16();
	let body = response.bytes().await.map_err(|err| TransportError::from(err).with_status(status))?;

	codec::try_deserialize(&body).map_err(|err| err.with_status(status).into())
}

async fn observe<T, F>(stage: &'static str, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	const KIND: CallKind = CallKind::Api;

	let span = CallSpan::new(KIND, stage);

	obs::record_call_outcome(KIND, CallOutcome::Attempt);

	let result = span.instrument(fut).await;

	span.finish(&result);

	result
}
