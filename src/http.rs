//! Transport primitives shared by token exchanges and resource calls.
//!
//! [`ReqwestHttpClient`] is the only HTTP stack the session talks to. Token requests run
//! through the `oauth2` crate via [`InstrumentedHandle`], which records the status and
//! `Retry-After` hint of the last response in a [`ResponseMetadataSlot`] so error mapping can
//! classify failures the `oauth2` error type does not describe.

// std
use std::{ops::Deref, sync::OnceLock};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, config::DEFAULT_REQUEST_TIMEOUT, error::ConfigError, ratelimit};

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// A fresh slot is created for each token request and read right after `oauth2` resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Clients built here never follow redirects: the token endpoint answers directly, and a
/// redirected resource call would silently drop the bearer header. A caller-supplied client
/// passed to [`with_client`](Self::with_client) is used as is.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests are bounded by `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let timeout: std::time::Duration =
			timeout.try_into().map_err(ConfigError::http_client_build)?;
		let client = ReqwestClient::builder().timeout(timeout).redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Process-wide client using the default timeout.
	///
	/// Built once on first use; every session created without an explicit client shares it.
	pub fn shared() -> Result<Self, ConfigError> {
		static SHARED: OnceLock<ReqwestHttpClient> = OnceLock::new();

		if let Some(client) = SHARED.get() {
			return Ok(client.clone());
		}

		let client = Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)?;

		Ok(SHARED.get_or_init(|| client).clone())
	}

	/// Builds an instrumented handle that records response metadata in `slot`.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// [`AsyncHttpClient`] adapter over reqwest that fills a [`ResponseMetadataSlot`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = ratelimit::parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();
		let handle_side = slot.clone();

		handle_side.store(ResponseMetadata {
			status: Some(429),
			retry_after: Some(Duration::seconds(900)),
		});

		let meta = slot.take().expect("Stored metadata should be visible through clones.");

		assert_eq!(meta.status, Some(429));
		assert_eq!(meta.retry_after, Some(Duration::seconds(900)));
		assert!(slot.take().is_none());
	}

	#[test]
	fn timeouts_must_be_representable() {
		assert!(ReqwestHttpClient::with_timeout(Duration::seconds(-5)).is_err());
		assert!(ReqwestHttpClient::with_timeout(Duration::seconds(5)).is_ok());
	}
}
