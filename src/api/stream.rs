// crates.io
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{Response, header::HeaderMap};
// self
use crate::{_prelude::*, error::TransportError};

/// Successful response whose body is read by the caller.
///
/// The status has already been classified as a success. The body is pulled either chunk by
/// chunk with [`chunk`](Self::chunk) or as a [`Stream`] via
/// [`into_stream`](Self::into_stream). Dropping the value closes the connection.
pub struct ResponseStream {
	response: Response,
}
impl ResponseStream {
	pub(crate) fn new(response: Response) -> Self {
		Self { response }
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.response.status().as_u16()
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		self.response.headers()
	}

	/// Body length advertised by the server, if any.
	pub fn content_length(&self) -> Option<u64> {
		self.response.content_length()
	}

	/// Reads the next body chunk; `None` marks the end of the body.
	pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
		let status = self.status();

		self.response
			.chunk()
			.await
			.map_err(|err| TransportError::from(err).with_status(status).into())
	}

	/// Converts the body into a stream of chunks.
	pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send {
		let status = self.status();

		self.response.bytes_stream().map(move |chunk| {
			chunk.map_err(|err| Error::from(TransportError::from(err).with_status(status)))
		})
	}

	/// Gives up the wrapper and returns the underlying reqwest response.
	pub fn into_response(self) -> Response {
		self.response
	}
}
impl Debug for ResponseStream {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResponseStream")
			.field("status", &self.status())
			.field("content_length", &self.content_length())
			.finish()
	}
}
