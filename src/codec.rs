//! JSON payload adapter used by the API facade.
//!
//! Decoding never panics: malformed input, a shape mismatch, or a logically empty payload all
//! come back as [`DecodeError`]. Field naming and enum conventions belong to the payload types'
//! own serde attributes.

// self
use crate::{_prelude::*, error::DecodeError};

/// Attempts to decode `body` as `T`.
///
/// An empty body or the JSON literal `null` yields [`DecodeError::NoData`], even when `T`
/// could represent null (e.g. `Option<_>`).
pub fn try_deserialize<T>(body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	if body.iter().all(u8::is_ascii_whitespace) {
		return Err(DecodeError::NoData { status: None });
	}

	let value = serde_json::from_slice::<serde_json::Value>(body)
		.map_err(|source| DecodeError::Malformed { source, status: None })?;

	if value.is_null() {
		return Err(DecodeError::NoData { status: None });
	}

	serde_path_to_error::deserialize(value)
		.map_err(|source| DecodeError::Shape { source, status: None })
}

/// Encodes a request body as JSON.
pub fn serialize<T>(value: &T) -> Result<Vec<u8>, DecodeError>
where
	T: ?Sized + Serialize,
{
	serde_json::to_vec(value).map_err(|source| DecodeError::Encode { source })
}
