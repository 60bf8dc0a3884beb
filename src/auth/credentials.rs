//! The credential record held by a session.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Client registration plus the current token state.
///
/// The identity fields (`client_id`, `client_secret`) are fixed at construction. Token state
/// is never edited in place: [`Credentials::with_tokens`] returns a new record, and a
/// [`Session`](crate::Session) swaps the whole record once a refresh succeeds, so readers never
/// observe a token paired with the wrong expiry.
///
/// The record is serializable so applications can persist it between runs; the crate itself
/// keeps it only in memory.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
	client_id: String,
	client_secret: TokenSecret,
	#[serde(default)]
	access_token: TokenSecret,
	#[serde(default)]
	refresh_token: TokenSecret,
	#[serde(default = "Credentials::never", with = "time::serde::timestamp")]
	expires_at: OffsetDateTime,
	#[serde(default)]
	resource_owner_id: u64,
}
impl Credentials {
	/// Creates an unauthenticated record for a client registration.
	///
	/// Empty values are accepted here; they are rejected when a token request is attempted.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			access_token: TokenSecret::default(),
			refresh_token: TokenSecret::default(),
			expires_at: Self::never(),
			resource_owner_id: 0,
		}
	}

	/// Sets the refresh token used to bootstrap a session from stored state.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = TokenSecret::new(refresh_token);

		self
	}

	/// Sets the resource owner (athlete) identifier.
	pub fn with_resource_owner_id(mut self, id: u64) -> Self {
		self.resource_owner_id = id;

		self
	}

	/// Returns a new record that keeps this record's identity fields and resource owner but
	/// carries the given token triple. The receiver is left untouched.
	pub fn with_tokens(
		&self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at,
			resource_owner_id: self.resource_owner_id,
		}
	}

	/// Returns a copy with every token field reset to its unauthenticated default.
	pub fn cleared(&self) -> Self {
		let mut cleared = self.with_tokens("", "", Self::never());

		cleared.resource_owner_id = 0;

		cleared
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// OAuth client secret.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	/// Current access token; empty until the first successful exchange.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Current refresh token.
	pub fn refresh_token(&self) -> &TokenSecret {
		&self.refresh_token
	}

	/// Expiry instant of the access token.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Resource owner (athlete) identifier; `0` when unknown.
	pub fn resource_owner_id(&self) -> u64 {
		self.resource_owner_id
	}

	/// Returns `true` if the access token is still usable at `now`, treating the last `skew`
	/// before expiry as already expired.
	///
	/// An expiry so close to the representable minimum that the guard window cannot be
	/// subtracted counts as expired.
	pub fn is_valid_at(&self, now: OffsetDateTime, skew: Duration) -> bool {
		self.expires_at.checked_sub(skew).is_some_and(|edge| now < edge)
	}

	/// Fails fast when the client registration is incomplete.
	pub(crate) fn validate_client(&self) -> Result<(), ConfigError> {
		if self.client_id.is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(())
	}

	fn never() -> OffsetDateTime {
		OffsetDateTime::UNIX_EPOCH
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("access_token_set", &!self.access_token.is_empty())
			.field("refresh_token_set", &!self.refresh_token.is_empty())
			.field("expires_at", &self.expires_at)
			.field("resource_owner_id", &self.resource_owner_id)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const SKEW: Duration = Duration::seconds(30);

	fn issued(expires_at: OffsetDateTime) -> Credentials {
		Credentials::new("4242", "client-secret")
			.with_resource_owner_id(1337)
			.with_tokens("access", "refresh", expires_at)
	}

	#[test]
	fn with_tokens_leaves_receiver_untouched() {
		let original = Credentials::new("4242", "client-secret")
			.with_refresh_token("refresh-old")
			.with_resource_owner_id(1337);
		let expires = macros::datetime!(2026-03-01 12:00 UTC);
		let updated = original.with_tokens("access-new", "refresh-new", expires);

		assert_eq!(original.access_token().expose(), "");
		assert_eq!(original.refresh_token().expose(), "refresh-old");
		assert_eq!(original.expires_at(), OffsetDateTime::UNIX_EPOCH);
		assert_eq!(updated.client_id(), original.client_id());
		assert_eq!(updated.client_secret(), original.client_secret());
		assert_eq!(updated.resource_owner_id(), 1337);
		assert_eq!(updated.access_token().expose(), "access-new");
		assert_eq!(updated.refresh_token().expose(), "refresh-new");
		assert_eq!(updated.expires_at(), expires);
	}

	#[test]
	fn validity_honours_the_guard_window() {
		let now = macros::datetime!(2026-03-01 12:00 UTC);

		assert!(!issued(now - Duration::minutes(5)).is_valid_at(now, SKEW));
		assert!(!issued(now + Duration::seconds(10)).is_valid_at(now, SKEW));
		assert!(!issued(now + SKEW).is_valid_at(now, SKEW));
		assert!(issued(now + SKEW + Duration::seconds(1)).is_valid_at(now, SKEW));
		assert!(issued(now + Duration::hours(6)).is_valid_at(now, SKEW));
	}

	#[test]
	fn extreme_expiries_do_not_panic() {
		let now = macros::datetime!(2026-03-01 12:00 UTC);
		let earliest = OffsetDateTime::from_unix_timestamp(-377_705_116_800)
			.expect("Earliest supported timestamp should convert.");

		assert!(!issued(earliest).is_valid_at(now, SKEW));
		assert!(!issued(earliest).is_valid_at(now, Duration::MAX));
		assert!(!issued(now + Duration::hours(6)).is_valid_at(now, Duration::MAX));
		assert!(!issued(now + Duration::hours(6)).is_valid_at(now, Duration::MIN));
	}

	#[test]
	fn fresh_records_are_never_valid() {
		let record = Credentials::new("4242", "client-secret");

		assert!(!record.is_valid_at(OffsetDateTime::now_utc(), SKEW));
		assert_eq!(record.resource_owner_id(), 0);
	}

	#[test]
	fn client_validation_fails_fast() {
		assert!(matches!(
			Credentials::new("", "secret").validate_client(),
			Err(ConfigError::MissingClientId)
		));
		assert!(matches!(
			Credentials::new("4242", "").validate_client(),
			Err(ConfigError::MissingClientSecret)
		));
		assert!(Credentials::new("4242", "secret").validate_client().is_ok());
	}

	#[test]
	fn cleared_resets_token_state() {
		let cleared = issued(macros::datetime!(2026-03-01 12:00 UTC)).cleared();

		assert!(cleared.access_token().is_empty());
		assert!(cleared.refresh_token().is_empty());
		assert_eq!(cleared.expires_at(), OffsetDateTime::UNIX_EPOCH);
		assert_eq!(cleared.client_id(), "4242");
	}

	#[test]
	fn serde_round_trip_keeps_secrets_and_expiry() {
		let record = issued(macros::datetime!(2026-03-01 12:00 UTC));
		let json = serde_json::to_string(&record).expect("Credentials should serialize.");
		let restored: Credentials =
			serde_json::from_str(&json).expect("Credentials should deserialize.");

		assert!(json.contains("\"expires_at\":1772366400"));
		assert_eq!(restored.access_token().expose(), "access");
		assert_eq!(restored.expires_at(), record.expires_at());
		assert_eq!(restored.resource_owner_id(), 1337);

		let minimal: Credentials =
			serde_json::from_str(r#"{"client_id":"4242","client_secret":"s"}"#)
				.expect("Token fields should default.");

		assert_eq!(minimal.expires_at(), OffsetDateTime::UNIX_EPOCH);
	}
}
