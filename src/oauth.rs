//! Token endpoint facade built on the `oauth2` crate.
//!
//! The client authenticates in the request body, so every exchange is a form POST carrying
//! `client_id`, `client_secret`, and the grant fields. Responses carry two extra fields the
//! standard token response lacks: `expires_at` (epoch seconds) and the owning `athlete`.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, RefreshToken, RequestTokenError, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{BasicRevocationErrorResponse, BasicTokenIntrospectionResponse, BasicTokenType},
};
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	error::{BoxError, ConfigError, Fault, TransportError, TransportErrorKind},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

/// Grant-specific fields returned next to the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantFields {
	/// Absolute expiry of the access token in epoch seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	/// Summary of the athlete that owns the token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub athlete: Option<AthleteRef>,
}
impl ExtraTokenFields for GrantFields {}

/// Minimal athlete projection embedded in token responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteRef {
	/// Athlete identifier.
	pub id: u64,
}

/// Token response decoded from the token endpoint.
pub type GrantResponse = StandardTokenResponse<GrantFields, BasicTokenType>;

type ConfiguredClient = Client<
	Fault,
	GrantResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type GrantRequestError = RequestTokenError<HttpClientError<ReqwestError>, Fault>;

/// Performs token exchanges for one client registration.
///
/// The facade is stateless apart from its configuration; the caller decides what to do with
/// the returned record.
pub(crate) struct TokenFacade<'a> {
	oauth_client: ConfiguredClient,
	http_client: &'a ReqwestHttpClient,
}
impl<'a> TokenFacade<'a> {
	/// Builds a facade for `credentials`, failing fast on an incomplete registration.
	pub(crate) fn new(
		credentials: &Credentials,
		token_endpoint: &Url,
		http_client: &'a ReqwestHttpClient,
	) -> Result<Self> {
		credentials.validate_client()?;

		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let oauth_client = Client::new(ClientId::new(credentials.client_id().to_owned()))
			.set_client_secret(ClientSecret::new(credentials.client_secret().expose().to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges the record's refresh token for a new token pair.
	///
	/// An empty refresh token is sent as is; the server is expected to reject it.
	pub(crate) async fn refresh(&self, credentials: &Credentials) -> Result<Credentials> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.instrumented(meta.clone());
		let refresh_token = RefreshToken::new(credentials.refresh_token().expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_token)
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_grant_response(credentials, response, OffsetDateTime::now_utc())
	}

	/// Exchanges an authorization code returned to the redirect URI.
	pub(crate) async fn exchange_code(
		&self,
		credentials: &Credentials,
		code: &str,
	) -> Result<Credentials> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_grant_response(credentials, response, OffsetDateTime::now_utc())
	}
}

fn map_grant_response(
	current: &Credentials,
	response: GrantResponse,
	now: OffsetDateTime,
) -> Result<Credentials> {
	let access_token = response.access_token().secret();

	if access_token.is_empty() {
		return Err(unexpected_response("access_token is empty"));
	}

	let refresh_token = response
		.refresh_token()
		.map(|token| token.secret())
		.filter(|token| !token.is_empty())
		.ok_or_else(|| unexpected_response("refresh_token is missing"))?;
	let extra = response.extra_fields();
	let expires_at = match (extra.expires_at, response.expires_in()) {
		(Some(epoch), _) => OffsetDateTime::from_unix_timestamp(epoch)
			.map_err(|_| unexpected_response("expires_at is out of range"))?,
		(None, Some(expires_in)) => {
			Duration::try_from(expires_in)
				.ok()
				.and_then(|expires_in| now.checked_add(expires_in))
				.ok_or_else(|| unexpected_response("expires_in is out of range"))?
		},
		(None, None) => return Err(unexpected_response("expiry is missing")),
	};
	let owner = extra.athlete.as_ref().map_or(0, |athlete| athlete.id);

	Ok(current.with_tokens(access_token, refresh_token, expires_at).with_resource_owner_id(owner))
}

fn unexpected_response(detail: &str) -> Error {
	Error::auth(format!("Token endpoint returned an unexpected response ({detail})"))
}

fn map_request_error(meta: Option<ResponseMetadata>, err: GrantRequestError) -> Error {
	let (status, retry_after) = meta.map_or((None, None), |meta| (meta.status, meta.retry_after));

	match err {
		RequestTokenError::ServerResponse(fault) => Error::Auth {
			message: format!("Token endpoint rejected the request: {fault}"),
			status,
			retry_after,
			fault: Some(fault),
			source: None,
		},
		RequestTokenError::Parse(source, _body) => Error::Auth {
			message: "Token endpoint returned an unexpected response".into(),
			status,
			retry_after,
			fault: None,
			source: Some(Box::new(source) as BoxError),
		},
		RequestTokenError::Request(error) => map_transport_error(status, error),
		RequestTokenError::Other(message) => Error::Auth {
			message: format!("Token endpoint returned an unexpected response: {message}"),
			status,
			retry_after,
			fault: None,
			source: None,
		},
	}
}

fn map_transport_error(status: Option<u16>, err: HttpClientError<ReqwestError>) -> Error {
	let transport = match err {
		HttpClientError::Reqwest(inner) => {
			if inner.is_builder() {
				return ConfigError::from(*inner).into();
			}

			TransportError::from(*inner)
		},
		HttpClientError::Http(inner) => return ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::network(inner),
		HttpClientError::Other(message) => TransportError::new(
			TransportErrorKind::Network,
			format!("HTTP client error occurred while calling the token endpoint: {message}"),
		),
		_ => TransportError::new(
			TransportErrorKind::Network,
			"HTTP client error occurred while calling the token endpoint",
		),
	};

	match status {
		Some(code) if transport.status().is_none() => transport.with_status(code).into(),
		_ => transport.into(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::error::ErrorKind;

	fn seed() -> Credentials {
		Credentials::new("4242", "client-secret")
			.with_refresh_token("refresh-old")
			.with_resource_owner_id(77)
	}

	fn response(json: &str) -> GrantResponse {
		serde_json::from_str(json).expect("Token response fixture should deserialize.")
	}

	#[test]
	fn grant_response_maps_expiry_and_athlete() {
		let now = macros::datetime!(2026-03-01 12:00 UTC);
		let record = map_grant_response(
			&seed(),
			response(
				r#"{"token_type":"Bearer","access_token":"a1","refresh_token":"r1","expires_at":1772373600,"expires_in":21600,"athlete":{"id":134815,"username":"marianne_t"}}"#,
			),
			now,
		)
		.expect("Complete token response should map.");

		assert_eq!(record.access_token().expose(), "a1");
		assert_eq!(record.refresh_token().expose(), "r1");
		assert_eq!(record.expires_at(), macros::datetime!(2026-03-01 14:00 UTC));
		assert_eq!(record.resource_owner_id(), 134815);
		assert_eq!(record.client_id(), "4242");
	}

	#[test]
	fn missing_athlete_resets_owner_and_expires_in_is_a_fallback() {
		let now = macros::datetime!(2026-03-01 12:00 UTC);
		let record = map_grant_response(
			&seed(),
			response(
				r#"{"token_type":"Bearer","access_token":"a1","refresh_token":"r1","expires_in":3600}"#,
			),
			now,
		)
		.expect("Response with expires_in should map.");

		assert_eq!(record.expires_at(), now + Duration::hours(1));
		assert_eq!(record.resource_owner_id(), 0);
	}

	#[test]
	fn incomplete_responses_are_unexpected() {
		let now = OffsetDateTime::now_utc();

		for json in [
			r#"{"token_type":"Bearer","access_token":"a1","expires_at":1772373600}"#,
			r#"{"token_type":"Bearer","access_token":"","refresh_token":"r1","expires_at":1772373600}"#,
			r#"{"token_type":"Bearer","access_token":"a1","refresh_token":"r1"}"#,
			r#"{"token_type":"Bearer","access_token":"a1","refresh_token":"r1","expires_in":9223372036854775807}"#,
		] {
			let err = map_grant_response(&seed(), response(json), now)
				.expect_err("Incomplete response should be rejected.");

			assert_eq!(err.kind(), ErrorKind::Authentication);
			assert!(err.to_string().contains("unexpected response"));
		}
	}

	#[test]
	fn server_faults_keep_status_and_detail() {
		let fault: Fault = serde_json::from_str(
			r#"{"message":"Bad Request","errors":[{"resource":"RefreshToken","field":"refresh_token","code":"invalid"}]}"#,
		)
		.expect("Fault fixture should deserialize.");
		let err = map_request_error(
			Some(ResponseMetadata { status: Some(400), retry_after: None }),
			RequestTokenError::ServerResponse(fault.clone()),
		);

		assert_eq!(err.kind(), ErrorKind::Authentication);
		assert_eq!(err.status(), Some(400));
		assert_eq!(err.fault(), Some(&fault));
		assert_eq!(err.retry_after(), None);
	}

	#[test]
	fn throttled_token_requests_keep_the_retry_hint() {
		let fault: Fault = serde_json::from_str(r#"{"message":"Rate Limit Exceeded","errors":[]}"#)
			.expect("Fault fixture should deserialize.");
		let err = map_request_error(
			Some(ResponseMetadata { status: Some(429), retry_after: Some(Duration::minutes(15)) }),
			RequestTokenError::ServerResponse(fault),
		);

		assert_eq!(err.kind(), ErrorKind::Authentication);
		assert_eq!(err.status(), Some(429));
		assert_eq!(err.retry_after(), Some(Duration::minutes(15)));
	}

	#[test]
	fn incomplete_registration_fails_before_any_request() {
		let http = ReqwestHttpClient::with_client(ReqwestClient::new());
		let endpoint = Url::parse("https://www.strava.com/oauth/token").expect("URL should parse.");
		let err = TokenFacade::new(&Credentials::new("", "secret"), &endpoint, &http)
			.err()
			.expect("Empty client id should be rejected.");

		assert_eq!(err.kind(), ErrorKind::Config);
	}
}
