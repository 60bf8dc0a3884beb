//! Shared fixtures for integration tests backed by `httpmock`.

#![allow(dead_code)]

// crates.io
use httpmock::prelude::*;
// self
use strava_session::{
	Credentials, Session, config::SessionConfig, http::ReqwestHttpClient, reqwest, url::Url,
};

pub const CLIENT_ID: &str = "4242";
pub const CLIENT_SECRET: &str = "client-secret";

/// Session configuration pointing every endpoint at `server`.
pub fn mock_config(server: &MockServer) -> SessionConfig {
	SessionConfig::builder()
		.authorization_endpoint(
			Url::parse(&server.url("/oauth/authorize")).expect("Mock authorize URL should parse."),
		)
		.token_endpoint(Url::parse(&server.url("/oauth/token")).expect("Mock token URL should parse."))
		.deauthorization_endpoint(
			Url::parse(&server.url("/oauth/deauthorize"))
				.expect("Mock deauthorize URL should parse."),
		)
		.api_base(Url::parse(&server.url("/api/v3")).expect("Mock API base should parse."))
		.build()
		.expect("Mock session configuration should build.")
}

/// Plain reqwest client for talking to the mock server.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = reqwest::Client::builder()
		.redirect(reqwest::redirect::Policy::none())
		.build()
		.expect("Reqwest client for tests should build.");

	ReqwestHttpClient::with_client(client)
}

/// Credentials whose access token expired an hour ago.
pub fn expired_credentials() -> Credentials {
	Credentials::new(CLIENT_ID, CLIENT_SECRET).with_refresh_token("refresh-old").with_tokens(
		"access-old",
		"refresh-old",
		time::OffsetDateTime::now_utc() - time::Duration::hours(1),
	)
}

/// Credentials whose access token is valid for another six hours.
pub fn fresh_credentials() -> Credentials {
	Credentials::new(CLIENT_ID, CLIENT_SECRET).with_tokens(
		"access-live",
		"refresh-live",
		time::OffsetDateTime::now_utc() + time::Duration::hours(6),
	)
}

/// Session wired to `server`.
pub fn mock_session(server: &MockServer, credentials: Credentials) -> Session {
	Session::with_http_client(credentials, mock_config(server), test_http_client())
		.expect("Mock session should build.")
}

/// JSON body of a successful token response expiring six hours from now.
pub fn token_body(access: &str, refresh: &str) -> String {
	let expires_at = time::OffsetDateTime::now_utc().unix_timestamp() + 21_600;

	format!(
		r#"{{"token_type":"Bearer","access_token":"{access}","refresh_token":"{refresh}","expires_at":{expires_at},"expires_in":21600,"athlete":{{"id":134815,"firstname":"Marianne"}}}}"#
	)
}
