//! Session owning one credential record, its refresh coordination, and the API facade.
//!
//! A session is in one of two observable states. It is *authenticated* while
//! `now < expires_at - expiry_skew`, and *unauthenticated* otherwise. The only transition into
//! the authenticated state is a successful token exchange; the way out is the clock.

pub mod authorize;
pub mod refresh;

pub use authorize::*;
pub use refresh::*;

// std
use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	api::Api,
	auth::Credentials,
	config::{DEFAULT_REQUEST_TIMEOUT, SessionConfig},
	error::ConfigError,
	http::ReqwestHttpClient,
};

/// Authenticated access to the API for one client registration.
///
/// Any number of calls may be in flight against one session. The credential record is the
/// only shared mutable state and is always replaced wholesale.
pub struct Session {
	state: Arc<SessionState>,
	api: OnceLock<Api>,
}
impl Session {
	/// Creates a session against the production endpoints using the shared HTTP client.
	pub fn new(credentials: Credentials) -> Result<Self> {
		Self::with_config(credentials, SessionConfig::strava())
	}

	/// Creates a session for `config`.
	///
	/// The shared HTTP client is reused when the configured timeout is the default; otherwise a
	/// dedicated client bounded by `config.request_timeout` is built.
	pub fn with_config(credentials: Credentials, config: SessionConfig) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let http_client = if config.request_timeout == DEFAULT_REQUEST_TIMEOUT {
			ReqwestHttpClient::shared()?
		} else {
			ReqwestHttpClient::with_timeout(config.request_timeout)?
		};

		Self::with_http_client(credentials, config, http_client)
	}

	/// Creates a session that sends every request through `http_client`.
	///
	/// `config` is checked with [`SessionConfig::validate`] first, so hand-assembled or
	/// deserialized configurations get the same guarantees as builder output.
	pub fn with_http_client(
		credentials: Credentials,
		config: SessionConfig,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		config.validate().map_err(ConfigError::from)?;

		let state = SessionState {
			config,
			http_client,
			credentials: RwLock::new(Arc::new(credentials)),
			refresh_guard: AsyncMutex::new(()),
			refresh_metrics: RefreshMetrics::default(),
		};

		Ok(Self { state: Arc::new(state), api: OnceLock::new() })
	}

	/// Snapshot of the current credential record.
	///
	/// The snapshot never changes; later refreshes install a new record.
	pub fn credentials(&self) -> Arc<Credentials> {
		self.state.credentials()
	}

	/// Installs a record restored by the caller, e.g. from persisted state.
	pub fn replace_credentials(&self, credentials: Credentials) {
		self.state.install(Arc::new(credentials));
	}

	/// Returns `true` while the access token is outside the expiry guard window.
	pub fn is_authenticated(&self) -> bool {
		self.is_authenticated_at(OffsetDateTime::now_utc())
	}

	/// [`is_authenticated`](Self::is_authenticated) evaluated at an explicit instant.
	pub fn is_authenticated_at(&self, now: OffsetDateTime) -> bool {
		self.state.is_authenticated_at(now)
	}

	/// Unconditionally exchanges the refresh token and installs the new record on success.
	///
	/// Callers that were waiting on a concurrent refresh reuse its freshly installed record
	/// instead of issuing another round trip. On failure the held record is left untouched.
	pub async fn refresh(&self) -> Result<Arc<Credentials>> {
		self.state.refresh().await
	}

	/// Refreshes the session if it is not authenticated, then returns `self`.
	///
	/// **Failures are swallowed.** This is a convenience for call sites that will surface an
	/// authentication problem through a later API call anyway. A failed refresh is logged and
	/// leaves the held record untouched. Callers that need the failure detail must call
	/// [`refresh`](Self::refresh) and inspect [`is_authenticated`](Self::is_authenticated).
	pub async fn ensure_authenticated(&self) -> &Self {
		if !self.is_authenticated() {
			let _ = self.refresh().await;
		}

		self
	}

	/// Facade for resource calls. Created on first use and cached for the session's lifetime.
	pub fn api(&self) -> &Api {
		self.api.get_or_init(|| Api::new(Arc::clone(&self.state)))
	}

	/// Configuration the session was created with.
	pub fn config(&self) -> &SessionConfig {
		&self.state.config
	}

	/// Counters for refresh round trips issued by this session.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.state.refresh_metrics
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("credentials", &self.state.credentials())
			.field("config", &self.state.config)
			.finish()
	}
}

/// State shared between a [`Session`] and its [`Api`].
pub(crate) struct SessionState {
	pub(crate) config: SessionConfig,
	pub(crate) http_client: ReqwestHttpClient,
	credentials: RwLock<Arc<Credentials>>,
	refresh_guard: AsyncMutex<()>,
	refresh_metrics: RefreshMetrics,
}
impl SessionState {
	pub(crate) fn credentials(&self) -> Arc<Credentials> {
		self.credentials.read().clone()
	}

	pub(crate) fn install(&self, credentials: Arc<Credentials>) {
		*self.credentials.write() = credentials;
	}

	pub(crate) fn is_authenticated_at(&self, now: OffsetDateTime) -> bool {
		self.credentials.read().is_valid_at(now, self.config.expiry_skew)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::config::SessionConfigError;

	fn session(credentials: Credentials) -> Session {
		Session::with_http_client(
			credentials,
			SessionConfig::strava(),
			ReqwestHttpClient::with_client(ReqwestClient::new()),
		)
		.expect("Production configuration should be valid.")
	}

	#[test]
	fn invalid_configurations_are_rejected() {
		let credentials = Credentials::new("4242", "client-secret");
		let mut config = SessionConfig::strava();

		config.endpoints.api_base =
			Url::parse("https://www.strava.com/api/v3").expect("API base should parse.");

		let err = Session::with_config(credentials.clone(), config)
			.expect_err("API base without a trailing slash should be rejected.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::InvalidConfig(SessionConfigError::InvalidApiBase { .. }))
		));

		let mut config = SessionConfig::strava();

		config.expiry_skew = Duration::seconds(-1);

		let err = Session::with_http_client(
			credentials,
			config,
			ReqwestHttpClient::with_client(ReqwestClient::new()),
		)
		.expect_err("Negative skew should be rejected.");

		assert_eq!(err.kind(), crate::ErrorKind::Config);
	}

	#[test]
	fn authentication_tracks_the_guard_window() {
		let now = macros::datetime!(2026-03-01 12:00 UTC);
		let base = Credentials::new("4242", "client-secret");
		let session = session(base.with_tokens("a", "r", now + Duration::seconds(31)));

		assert!(session.is_authenticated_at(now));
		assert!(!session.is_authenticated_at(now + Duration::seconds(1)));

		session.replace_credentials(base.with_tokens("a", "r", now + Duration::seconds(29)));

		assert!(!session.is_authenticated_at(now));
	}

	#[test]
	fn api_is_created_once() {
		let session = session(Credentials::new("4242", "client-secret"));

		assert!(std::ptr::eq(session.api(), session.api()));
	}

	#[test]
	fn snapshots_survive_replacement() {
		let session = session(Credentials::new("4242", "client-secret").with_refresh_token("r0"));
		let before = session.credentials();

		session.replace_credentials(
			Credentials::new("4242", "client-secret").with_refresh_token("r1"),
		);

		assert_eq!(before.refresh_token().expose(), "r0");
		assert_eq!(session.credentials().refresh_token().expose(), "r1");
	}
}
