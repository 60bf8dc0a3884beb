//! Authorization-code onboarding and deauthorization.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	api,
	auth::{Credentials, ScopeSet},
	error::{ConfigError, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	oauth::TokenFacade,
	session::Session,
};

const STATE_LEN: usize = 32;

/// Whether the consent screen is shown to users who already authorized the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPrompt {
	/// Skip the prompt when the user already granted the scopes.
	#[default]
	Auto,
	/// Always show the prompt.
	Force,
}
impl ApprovalPrompt {
	/// Query parameter value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Auto => "auto",
			Self::Force => "force",
		}
	}
}

/// Authorization redirect metadata returned by [`Session::authorization_request`].
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Fully formed authorization URL that users should be sent to.
	pub url: Url,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI embedded in the URL.
	pub redirect_uri: Url,
	/// Requested scopes.
	pub scope: ScopeSet,
}
impl AuthorizationRequest {
	/// Validates the `state` parameter returned to the redirect URI.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::auth("Authorization state mismatch"))
		}
	}
}

impl Session {
	/// Builds the URL that starts the authorization-code flow.
	pub fn authorization_request(
		&self,
		redirect_uri: Url,
		scope: ScopeSet,
		prompt: ApprovalPrompt,
	) -> Result<AuthorizationRequest> {
		let credentials = self.credentials();

		if credentials.client_id().is_empty() {
			return Err(ConfigError::MissingClientId.into());
		}

		let state = random_string(STATE_LEN);
		let mut url = self.config().endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", credentials.client_id());
		pairs.append_pair("redirect_uri", redirect_uri.as_str());
		pairs.append_pair("response_type", "code");
		pairs.append_pair("approval_prompt", prompt.as_str());

		if !scope.is_empty() {
			pairs.append_pair("scope", &scope.normalized());
		}

		pairs.append_pair("state", &state);

		drop(pairs);

		Ok(AuthorizationRequest { url, state, redirect_uri, scope })
	}

	/// Exchanges the code delivered to the redirect URI and installs the issued tokens.
	///
	/// The resource owner is taken from the `athlete` object of the response. The exchange is
	/// serialized with refreshes, so a refresh already in flight cannot overwrite its result.
	pub async fn exchange_code(&self, code: &str) -> Result<Arc<Credentials>> {
		const KIND: CallKind = CallKind::AuthorizationCode;

		let span = CallSpan::new(KIND, "exchange_code");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _writer = self.state.refresh_guard.lock().await;
				let current = self.credentials();
				let issued = TokenFacade::new(
					&current,
					&self.config().endpoints.token,
					&self.state.http_client,
				)?
				.exchange_code(&current, code)
				.await?;
				let issued = Arc::new(issued);

				self.state.install(Arc::clone(&issued));

				Ok(issued)
			})
			.await;

		span.finish(&result);

		result
	}

	/// Revokes the application's access for the current athlete and clears the held tokens.
	///
	/// Waits for any refresh in flight and revokes the token it installed. On failure the held
	/// record is left untouched.
	pub async fn deauthorize(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Deauthorization;

		let span = CallSpan::new(KIND, "deauthorize");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let endpoint = self
					.config()
					.endpoints
					.deauthorization
					.clone()
					.ok_or(ConfigError::MissingDeauthorizationEndpoint)?;
				let _writer = self.state.refresh_guard.lock().await;
				let current = self.credentials();
				let response = self
					.state
					.http_client
					.post(endpoint)
					.bearer_auth(current.access_token().expose())
					.send()
					.await
					.map_err(TransportError::from)?;

				obs::record_response_status(response.status().as_u16());

				if !response.status().is_success() {
					return Err(api::read_failure(response).await.into());
				}

				self.state.install(Arc::new(current.cleared()));

				Ok(())
			})
			.await;

		span.finish(&result);

		result
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
