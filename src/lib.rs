//! OAuth 2.0 session layer for the Strava API: token lifecycle tracking, automatic refresh,
//! and typed API calls that classify every failure into one error taxonomy.
//!
//! A [`Session`](session::Session) owns one [`Credentials`](auth::Credentials) record and
//! hands out a cached [`Api`](api::Api) facade. The facade refreshes expired tokens before
//! sending, attaches the bearer token, retries once after a `401`, and decodes JSON payloads.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod ratelimit;
pub mod session;

pub use api::Api;
pub use auth::Credentials;
pub use error::{Error, ErrorKind, Result};
pub use session::Session;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
