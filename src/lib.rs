//! GraphQL client link chain with silent access-token refresh, cookie-style credential stores,
//! and cursor pagination cache policies.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod link;
pub mod obs;
pub mod operation;
pub mod refresh;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
		config::ClientConfig,
		link::{Forward, Link, LinkFuture},
		operation::{GraphQlResponse, Operation},
		store::{CookieAttributes, CredentialStore, MemoryStore},
	};

	/// Mints an unsigned JWT whose `exp` claim is set to the provided instant.
	///
	/// The signature segment is a fixed placeholder; claims decoding never verifies it.
	pub fn mint_token(subject: &str, exp: OffsetDateTime) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
		let claims = serde_json::json!({ "sub": subject, "exp": exp.unix_timestamp() });
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

		format!("{header}.{payload}.signature")
	}

	/// Mints a token that expired an hour ago.
	pub fn expired_token(subject: &str) -> String {
		mint_token(subject, OffsetDateTime::now_utc() - Duration::hours(1))
	}

	/// Mints a token that stays valid for another hour.
	pub fn fresh_token(subject: &str) -> String {
		mint_token(subject, OffsetDateTime::now_utc() + Duration::hours(1))
	}

	/// Builds a [`ClientConfig`] pointing at a mock server URL.
	pub fn test_config(api_url: &str) -> ClientConfig {
		let url = Url::parse(api_url).expect("Mock API URL should parse successfully.");

		ClientConfig::builder(url).build().expect("Test client config should build.")
	}

	/// Seeds both credential entries into a fresh [`MemoryStore`].
	pub fn seeded_store(access: &str, refresh: &str) -> Arc<MemoryStore> {
		let store = Arc::new(MemoryStore::default());
		let attributes = CookieAttributes::default();

		store
			.set(ACCESS_TOKEN_KEY, access, &attributes)
			.expect("Seeding the access token should succeed.");
		store
			.set(REFRESH_TOKEN_KEY, refresh, &attributes)
			.expect("Seeding the refresh token should succeed.");

		store
	}

	/// Terminating link that records every forwarded operation and answers with an empty
	/// response.
	#[derive(Debug, Default)]
	pub struct RecordingLink {
		seen: Mutex<Vec<Operation>>,
	}
	impl RecordingLink {
		/// Returns a snapshot of every operation that reached this link.
		pub fn operations(&self) -> Vec<Operation> {
			self.seen.lock().clone()
		}

		/// Returns the most recent operation, if any.
		pub fn last(&self) -> Option<Operation> {
			self.seen.lock().last().cloned()
		}
	}
	impl Link for RecordingLink {
		fn request<'a>(
			&'a self,
			operation: Operation,
			_forward: Forward<'a>,
		) -> Result<LinkFuture<'a>> {
			self.seen.lock().push(operation);

			Ok(Box::pin(async { Ok(GraphQlResponse::default()) }))
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
