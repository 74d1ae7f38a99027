//! Credential Store contracts, cookie attribute profiles, and built-in backends.

pub mod cookie;
pub mod file;
pub mod memory;

pub use cookie::*;
pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{ACCESS_TOKEN_KEY, CredentialPair, REFRESH_TOKEN_KEY, TokenSecret},
};

/// Named string storage consulted on every outgoing operation.
///
/// The contract mirrors a browser cookie jar: each name maps to at most one current value,
/// and writes carry the [`CookieAttributes`] profile that governs expiry and transport
/// constraints. Calls are synchronous because the authentication link reads the store before
/// it forwards an operation.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current value stored under `name`, if any.
	fn get(&self, name: &str) -> Result<Option<String>, StoreError>;

	/// Stores or replaces `value` under `name`.
	fn set(&self, name: &str, value: &str, attributes: &CookieAttributes)
	-> Result<(), StoreError>;

	/// Removes the value stored under `name`; removing an absent name is not an error.
	fn remove(&self, name: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Value persisted by the built-in backends together with its attribute profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
	/// Raw stored value.
	pub value: String,
	/// Absolute expiry, or `None` for session-scoped entries.
	pub expires_at: Option<OffsetDateTime>,
	/// Attribute profile applied when the value was written.
	pub attributes: CookieAttributes,
}
impl StoredCredential {
	/// Stamps `value` with the expiry derived from `attributes` at `now`.
	pub fn new(value: impl Into<String>, attributes: CookieAttributes, now: OffsetDateTime) -> Self {
		Self { value: value.into(), expires_at: attributes.expires_at(now), attributes }
	}

	/// Returns `true` once the entry's expiry window has elapsed.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| now >= expires_at)
	}
}

/// Reads the access token, collapsing absent and placeholder values to `None`.
pub fn load_access_token(store: &dyn CredentialStore) -> Result<Option<TokenSecret>, StoreError> {
	Ok(TokenSecret::from_stored(store.get(ACCESS_TOKEN_KEY)?))
}

/// Reads the refresh token, collapsing absent and placeholder values to `None`.
pub fn load_refresh_token(store: &dyn CredentialStore) -> Result<Option<TokenSecret>, StoreError> {
	Ok(TokenSecret::from_stored(store.get(REFRESH_TOKEN_KEY)?))
}

/// Reads both entries; returns `None` unless both hold usable values.
pub fn load_pair(store: &dyn CredentialStore) -> Result<Option<CredentialPair>, StoreError> {
	let access_token = load_access_token(store)?;
	let refresh_token = load_refresh_token(store)?;

	Ok(access_token
		.zip(refresh_token)
		.map(|(access_token, refresh_token)| CredentialPair { access_token, refresh_token }))
}

/// Persists both entries with a shared attribute profile.
pub fn save_pair(
	store: &dyn CredentialStore,
	pair: &CredentialPair,
	attributes: &CookieAttributes,
) -> Result<(), StoreError> {
	store.set(ACCESS_TOKEN_KEY, pair.access_token.expose(), attributes)?;
	store.set(REFRESH_TOKEN_KEY, pair.refresh_token.expose(), attributes)
}

/// Removes both entries.
pub fn clear_pair(store: &dyn CredentialStore) -> Result<(), StoreError> {
	store.remove(ACCESS_TOKEN_KEY)?;
	store.remove(REFRESH_TOKEN_KEY)
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "cookie jar locked".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("cookie jar locked"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn pair_helpers_skip_placeholder_values() {
		let store = MemoryStore::default();
		let attributes = CookieAttributes::default();

		store.set(ACCESS_TOKEN_KEY, "undefined", &attributes).expect("Set should succeed.");
		store.set(REFRESH_TOKEN_KEY, "refresh", &attributes).expect("Set should succeed.");

		assert_eq!(load_access_token(&store), Ok(None));
		assert_eq!(load_pair(&store), Ok(None));

		save_pair(&store, &CredentialPair::new("A2", "R2"), &attributes)
			.expect("Saving a pair should succeed.");

		assert_eq!(load_pair(&store), Ok(Some(CredentialPair::new("A2", "R2"))));

		clear_pair(&store).expect("Clearing the pair should succeed.");

		assert_eq!(store.get(ACCESS_TOKEN_KEY), Ok(None));
		assert_eq!(store.get(REFRESH_TOKEN_KEY), Ok(None));
	}

	#[test]
	fn stored_credential_expires_at_window_end() {
		let now = OffsetDateTime::now_utc();
		let entry = StoredCredential::new(
			"value",
			CookieAttributes::default().with_expires(Some(Duration::days(1))),
			now,
		);

		assert!(!entry.is_expired_at(now));
		assert!(entry.is_expired_at(now + Duration::days(1)));
		assert!(
			!StoredCredential::new("value", CookieAttributes::session(), now)
				.is_expired_at(now + Duration::days(3650))
		);
	}
}
