//! Thread-safe in-memory [`CredentialStore`] acting as a process-wide cookie jar.

// self
use crate::{
	_prelude::*,
	store::{CookieAttributes, CredentialStore, StoreError, StoredCredential},
};

type CredentialMap = Arc<RwLock<HashMap<String, StoredCredential>>>;

/// Process-wide credential storage; clones share the same entries.
///
/// Entries past their expiry window read as absent and are purged on the next write.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(CredentialMap);
impl MemoryStore {
	/// Returns the raw entry stored under `name`, including its attribute profile.
	pub fn entry(&self, name: &str) -> Option<StoredCredential> {
		self.0.read().get(name).cloned()
	}

	/// Number of live (non-expired) entries.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|entry| !entry.is_expired_at(now)).count()
	}

	/// Returns `true` when no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn purge_expired(map: &mut HashMap<String, StoredCredential>, now: OffsetDateTime) {
		map.retain(|_, entry| !entry.is_expired_at(now));
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
		let now = OffsetDateTime::now_utc();

		Ok(self
			.0
			.read()
			.get(name)
			.filter(|entry| !entry.is_expired_at(now))
			.map(|entry| entry.value.clone()))
	}

	fn set(
		&self,
		name: &str,
		value: &str,
		attributes: &CookieAttributes,
	) -> Result<(), StoreError> {
		let now = OffsetDateTime::now_utc();
		let mut guard = self.0.write();

		Self::purge_expired(&mut guard, now);
		guard.insert(name.to_owned(), StoredCredential::new(value, *attributes, now));

		Ok(())
	}

	fn remove(&self, name: &str) -> Result<(), StoreError> {
		self.0.write().remove(name);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unbounded_window_is_stored_without_expiry() {
		let store = MemoryStore::default();
		let attributes = CookieAttributes::default().with_expires(Some(Duration::MAX));

		store.set("accessToken", "a", &attributes).expect("Set should not overflow.");

		assert_eq!(store.get("accessToken").expect("Get should succeed.").as_deref(), Some("a"));
		assert_eq!(store.entry("accessToken").and_then(|entry| entry.expires_at), None);
	}

	#[test]
	fn elapsed_entries_read_as_absent() {
		let store = MemoryStore::default();

		store
			.set("refreshToken", "r", &CookieAttributes::default().with_expires(Some(Duration::ZERO)))
			.expect("Set should succeed.");

		assert_eq!(store.get("refreshToken").expect("Get should succeed."), None);
		assert!(store.is_empty());
	}
}
