//! Paginated result pages and the shared cache that merges them.

// self
use crate::{_prelude::*, cache::FieldPolicy};

/// Cursor metadata returned alongside a page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
	/// Cursor of the previous page.
	#[serde(default)]
	pub prev: Option<String>,
	/// Cursor of the next page.
	#[serde(default)]
	pub next: Option<String>,
	/// Total number of items, when the server reports it.
	#[serde(default)]
	pub total_count: Option<u64>,
}

/// List payload of a paginated field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPage {
	/// Items of the page, or of every merged page.
	#[serde(default)]
	pub items: Vec<JsonValue>,
	/// Cursor metadata of the newest page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_info: Option<PageInfo>,
	/// Remaining fields, such as `__typename`.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, JsonValue>,
}

/// Shared store of merged pages keyed by [`FieldPolicy::storage_key`].
///
/// Clones share the same entries, so an authenticated client and a node client built from one
/// builder see the same lists.
#[derive(Clone, Debug, Default)]
pub struct PaginationCache(Arc<RwLock<HashMap<String, PaginatedPage>>>);
impl PaginationCache {
	/// Merges `incoming` into the list identified by `policy` and `args`, returning the result.
	pub fn write(
		&self,
		policy: &FieldPolicy,
		args: &JsonValue,
		incoming: PaginatedPage,
	) -> PaginatedPage {
		let key = policy.storage_key(args);
		let mut guard = self.0.write();
		let merged = policy.merge(guard.get(&key), incoming, args);

		guard.insert(key, merged.clone());

		merged
	}

	/// Reads the merged list identified by `policy` and `args`.
	pub fn read(&self, policy: &FieldPolicy, args: &JsonValue) -> Option<PaginatedPage> {
		self.0.read().get(&policy.storage_key(args)).cloned()
	}

	/// Drops every list stored for `field`, returning how many were removed.
	pub fn evict_field(&self, field: &str) -> usize {
		let prefix = format!("{field}:");
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|key, _| !key.starts_with(&prefix));

		before - guard.len()
	}

	/// Drops every stored list.
	pub fn clear(&self) {
		self.0.write().clear();
	}

	/// Number of stored lists.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::cache::{CachePolicies, KeyArgs};

	fn page(items: &[&str], next: &str) -> PaginatedPage {
		serde_json::from_value(serde_json::json!({
			"__typename": "PaginatedTimelineResult",
			"items": items,
			"pageInfo": { "prev": null, "next": next, "totalCount": null },
		}))
		.expect("Page fixture should deserialize.")
	}

	#[test]
	fn cursor_pages_append_and_keep_newest_page_info() {
		let cache = PaginationCache::default();
		let policies = CachePolicies::default();
		let policy = policies.get("timeline").expect("Timeline policy should exist.");
		let first_args = serde_json::json!({ "request": { "profileId": "0x01" } });
		let next_args = serde_json::json!({ "request": { "profileId": "0x01", "cursor": "c1" } });

		cache.write(policy, &first_args, page(&["a", "b"], "c1"));

		let merged = cache.write(policy, &next_args, page(&["c"], "c2"));

		assert_eq!(merged.items, vec!["a", "b", "c"]);
		assert_eq!(merged.page_info.and_then(|info| info.next).as_deref(), Some("c2"));
		assert_eq!(merged.extra.get("__typename"), Some(&serde_json::json!("PaginatedTimelineResult")));
		assert_eq!(cache.read(policy, &first_args).map(|page| page.items.len()), Some(3));
	}

	#[test]
	fn first_page_refetch_replaces_list() {
		let cache = PaginationCache::default();
		let policy = FieldPolicy::cursor_based_pagination("followers", KeyArgs::request(["profileId"]));
		let args = serde_json::json!({ "request": { "profileId": "0x01", "cursor": null } });

		cache.write(&policy, &args, page(&["a"], "c1"));

		let merged = cache.write(&policy, &args, page(&["z"], "c9"));

		assert_eq!(merged.items, vec!["z"]);
	}

	#[test]
	fn lists_are_partitioned_by_key_args_and_evictable() {
		let cache = PaginationCache::default();
		let policies = CachePolicies::default();
		let policy = policies.get("notifications").expect("Notifications policy should exist.");

		cache.write(policy, &serde_json::json!({ "request": { "profileId": "0x01" } }), page(&["a"], "c"));
		cache.write(policy, &serde_json::json!({ "request": { "profileId": "0x02" } }), page(&["b"], "c"));

		assert_eq!(cache.len(), 2);
		assert_eq!(cache.evict_field("timeline"), 0);
		assert_eq!(cache.evict_field("notifications"), 2);
		assert!(cache.is_empty());
	}
}
