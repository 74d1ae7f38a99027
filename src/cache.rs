//! Cursor-based pagination field policies.
//!
//! Each paginated root field names the subset of its arguments that identifies a result list.
//! Pages fetched with the same identifying arguments merge into one list; any other argument
//! (the cursor, the page size) only selects which slice of that list a response carries.

mod pagination;

pub use pagination::*;

// self
use crate::_prelude::*;

/// One entry of a key-argument selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyArg {
	/// Selects the whole argument value.
	Name(String),
	/// Selects a subset of an object argument's fields.
	Nested {
		/// Argument name.
		name: String,
		/// Selection applied to the argument's value.
		fields: KeyArgs,
	},
}

/// Argument subset that participates in a field's cache identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyArgs(Vec<KeyArg>);
impl KeyArgs {
	/// Creates an empty selection; every call of the field then shares one list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Selects a whole argument.
	pub fn arg(mut self, name: impl Into<String>) -> Self {
		self.0.push(KeyArg::Name(name.into()));

		self
	}

	/// Selects `fields` of the object argument `name`.
	pub fn nested<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let fields = KeyArgs(fields.into_iter().map(|field| KeyArg::Name(field.into())).collect());

		self.0.push(KeyArg::Nested { name: name.into(), fields });

		self
	}

	/// Shorthand for fields of the conventional `request` input argument.
	pub fn request<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new().nested("request", fields)
	}

	/// Projects `args` onto the selection; absent arguments are skipped.
	pub fn select(&self, args: &JsonValue) -> JsonValue {
		let mut selected = serde_json::Map::new();

		for key_arg in &self.0 {
			match key_arg {
				KeyArg::Name(name) =>
					if let Some(value) = args.get(name) {
						selected.insert(name.clone(), value.clone());
					},
				KeyArg::Nested { name, fields } =>
					if let Some(value) = args.get(name) {
						selected.insert(name.clone(), fields.select(value));
					},
			}
		}

		JsonValue::Object(selected)
	}

	/// Iterates over the top-level entries.
	pub fn iter(&self) -> impl Iterator<Item = &KeyArg> {
		self.0.iter()
	}
}

/// Merge policy for one paginated field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPolicy {
	/// Root field name.
	pub field: String,
	/// Arguments identifying a result list.
	pub key_args: KeyArgs,
}
impl FieldPolicy {
	/// Cursor-based pagination keyed by `key_args`.
	pub fn cursor_based_pagination(field: impl Into<String>, key_args: KeyArgs) -> Self {
		Self { field: field.into(), key_args }
	}

	/// Storage key for a call with `args`: the field name plus the selected arguments.
	///
	/// Object keys are ordered, so equal selections always produce equal keys.
	pub fn storage_key(&self, args: &JsonValue) -> String {
		format!("{}:{}", self.field, self.key_args.select(args))
	}

	/// Merges `incoming` into `existing`.
	///
	/// Items append in arrival order and the newest `pageInfo` wins. A call without a cursor
	/// fetches the first page and replaces the stored list.
	pub fn merge(
		&self,
		existing: Option<&PaginatedPage>,
		incoming: PaginatedPage,
		args: &JsonValue,
	) -> PaginatedPage {
		let Some(existing) = existing.filter(|_| has_cursor(args)) else {
			return incoming;
		};
		let mut items = existing.items.clone();

		items.extend(incoming.items);

		PaginatedPage { items, page_info: incoming.page_info, extra: incoming.extra }
	}
}

fn has_cursor(args: &JsonValue) -> bool {
	let cursor = args
		.get("request")
		.and_then(|request| request.get("cursor"))
		.or_else(|| args.get("cursor"));

	cursor.is_some_and(|cursor| !cursor.is_null())
}

/// Field policies for the `Query` root type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePolicies {
	fields: BTreeMap<String, FieldPolicy>,
}
impl CachePolicies {
	/// Creates an empty policy table.
	pub fn empty() -> Self {
		Self { fields: BTreeMap::new() }
	}

	/// Adds or replaces the policy for `policy.field`.
	pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
		self.fields.insert(policy.field.clone(), policy);

		self
	}

	/// Policy registered for `field`, if any.
	pub fn get(&self, field: &str) -> Option<&FieldPolicy> {
		self.fields.get(field)
	}

	/// Iterates over the policies in field-name order.
	pub fn iter(&self) -> impl Iterator<Item = &FieldPolicy> {
		self.fields.values()
	}

	/// Number of registered policies.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Returns `true` when no policies are registered.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}
impl Default for CachePolicies {
	fn default() -> Self {
		[
			("timeline", KeyArgs::request(["profileId"])),
			("explorePublications", KeyArgs::request(["sortCriteria"])),
			("publications", KeyArgs::request(["profileId", "commentsOf", "publicationTypes"])),
			("nfts", KeyArgs::request(["ownerAddress", "chainIds"])),
			("notifications", KeyArgs::request(["profileId"])),
			("followers", KeyArgs::request(["profileId"])),
			("following", KeyArgs::request(["address"])),
			("search", KeyArgs::request(["query", "type"])),
			("whoCollectedPublication", KeyArgs::request(["publicationId"])),
		]
		.into_iter()
		.fold(Self::empty(), |policies, (field, key_args)| {
			policies.with_policy(FieldPolicy::cursor_based_pagination(field, key_args))
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_table_covers_paginated_query_fields() {
		let policies = CachePolicies::default();

		assert_eq!(policies.len(), 9);
		assert_eq!(
			policies.get("publications").map(|policy| &policy.key_args),
			Some(&KeyArgs::request(["profileId", "commentsOf", "publicationTypes"]))
		);
		assert!(policies.get("profile").is_none());
	}

	#[test]
	fn storage_key_ignores_cursor_and_limit() {
		let policy = FieldPolicy::cursor_based_pagination("timeline", KeyArgs::request(["profileId"]));
		let first = serde_json::json!({ "request": { "profileId": "0x01", "limit": 10 } });
		let second =
			serde_json::json!({ "request": { "profileId": "0x01", "cursor": "c1", "limit": 20 } });
		let other = serde_json::json!({ "request": { "profileId": "0x02" } });

		assert_eq!(policy.storage_key(&first), r#"timeline:{"request":{"profileId":"0x01"}}"#);
		assert_eq!(policy.storage_key(&first), policy.storage_key(&second));
		assert_ne!(policy.storage_key(&first), policy.storage_key(&other));
	}

	#[test]
	fn nested_selection_orders_keys_and_skips_absent_arguments() {
		let key_args = KeyArgs::request(["type", "query"]).arg("sources");
		let selected = key_args.select(&serde_json::json!({
			"request": { "type": "PROFILE", "query": "lens", "limit": 5 },
		}));

		assert_eq!(selected, serde_json::json!({ "request": { "query": "lens", "type": "PROFILE" } }));
		assert_eq!(KeyArgs::new().select(&JsonValue::Null), serde_json::json!({}));
	}
}
