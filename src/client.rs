//! Client facade tying the link chain to the pagination cache.
//!
//! [`ClientBuilder::build`] produces the authenticated client (an [`AuthLink`] in front of an
//! [`HttpLink`]); [`ClientBuilder::build_node`] produces the unauthenticated node client that
//! posts straight to the endpoint. Clients built from one builder share a [`PaginationCache`].

// crates.io
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	cache::{CachePolicies, PaginatedPage, PaginationCache},
	config::ClientConfig,
	http::GraphQlTransport,
	link::{AuthLink, HttpLink, LinkChain},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	operation::{GraphQlRequest, GraphQlResponse, Operation},
	refresh::{RefreshClient, RefreshMetrics},
	store::{CredentialStore, MemoryStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
#[cfg(not(feature = "reqwest"))] use crate::error::ConfigError;

/// GraphQL client executing operations through a link chain.
#[derive(Clone)]
pub struct Client {
	chain: LinkChain,
	cache: PaginationCache,
	policies: Arc<CachePolicies>,
	refresh_metrics: Option<Arc<RefreshMetrics>>,
}
impl Client {
	/// Starts a builder for clients targeting `config.api_url`.
	pub fn builder(config: ClientConfig) -> ClientBuilder {
		ClientBuilder::new(config)
	}

	/// Wraps an arbitrary chain; the chain must end in a terminating link.
	pub fn from_chain(chain: LinkChain, policies: CachePolicies, cache: PaginationCache) -> Self {
		Self { chain, cache, policies: Arc::new(policies), refresh_metrics: None }
	}

	/// Runs `operation` through the chain and merges paginated fields into the cache.
	///
	/// Errors raised before forwarding (an undecodable access token, a missing runtime)
	/// surface here unchanged.
	pub async fn execute(&self, operation: Operation) -> Result<GraphQlResponse> {
		const KIND: FlowKind = FlowKind::Operation;

		let span = FlowSpan::new(KIND, "execute").with_operation(operation.name());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let variables = operation.request.variables.clone();
		let result = match self.chain.execute(operation) {
			Ok(response) => span.instrument(response).await,
			Err(e) => Err(e),
		};

		match &result {
			Ok(response) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.absorb(response, &variables);
			},
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Executes `request` and returns its data, converting GraphQL errors into
	/// [`Error::Rejected`].
	pub async fn query(&self, request: GraphQlRequest) -> Result<JsonValue> {
		self.execute(request.into()).await?.into_data()
	}

	/// Merged list cached for `field` under `args`, if the field has a policy.
	pub fn cached_page(&self, field: &str, args: &JsonValue) -> Option<PaginatedPage> {
		self.cache.read(self.policies.get(field)?, args)
	}

	/// Shared pagination cache.
	pub fn cache(&self) -> &PaginationCache {
		&self.cache
	}

	/// Field policies applied to responses.
	pub fn policies(&self) -> &CachePolicies {
		&self.policies
	}

	/// Refresh counters of the authentication link; `None` for node clients.
	pub fn refresh_metrics(&self) -> Option<&Arc<RefreshMetrics>> {
		self.refresh_metrics.as_ref()
	}

	// Field arguments are read from the operation variables, which is where paginated
	// queries pass their `request` input.
	fn absorb(&self, response: &GraphQlResponse, variables: &JsonValue) {
		let Some(JsonValue::Object(data)) = &response.data else {
			return;
		};

		for (field, value) in data {
			let Some(policy) = self.policies.get(field) else {
				continue;
			};

			if !value.is_object() {
				continue;
			}

			match serde_json::from_value::<PaginatedPage>(value.clone()) {
				Ok(page) => {
					self.cache.write(policy, variables, page);
				},
				Err(e) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(field = %field, error = %e, "Skipped caching a malformed page.");
					#[cfg(not(feature = "tracing"))]
					let _ = e;
				},
			}
		}
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("chain", &self.chain)
			.field("policies", &self.policies.len())
			.field("authenticated", &self.refresh_metrics.is_some())
			.finish()
	}
}

/// Builder for authenticated and node [`Client`]s sharing one cache.
pub struct ClientBuilder {
	config: ClientConfig,
	store: Arc<dyn CredentialStore>,
	transport: Option<Arc<dyn GraphQlTransport>>,
	policies: CachePolicies,
	cache: PaginationCache,
	runtime: Option<Handle>,
}
impl ClientBuilder {
	fn new(config: ClientConfig) -> Self {
		Self {
			config,
			store: Arc::new(MemoryStore::default()),
			transport: None,
			policies: CachePolicies::default(),
			cache: PaginationCache::default(),
			runtime: None,
		}
	}

	/// Replaces the default in-memory credential store.
	pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
		self.store = store;

		self
	}

	/// Replaces the default reqwest transport.
	pub fn with_transport(mut self, transport: Arc<dyn GraphQlTransport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Replaces the default field policies.
	pub fn with_policies(mut self, policies: CachePolicies) -> Self {
		self.policies = policies;

		self
	}

	/// Shares an existing cache instead of starting an empty one.
	pub fn with_cache(mut self, cache: PaginationCache) -> Self {
		self.cache = cache;

		self
	}

	/// Pins background refreshes to `runtime`.
	pub fn with_runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);

		self
	}

	/// Credential store handed to the authentication link.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Builds the authenticated client.
	pub fn build(&self) -> Result<Client> {
		let transport = self.transport()?;
		let refresher = RefreshClient::new(transport.clone(), self.config.api_url.clone());
		let mut auth = AuthLink::from_config(self.store.clone(), refresher, &self.config);

		if let Some(runtime) = &self.runtime {
			auth = auth.with_runtime(runtime.clone());
		}

		let refresh_metrics = auth.metrics().clone();
		let chain = LinkChain::from_link(auth)
			.concat(HttpLink::new(transport, self.config.api_url.clone()));

		Ok(Client {
			chain,
			cache: self.cache.clone(),
			policies: Arc::new(self.policies.clone()),
			refresh_metrics: Some(refresh_metrics),
		})
	}

	/// Builds the node client: no authentication link, same endpoint and cache.
	pub fn build_node(&self) -> Result<Client> {
		let link = HttpLink::new(self.transport()?, self.config.api_url.clone());
		let chain = LinkChain::from_link(link);

		Ok(Client::from_chain(chain, self.policies.clone(), self.cache.clone()))
	}

	fn transport(&self) -> Result<Arc<dyn GraphQlTransport>> {
		if let Some(transport) = &self.transport {
			return Ok(transport.clone());
		}

		#[cfg(feature = "reqwest")]
		{
			Ok(Arc::new(ReqwestTransport::new()?))
		}
		#[cfg(not(feature = "reqwest"))]
		{
			Err(ConfigError::MissingTransport.into())
		}
	}
}
impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("config", &self.config)
			.field("custom_transport", &self.transport.is_some())
			.field("policies", &self.policies.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn timeline_response(items: &[&str], next: &str) -> GraphQlResponse {
		GraphQlResponse::from_data(serde_json::json!({
			"timeline": {
				"items": items,
				"pageInfo": { "prev": null, "next": next, "totalCount": null },
			},
			"profile": { "id": "0x01" },
		}))
	}

	struct PagedLink(Mutex<Vec<GraphQlResponse>>);
	impl crate::link::Link for PagedLink {
		fn request<'a>(
			&'a self,
			_operation: Operation,
			_forward: crate::link::Forward<'a>,
		) -> Result<crate::link::LinkFuture<'a>> {
			let response = self.0.lock().remove(0);

			Ok(Box::pin(async move { Ok(response) }))
		}
	}

	#[tokio::test]
	async fn execute_merges_policy_fields_into_cache() {
		let link = PagedLink(Mutex::new(vec![
			timeline_response(&["a", "b"], "c1"),
			timeline_response(&["c"], "c2"),
		]));
		let client = Client::from_chain(
			LinkChain::from_link(link),
			CachePolicies::default(),
			PaginationCache::default(),
		);
		let first = GraphQlRequest::new("query Timeline { timeline { items } }")
			.with_variables(serde_json::json!({ "request": { "profileId": "0x01" } }));
		let next = GraphQlRequest::new("query Timeline { timeline { items } }")
			.with_variables(serde_json::json!({ "request": { "profileId": "0x01", "cursor": "c1" } }));

		client.query(first).await.expect("First page should succeed.");
		client.query(next).await.expect("Second page should succeed.");

		let page = client
			.cached_page("timeline", &serde_json::json!({ "request": { "profileId": "0x01" } }))
			.expect("Timeline should be cached.");

		assert_eq!(page.items, vec!["a", "b", "c"]);
		assert_eq!(client.cache().len(), 1);
		assert!(client.refresh_metrics().is_none());
	}

	#[test]
	fn clients_from_one_builder_share_cache() {
		let builder = Client::builder(test_config("http://127.0.0.1:9/graphql"))
			.with_transport(Arc::new(crate::http::ReqwestTransport::default()));
		let client = builder.build().expect("Authenticated client should build.");
		let node = builder.build_node().expect("Node client should build.");
		let policy = client.policies().get("followers").expect("Followers policy should exist.");
		let args = serde_json::json!({ "request": { "profileId": "0x01" } });

		client.cache().write(policy, &args, PaginatedPage::default());

		assert_eq!(node.cache().len(), 1);
		assert!(node.cached_page("followers", &args).is_some());
		assert!(client.refresh_metrics().is_some());
		assert!(node.refresh_metrics().is_none());
	}
}
