//! Authentication link: attaches the stored access token and refreshes it in the background.
//!
//! For every operation the link reads the access token from the [`CredentialStore`]. Absent or
//! placeholder values clear both entries and the operation goes out unauthenticated. Otherwise
//! the token is attached as `x-access-token: Bearer <token>` and its `exp` claim is checked;
//! an expired token starts a background refresh on the Tokio runtime and, under the default
//! [`ExpiredTokenPolicy::ForwardStale`], the operation is forwarded at once with the expired
//! token. The refreshed pair is persisted for later operations.

// crates.io
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, CredentialStatus, TokenSecret},
	config::{ClientConfig, ExpiredTokenPolicy, RefreshFailurePolicy, RefreshMode},
	error::ConfigError,
	link::{Forward, Link, LinkFuture},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	operation::{ACCESS_TOKEN_HEADER, Operation},
	refresh::{RefreshClient, RefreshHandle, RefreshMetrics, RefreshOutcome},
	store::{self, CookieAttributes, CredentialStore},
};

/// Request interceptor that authorizes operations from the credential store.
#[derive(Clone)]
pub struct AuthLink {
	store: Arc<dyn CredentialStore>,
	refresher: Arc<RefreshClient>,
	cookie: CookieAttributes,
	mode: RefreshMode,
	expired_policy: ExpiredTokenPolicy,
	failure_policy: RefreshFailurePolicy,
	runtime: Option<Handle>,
	metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl AuthLink {
	/// Creates a link with the default cookie profile and refresh policies.
	pub fn new(store: Arc<dyn CredentialStore>, refresher: RefreshClient) -> Self {
		Self {
			store,
			refresher: Arc::new(refresher),
			cookie: CookieAttributes::default(),
			mode: RefreshMode::default(),
			expired_policy: ExpiredTokenPolicy::default(),
			failure_policy: RefreshFailurePolicy::default(),
			runtime: None,
			metrics: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Creates a link whose cookie profile and policies come from `config`.
	pub fn from_config(
		store: Arc<dyn CredentialStore>,
		refresher: RefreshClient,
		config: &ClientConfig,
	) -> Self {
		Self::new(store, refresher)
			.with_cookie_attributes(config.cookie)
			.with_refresh_mode(config.refresh_mode)
			.with_expired_policy(config.expired_policy)
			.with_failure_policy(config.failure_policy)
	}

	/// Overrides the attribute profile used when persisting a refreshed pair.
	pub fn with_cookie_attributes(mut self, cookie: CookieAttributes) -> Self {
		self.cookie = cookie;

		self
	}

	/// Overrides the refresh coordination mode.
	pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
		self.mode = mode;

		self
	}

	/// Overrides the expired-token policy.
	pub fn with_expired_policy(mut self, policy: ExpiredTokenPolicy) -> Self {
		self.expired_policy = policy;

		self
	}

	/// Overrides the refresh failure policy.
	pub fn with_failure_policy(mut self, policy: RefreshFailurePolicy) -> Self {
		self.failure_policy = policy;

		self
	}

	/// Pins background refreshes to `runtime` instead of the ambient Tokio runtime.
	pub fn with_runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);

		self
	}

	/// Shared refresh counters.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	fn dispatch_refresh(
		&self,
		stale: &TokenSecret,
		refresh_token: Option<TokenSecret>,
	) -> Result<RefreshHandle> {
		let runtime = match &self.runtime {
			Some(runtime) => runtime.clone(),
			None => Handle::try_current().map_err(|_| ConfigError::MissingRuntime)?,
		};
		let (handle, reporter) = RefreshHandle::channel();
		let task = RefreshTask {
			store: self.store.clone(),
			refresher: self.refresher.clone(),
			cookie: self.cookie,
			mode: self.mode,
			failure_policy: self.failure_policy,
			metrics: self.metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
			stale: stale.clone(),
			refresh_token,
		};

		runtime.spawn(async move {
			let outcome = task.run().await;

			reporter.report(outcome);
		});

		Ok(handle)
	}
}
impl Link for AuthLink {
	fn request<'a>(
		&'a self,
		mut operation: Operation,
		forward: Forward<'a>,
	) -> Result<LinkFuture<'a>> {
		let _span =
			FlowSpan::new(FlowKind::Authorize, "auth_link").with_operation(operation.name()).entered();
		let Some(access_token) = store::load_access_token(self.store.as_ref())? else {
			store::clear_pair(self.store.as_ref())?;
			obs::log_credentials_cleared();

			return forward.call(operation);
		};

		operation.context.set_header(ACCESS_TOKEN_HEADER, access_token.bearer());

		let status = CredentialStatus::classify(Some(&access_token), OffsetDateTime::now_utc())?;

		if status != CredentialStatus::Expired {
			return forward.call(operation);
		}

		// The refresh uses the token stored when the operation was intercepted.
		let refresh_token = store::load_refresh_token(self.store.as_ref())?;
		let handle = self.dispatch_refresh(&access_token, refresh_token)?;

		operation.context.set_refresh(handle.clone());

		match self.expired_policy {
			ExpiredTokenPolicy::ForwardStale => forward.call(operation),
			ExpiredTokenPolicy::AwaitRefresh => Ok(Box::pin(async move {
				if let Some(pair) = handle.settled().await.pair() {
					operation.context.set_header(ACCESS_TOKEN_HEADER, pair.access_token.bearer());
				}

				forward.call(operation)?.await
			})),
		}
	}
}
impl Debug for AuthLink {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthLink")
			.field("refresher", &self.refresher)
			.field("cookie", &self.cookie)
			.field("mode", &self.mode)
			.field("expired_policy", &self.expired_policy)
			.field("failure_policy", &self.failure_policy)
			.finish()
	}
}

/// State moved onto the runtime for one background refresh.
struct RefreshTask {
	store: Arc<dyn CredentialStore>,
	refresher: Arc<RefreshClient>,
	cookie: CookieAttributes,
	mode: RefreshMode,
	failure_policy: RefreshFailurePolicy,
	metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
	stale: TokenSecret,
	refresh_token: Option<TokenSecret>,
}
impl RefreshTask {
	async fn run(self) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "background_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span.instrument(self.settle()).await;

		obs::log_refresh_settled(&outcome);
		obs::record_refresh_settled(&outcome);

		if outcome.is_success() {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);
		} else {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
		}

		outcome
	}

	async fn settle(&self) -> RefreshOutcome {
		let _singleflight = match self.mode {
			RefreshMode::Coalesced => Some(self.refresh_guard.lock().await),
			RefreshMode::Independent => None,
		};

		self.metrics.record_attempt();

		if self.mode == RefreshMode::Coalesced {
			match store::load_pair(self.store.as_ref()) {
				Ok(Some(current)) if self.is_rotated(&current) => {
					self.metrics.record_reuse();

					return RefreshOutcome::Reused(current);
				},
				Ok(_) => (),
				Err(err) => return self.fail(err.into()),
			}
		}

		match self.rotate().await {
			Ok(pair) => {
				self.metrics.record_success();

				RefreshOutcome::Refreshed(pair)
			},
			Err(err) => self.fail(err),
		}
	}

	// Another task rotated the pair when the stored access token changed and is usable.
	fn is_rotated(&self, current: &CredentialPair) -> bool {
		current.access_token != self.stale
			&& matches!(
				current.status_at(OffsetDateTime::now_utc()),
				Ok(CredentialStatus::Valid)
			)
	}

	async fn rotate(&self) -> Result<CredentialPair> {
		let refresh_token = self.refresh_token.as_ref().ok_or(ConfigError::MissingRefreshToken)?;
		let pair = self.refresher.refresh(refresh_token).await?;

		store::save_pair(self.store.as_ref(), &pair, &self.cookie)?;

		Ok(pair)
	}

	fn fail(&self, err: Error) -> RefreshOutcome {
		obs::log_refresh_failure(&err);
		self.metrics.record_failure();

		let cleared = match self.failure_policy {
			RefreshFailurePolicy::RetainStale => Ok(()),
			RefreshFailurePolicy::ClearCredentials => store::clear_pair(self.store.as_ref()),
		};

		if let Err(clear_err) = cleared {
			obs::log_refresh_failure(&clear_err.into());
		}

		RefreshOutcome::Failed { reason: err.to_string() }
	}
}
