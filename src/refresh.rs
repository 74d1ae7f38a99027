//! Refresh mutation client and the handles of background refresh tasks.
//!
//! [`RefreshClient`] exchanges the stored refresh token for a new [`CredentialPair`] by posting
//! the `Refresh` mutation. The authentication link runs it on a background task and hands out a
//! [`RefreshHandle`] so callers can await the [`RefreshOutcome`] without the forwarding path
//! ever blocking on it.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	error::TransientError,
	http::GraphQlTransport,
	operation::{GraphQlError, GraphQlRequest, join_messages},
};

/// Operation name of the refresh mutation.
pub const REFRESH_OPERATION_NAME: &str = "Refresh";
/// Refresh mutation document.
pub const REFRESH_MUTATION: &str = "
  mutation Refresh($request: RefreshRequest!) {
    refresh(request: $request) {
      accessToken
      refreshToken
    }
  }
";

#[derive(Deserialize)]
struct RefreshEnvelope {
	#[serde(default)]
	data: Option<RefreshData>,
	#[serde(default)]
	errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct RefreshData {
	#[serde(default)]
	refresh: Option<CredentialPair>,
}

/// Posts the refresh mutation to the API endpoint.
#[derive(Clone)]
pub struct RefreshClient {
	transport: Arc<dyn GraphQlTransport>,
	endpoint: Url,
}
impl RefreshClient {
	/// Creates a client that posts to `endpoint` through `transport`.
	pub fn new(transport: Arc<dyn GraphQlTransport>, endpoint: Url) -> Self {
		Self { transport, endpoint }
	}

	/// Endpoint the mutation is posted to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Builds the mutation body carrying `refresh_token` as `request.refreshToken`.
	pub fn build_request(refresh_token: &TokenSecret) -> GraphQlRequest {
		GraphQlRequest::new(REFRESH_MUTATION)
			.with_operation_name(REFRESH_OPERATION_NAME)
			.with_variables(serde_json::json!({
				"request": { "refreshToken": refresh_token.expose() }
			}))
	}

	/// Exchanges `refresh_token` for a new credential pair.
	///
	/// GraphQL errors map to [`Error::Rejected`]; a response without a `refresh` payload maps to
	/// [`TransientError::MissingPayload`] so an absent pair is never persisted.
	pub async fn refresh(&self, refresh_token: &TokenSecret) -> Result<CredentialPair> {
		let request = Self::build_request(refresh_token);
		let headers = BTreeMap::new();
		let response = self.transport.send(&self.endpoint, &request, &headers).await?;
		let envelope = response.json::<RefreshEnvelope>()?;

		if !envelope.errors.is_empty() {
			return Err(Error::Rejected { reason: join_messages(&envelope.errors) });
		}

		envelope
			.data
			.and_then(|data| data.refresh)
			.ok_or_else(|| TransientError::MissingPayload { field: "refresh" }.into())
	}
}
impl Debug for RefreshClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshClient").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

/// Settled state of a background refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// The server issued a new pair, which was persisted.
	Refreshed(CredentialPair),
	/// Another task rotated the pair first; the stored pair was reused without a network call.
	Reused(CredentialPair),
	/// The refresh failed; stored credentials follow the configured failure policy.
	Failed {
		/// Rendered error.
		reason: String,
	},
}
impl RefreshOutcome {
	/// Pair that is current after the refresh, if it succeeded.
	pub fn pair(&self) -> Option<&CredentialPair> {
		match self {
			Self::Refreshed(pair) | Self::Reused(pair) => Some(pair),
			Self::Failed { .. } => None,
		}
	}

	/// Returns `true` for [`RefreshOutcome::Refreshed`] and [`RefreshOutcome::Reused`].
	pub fn is_success(&self) -> bool {
		self.pair().is_some()
	}

	/// Stable label used by logs and the refresh counter.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Refreshed(_) => "refreshed",
			Self::Reused(_) => "reused",
			Self::Failed { .. } => "failed",
		}
	}
}

/// Completion channel of a background refresh task.
///
/// Handles are cheap to clone; every clone observes the same outcome.
#[derive(Clone, Debug)]
pub struct RefreshHandle(watch::Receiver<Option<RefreshOutcome>>);
impl RefreshHandle {
	pub(crate) fn channel() -> (Self, RefreshReporter) {
		let (tx, rx) = watch::channel(None);

		(Self(rx), RefreshReporter(tx))
	}

	/// Returns the outcome if the task already settled.
	pub fn outcome(&self) -> Option<RefreshOutcome> {
		self.0.borrow().clone()
	}

	/// Returns `true` once the task reported an outcome.
	pub fn is_settled(&self) -> bool {
		self.0.borrow().is_some()
	}

	/// Waits for the task to settle.
	///
	/// A task dropped before reporting (for example when its runtime shuts down) settles as
	/// [`RefreshOutcome::Failed`].
	pub async fn settled(&self) -> RefreshOutcome {
		let mut rx = self.0.clone();
		let settled = rx.wait_for(Option::is_some).await.map(|outcome| outcome.clone());

		match settled {
			Ok(Some(outcome)) => outcome,
			_ => RefreshOutcome::Failed { reason: TransientError::RefreshAborted.to_string() },
		}
	}
}

pub(crate) struct RefreshReporter(watch::Sender<Option<RefreshOutcome>>);
impl RefreshReporter {
	pub(crate) fn report(self, outcome: RefreshOutcome) {
		self.0.send_replace(Some(outcome));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_body_matches_wire_contract() {
		let request = RefreshClient::build_request(&TokenSecret::new("R1"));
		let body = serde_json::to_value(&request).expect("Refresh request should serialize.");

		assert_eq!(body["operationName"], "Refresh");
		assert_eq!(body["variables"], serde_json::json!({ "request": { "refreshToken": "R1" } }));
		assert!(body["query"].as_str().is_some_and(|query| query.contains("RefreshRequest!")));
	}

	#[tokio::test]
	async fn handle_reports_outcome_to_every_clone() {
		let (handle, reporter) = RefreshHandle::channel();
		let clone = handle.clone();

		assert!(!handle.is_settled());

		reporter.report(RefreshOutcome::Refreshed(CredentialPair::new("A2", "R2")));

		assert_eq!(clone.settled().await.pair(), Some(&CredentialPair::new("A2", "R2")));
		assert!(handle.is_settled());
	}

	#[tokio::test]
	async fn dropped_reporter_settles_as_failure() {
		let (handle, reporter) = RefreshHandle::channel();

		drop(reporter);

		assert!(!handle.settled().await.is_success());
	}
}
