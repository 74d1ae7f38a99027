//! Optional observability helpers for operations and background refreshes.
//!
//! # Feature Flags
//!
//! - `tracing`: `graphql_auth_link.flow` spans carrying `flow`, `stage` and the GraphQL
//!   `operation` name, plus refresh failure and settlement logs.
//! - `metrics`: `graphql_auth_link_flow_total{flow, outcome}` per flow, and
//!   `graphql_auth_link_refresh_total{result}` per settled background refresh.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Fixed message logged when a background refresh fails.
pub const REFRESH_ERROR_MESSAGE: &str = "Something went wrong!";

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Operation executed through a client's link chain.
	Operation,
	/// Authentication link deciding which credential to attach.
	Authorize,
	/// Background refresh of the credential pair.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Operation => "operation",
			FlowKind::Authorize => "authorize",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure reported to the caller or logged.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
