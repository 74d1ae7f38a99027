// self
use crate::{
	obs::{FlowKind, FlowOutcome},
	refresh::RefreshOutcome,
};

/// Increments `graphql_auth_link_flow_total{flow, outcome}`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"graphql_auth_link_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Increments `graphql_auth_link_refresh_total{result}` with `refreshed`, `reused`, or `failed`.
///
/// Separates coalesced reuse from network rotations, which the flow counter folds into one
/// success label.
pub fn record_refresh_settled(outcome: &RefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("graphql_auth_link_refresh_total", "result" => outcome.label()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
