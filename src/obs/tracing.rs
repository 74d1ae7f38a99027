// self
use crate::{_prelude::*, obs::FlowKind, refresh::RefreshOutcome};

/// Future returned by [`FlowSpan::instrument`]; the bare future when `tracing` is off.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; the bare future when `tracing` is off.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `graphql_auth_link.flow` span covering one operation, link decision, or refresh.
///
/// The `operation` field starts empty and is filled by [`FlowSpan::with_operation`] once the
/// GraphQL operation name is known.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at call site `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"graphql_auth_link.flow",
				flow = kind.as_str(),
				stage,
				operation = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Records the operation name; anonymous operations leave the field empty.
	pub fn with_operation(self, name: Option<&str>) -> Self {
		#[cfg(feature = "tracing")]
		{
			if let Some(name) = name {
				self.span.record("operation", name);
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = name;
		}

		self
	}

	/// Enters the span for the synchronous link decision.
	pub fn entered(self) -> FlowSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FlowSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FlowSpanGuard {}
		}
	}

	/// Attaches the span to a response or refresh future.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Keeps a [`FlowSpan`] entered until dropped.
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}

/// Logs the fixed refresh failure message; the error itself is attached as a field.
pub fn log_refresh_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(error = %error, "{}", crate::obs::REFRESH_ERROR_MESSAGE);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Logs how a background refresh settled.
pub fn log_refresh_settled(outcome: &RefreshOutcome) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(result = outcome.label(), "Background refresh settled.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = outcome;
	}
}

/// Logs that absent or placeholder credentials were cleared before forwarding.
pub fn log_credentials_cleared() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("No usable access token; cleared stored credentials.");
	}
}
