// self
use crate::{
	_prelude::*,
	obs::{OperationKind, OperationOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by the authority and the dispatcher.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("moov_client.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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

/// Emits a structured event for the outcome (when tracing is enabled).
pub fn emit_event(kind: OperationKind, outcome: OperationOutcome, detail: &str) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			OperationOutcome::Retry | OperationOutcome::Failure => tracing::warn!(
				operation = kind.as_str(),
				outcome = outcome.as_str(),
				detail,
				"operation degraded"
			),
			_ => tracing::debug!(
				operation = kind.as_str(),
				outcome = outcome.as_str(),
				detail,
				"operation progressed"
			),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, outcome, detail);
	}
}
