//! Optional observability helpers for token acquisition and request dispatch.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `moov_client.operation` with the
//!   `operation` and `stage` fields, plus debug/warn events for cache hits, mints, and
//!   retries.
//! - Enable `metrics` to increment the `moov_client_operation_total` counter for every
//!   attempt, cache hit, retry, success, and failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Token lookup (cache or mint) for a scope/account pair.
	Acquire,
	/// Token endpoint exchange.
	Mint,
	/// Resource endpoint request, including its post-401 retry.
	Dispatch,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Acquire => "acquire",
			OperationKind::Mint => "mint",
			OperationKind::Dispatch => "dispatch",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Token served from the cache without a mint.
	CacheHit,
	/// Request re-issued after a `401` response.
	Retry,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::CacheHit => "cache_hit",
			OperationOutcome::Retry => "retry",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the outcome as a metric and, when tracing is enabled, as an event.
///
/// Retries and failures are emitted at `warn`; everything else at `debug`.
pub fn observe(kind: OperationKind, outcome: OperationOutcome, detail: &str) {
	record_operation_outcome(kind, outcome);
	emit_event(kind, outcome, detail);
}
