// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for resource requests.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	calls: AtomicU64,
	retries: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of `execute` calls.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns the number of requests re-issued after a `401`.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that produced a payload.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that surfaced an error.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
