//! Time sources used for token expiry decisions.
//!
//! The authority never reads the wall clock directly; it asks an injected [`Clock`], so tests
//! can fast-forward through token lifetimes with [`ManualClock`].

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for deterministic expiry tests.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward (or backward, for negative durations).
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps to an absolute instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(OffsetDateTime::UNIX_EPOCH)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn manual_clock_moves_only_when_told() {
		let clock = ManualClock::new(macros::datetime!(2025-06-01 12:00 UTC));
		let shared = clock.clone();

		assert_eq!(clock.now(), macros::datetime!(2025-06-01 12:00 UTC));

		shared.advance(Duration::minutes(90));

		assert_eq!(clock.now(), macros::datetime!(2025-06-01 13:30 UTC));

		clock.set(macros::datetime!(2030-01-01 00:00 UTC));

		assert_eq!(shared.now(), macros::datetime!(2030-01-01 00:00 UTC));
	}

	#[test]
	fn system_clock_tracks_wall_time() {
		let before = OffsetDateTime::now_utc();
		let observed = SystemClock.now();

		assert!(observed >= before);
	}
}
