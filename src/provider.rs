//! Provider-facing descriptors (data) and mint strategies (behavior).
//!
//! `descriptor` holds the validated endpoint set, client authentication preference, and the
//! wire-level names (scope delimiter, account parameter, account/idempotency headers) that
//! differ between deployments. `strategy` defines [`MintStrategy`], the hook used to decorate
//! token requests and classify token endpoint failures.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
