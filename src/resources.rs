//! Typed resource wrappers over [`RequestDispatcher::execute`](crate::dispatch::RequestDispatcher::execute).
//!
//! Wrappers only map arguments onto [`RequestSpec`](crate::dispatch::RequestSpec)s and decode
//! the responses; token scoping, account headers, and the post-401 retry are handled by the
//! dispatcher.

pub mod accounts;
pub mod cards;
pub mod common;
pub mod enrichment;
pub mod transfers;

pub use accounts::*;
pub use cards::*;
pub use common::*;
pub use enrichment::*;
pub use transfers::*;
