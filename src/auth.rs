//! Auth-domain identifiers, credentials, scope sets, and token models.

pub mod credential;
pub mod id;
pub mod scope;
pub mod token;

pub use credential::*;
pub use id::*;
pub use scope::*;
pub use token::{record::*, secret::*};
