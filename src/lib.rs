//! Typed async client for the Moov payments API.
//!
//! Every call resolves a bearer token scoped to the operation's capability set (and, for
//! connected-account operations, to the sub-account) through a [`TokenAuthority`], which mints
//! tokens with the client-credentials grant, caches them per scope/account, and coalesces
//! concurrent mints. The [`RequestDispatcher`] attaches the token and account headers, performs
//! the exchange, and retries exactly once after a `401`.
//!
//! [`TokenAuthority`]: authority::TokenAuthority
//! [`RequestDispatcher`]: dispatch::RequestDispatcher

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod client;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod resources;
pub mod store;

pub use client::Client;
#[cfg(feature = "reqwest")] pub use client::MoovClient;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::OnceCell as AsyncOnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
