//! Single-flight bearer-token cache for Conjur-style secrets APIs.
//!
//! One [`cache::TokenCache`] serves both blocking threads and async tasks from the same
//! critical section, so concurrent callers collapse onto a single authentication request
//! per token lifetime no matter how they wait.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authn;
pub mod cache;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod id;
pub mod obs;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, MutexGuardArc as AsyncMutexGuardArc};
	pub use parking_lot::{Condvar, Mutex};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
