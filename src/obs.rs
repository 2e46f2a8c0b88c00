//! Optional observability helpers for token cache accessors.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `conjur_authn.token` with the `mode`
//!   (blocking or async caller) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `conjur_authn_token_total` counter for every
//!   attempt/hit/shared wait/fetch success/fetch failure, labeled by `mode` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Calling convention of the accessor that produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
	/// The caller blocks its thread while waiting.
	Blocking,
	/// The caller suspends its task while waiting.
	Async,
}
impl AccessMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessMode::Blocking => "blocking",
			AccessMode::Async => "async",
		}
	}
}
impl Display for AccessMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each accessor call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessOutcome {
	/// Entry to an accessor.
	Attempt,
	/// A valid cached token was returned.
	Hit,
	/// The caller waited on a fetch started by someone else.
	Shared,
	/// The caller's own fetch succeeded.
	Fetched,
	/// A failure was propagated back to the caller.
	Failure,
}
impl AccessOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessOutcome::Attempt => "attempt",
			AccessOutcome::Hit => "hit",
			AccessOutcome::Shared => "shared",
			AccessOutcome::Fetched => "fetched",
			AccessOutcome::Failure => "failure",
		}
	}
}
impl Display for AccessOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
