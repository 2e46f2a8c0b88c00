// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how a [`TokenCache`](crate::cache::TokenCache) served
/// its callers.
#[derive(Debug, Default)]
pub struct FetchMetrics {
	fetches: AtomicU64,
	failures: AtomicU64,
	hits: AtomicU64,
	shared: AtomicU64,
}
impl FetchMetrics {
	/// Returns the number of authentication requests issued.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of authentication requests that failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of calls answered from the cache.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that waited on another caller's fetch.
	pub fn shared_waits(&self) -> u64 {
		self.shared.load(Ordering::Relaxed)
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_shared(&self) {
		self.shared.fetch_add(1, Ordering::Relaxed);
	}
}
