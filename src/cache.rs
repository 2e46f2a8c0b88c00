//! Single-flight token cache shared by blocking and async callers.
//!
//! [`TokenCache`] owns the token lifecycle for one identity. Both accessors,
//! [`TokenCache::token_blocking`] and [`TokenCache::token`], run the same state machine
//! against one [`AsyncMutex`], which can be acquired either by parking the thread or by
//! suspending the task. The first caller that finds neither a valid token nor an in-flight
//! fetch opens a flight; everyone else joins it, again either blocking or suspending, and
//! receives the very same outcome.
//!
//! A flight owns the progress of its fetch. Whoever holds the flight's lock advances it, so a
//! caller that gives up mid-request leaves the request to the next holder instead of
//! throwing it away.
//!
//! Every cached token arms an [`ExpiryTimer`] scoped to the token's epoch, so a late alarm
//! for an older token can never invalidate a newer one.

/// Fetch counters exposed by [`TokenCache::metrics`].
pub mod metrics;

mod timer;

pub use metrics::FetchMetrics;

// crates.io
use futures::executor;
// self
use crate::{
	_prelude::*,
	authn::{Secret, TokenFetcher, token_lifetime},
	cache::timer::ExpiryTimer,
	config::ClientConfig,
	credential::CredentialSupplier,
	error::ConfigError,
	http::HttpTransport,
	obs::{self, AccessMode, AccessOutcome, AccessSpan, trace_event},
};

type Outcome = Result<Secret>;
type FetchFuture = Pin<Box<dyn Future<Output = Outcome> + Send>>;
type Flight = AsyncMutex<FlightSlot>;
type FlightGuard = AsyncMutexGuardArc<FlightSlot>;

/// Diagnostic view of the cache state.
///
/// `token` may hold a stale value after expiration; accessors never return it then.
#[derive(Clone, Debug)]
pub struct TokenStatus {
	/// Last successfully fetched token, if any.
	pub token: Option<Secret>,
	/// Whether `token` would be returned by an accessor right now.
	pub valid: bool,
	/// Whether a fetch is running or waiting to be resumed.
	pub fetch_in_flight: bool,
	/// Number of tokens cached so far.
	pub epoch: u64,
	/// When the current expiration alarm fires, if one is armed.
	pub expires_at: Option<OffsetDateTime>,
}

/// Thread- and task-safe token cache with single-flight fetches.
///
/// Cloning is cheap and every clone shares the same state.
pub struct TokenCache<C>
where
	C: ?Sized + HttpTransport,
{
	shared: Arc<Shared<C>>,
}
impl<C> TokenCache<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates an empty cache for the supplier's identity.
	pub fn new(
		config: &ClientConfig,
		supplier: Arc<dyn CredentialSupplier>,
		http: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let fetcher = TokenFetcher::new(config, supplier, http)?;

		Ok(Self::with_fetcher(fetcher, config.token_ttl, config.refresh_margin))
	}

	/// Creates an empty cache around an existing fetcher.
	pub fn with_fetcher(
		fetcher: TokenFetcher<C>,
		token_ttl: Duration,
		refresh_margin: Duration,
	) -> Self {
		Self {
			shared: Arc::new(Shared {
				state: AsyncMutex::new(TokenState::default()),
				fetcher: Arc::new(fetcher),
				token_ttl,
				refresh_margin,
				metrics: FetchMetrics::default(),
			}),
		}
	}

	/// Returns a valid token, blocking the calling thread while a fetch runs.
	///
	/// Call it from plain threads or `spawn_blocking` sections; parking an async worker here
	/// can starve the task whose fetch it is waiting on. If an async caller abandoned the
	/// current fetch midway, this accessor finishes that request on the calling thread, so
	/// with a transport whose futures need a runtime context it must run inside one.
	pub fn token_blocking(&self) -> Result<Secret> {
		const MODE: AccessMode = AccessMode::Blocking;

		let _span = AccessSpan::new(MODE, "token_blocking").entered();

		obs::record_access_outcome(MODE, AccessOutcome::Attempt);

		finish(MODE, self.resolve_blocking())
	}

	/// Returns a valid token, suspending the calling task while a fetch runs.
	///
	/// Dropping the returned future never cancels the fetch. The request stays with the
	/// flight and the next caller, blocking or async, resumes it and caches its result.
	pub async fn token(&self) -> Result<Secret> {
		const MODE: AccessMode = AccessMode::Async;

		let span = AccessSpan::new(MODE, "token");

		obs::record_access_outcome(MODE, AccessOutcome::Attempt);

		finish(MODE, span.instrument(self.resolve()).await)
	}

	/// Marks the current token invalid so the next accessor call fetches a new one.
	pub fn invalidate_blocking(&self) {
		let mut state = self.shared.state.lock_blocking();

		state.invalidate();
	}

	/// Async flavour of [`invalidate_blocking`](Self::invalidate_blocking).
	pub async fn invalidate(&self) {
		let mut state = self.shared.state.lock().await;

		state.invalidate();
	}

	/// Re-arms the expiration alarm of the current token to fire after `after`.
	///
	/// Intended for diagnostics and tests that need expiration without waiting for a real
	/// token lifetime. The state lock is taken by parking the calling thread. It is never
	/// held across a request, so from an async task this only waits out other callers'
	/// bookkeeping.
	pub fn start_token_timer(&self, after: Duration) {
		let mut state = self.shared.state.lock_blocking();

		self.arm_timer(&mut state, after);
	}

	/// Returns a snapshot of the cache state.
	pub fn status_blocking(&self) -> TokenStatus {
		self.shared.state.lock_blocking().status()
	}

	/// Async flavour of [`status_blocking`](Self::status_blocking).
	pub async fn status(&self) -> TokenStatus {
		self.shared.state.lock().await.status()
	}

	/// Counters describing hits, shared waits, and fetches.
	pub fn metrics(&self) -> &FetchMetrics {
		&self.shared.metrics
	}

	/// Fetcher used for cache misses.
	pub fn fetcher(&self) -> &TokenFetcher<C> {
		&self.shared.fetcher
	}

	fn resolve_blocking(&self) -> Result<(Secret, AccessOutcome)> {
		let step = {
			let mut state = self.shared.state.lock_blocking();

			self.step(&mut state)
		};

		match step {
			Step::Ready(token) => Ok((token, AccessOutcome::Hit)),
			Step::Join { flight, guard } => {
				let (mut slot, label) = match guard {
					Some(guard) => (guard, AccessOutcome::Fetched),
					None => {
						self.shared.metrics.record_shared();

						(flight.lock_arc_blocking(), AccessOutcome::Shared)
					},
				};

				self.complete_blocking(&flight, &mut slot).map(|token| (token, label))
			},
		}
	}

	async fn resolve(&self) -> Result<(Secret, AccessOutcome)> {
		let step = {
			let mut state = self.shared.state.lock().await;

			self.step(&mut state)
		};

		match step {
			Step::Ready(token) => Ok((token, AccessOutcome::Hit)),
			Step::Join { flight, guard } => {
				let (mut slot, label) = match guard {
					Some(guard) => (guard, AccessOutcome::Fetched),
					None => {
						self.shared.metrics.record_shared();

						(flight.lock_arc().await, AccessOutcome::Shared)
					},
				};

				self.complete(&flight, &mut slot).await.map(|token| (token, label))
			},
		}
	}

	/// Decides what the caller does next. Must run inside the critical section.
	fn step(&self, state: &mut TokenState) -> Step {
		if let Some(token) = state.token.as_ref().filter(|_| state.valid) {
			self.shared.metrics.record_hit();

			return Step::Ready(token.clone());
		}
		if let Some(flight) = &state.flight {
			trace_event!(epoch = state.epoch, "joining in-flight token fetch");

			return Step::Join { flight: flight.clone(), guard: None };
		}

		let flight = Arc::new(Flight::new(FlightSlot::Idle));
		// Uncontended: the flight is not published yet.
		let guard = flight.lock_arc_blocking();

		state.flight = Some(flight.clone());

		self.shared.metrics.record_fetch();
		trace_event!(epoch = state.epoch, "starting token fetch");

		Step::Join { flight, guard: Some(guard) }
	}

	/// Drives the flight to its outcome on the calling thread.
	fn complete_blocking(&self, flight: &Arc<Flight>, slot: &mut FlightSlot) -> Outcome {
		loop {
			match slot {
				FlightSlot::Idle => *slot = FlightSlot::Fetched(self.shared.fetcher.fetch_blocking()),
				FlightSlot::Running(fetch) => {
					trace_event!("resuming abandoned token fetch");

					let outcome = executor::block_on(fetch.as_mut());

					*slot = FlightSlot::Fetched(outcome);
				},
				FlightSlot::Fetched(outcome) => {
					let outcome = outcome.clone();

					self.settle(&mut self.shared.state.lock_blocking(), flight, &outcome);

					*slot = FlightSlot::Settled(outcome);
				},
				FlightSlot::Settled(outcome) => return outcome.clone(),
			}
		}
	}

	/// Drives the flight to its outcome. Each step leaves its progress in `slot`, so the
	/// next holder picks up wherever a dropped caller stopped.
	async fn complete(&self, flight: &Arc<Flight>, slot: &mut FlightSlot) -> Outcome {
		loop {
			match slot {
				FlightSlot::Idle => *slot = FlightSlot::Running(self.fetch_future()),
				FlightSlot::Running(fetch) => {
					let outcome = fetch.as_mut().await;

					*slot = FlightSlot::Fetched(outcome);
				},
				FlightSlot::Fetched(outcome) => {
					let outcome = outcome.clone();

					self.settle(&mut *self.shared.state.lock().await, flight, &outcome);

					*slot = FlightSlot::Settled(outcome);
				},
				FlightSlot::Settled(outcome) => return outcome.clone(),
			}
		}
	}

	fn fetch_future(&self) -> FetchFuture {
		let fetcher = self.shared.fetcher.clone();

		Box::pin(async move { fetcher.fetch().await })
	}

	/// Applies a fetch outcome to the cache. Must run inside the critical section.
	#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
	fn settle(&self, state: &mut TokenState, flight: &Arc<Flight>, outcome: &Outcome) {
		if !state.flight.as_ref().is_some_and(|current| Arc::ptr_eq(current, flight)) {
			return;
		}

		match outcome {
			Ok(token) => {
				let lifetime =
					token_lifetime(token, self.shared.token_ttl, self.shared.refresh_margin);

				state.flight = None;
				state.epoch += 1;
				state.token = Some(token.clone());
				state.valid = true;

				self.arm_timer(state, lifetime);
				trace_event!(epoch = state.epoch, lifetime = %lifetime, "token cached");
			},
			Err(e) => {
				state.flight = None;
				state.token = None;
				state.valid = false;
				state.timer = None;
				state.expires_at = None;

				self.shared.metrics.record_failure();
				trace_event!(error = %e, "token fetch failed");
			},
		}
	}

	fn arm_timer(&self, state: &mut TokenState, after: Duration) {
		let shared = Arc::downgrade(&self.shared);
		let epoch = state.epoch;

		state.timer_serial += 1;

		let serial = state.timer_serial;
		let timer = ExpiryTimer::arm(serial, after, move || {
			if let Some(shared) = shared.upgrade() {
				shared.expire(epoch, serial);
			}
		});

		state.expires_at = Some(timer.deadline());
		// Replacing the previous alarm cancels it.
		state.timer = Some(timer);
	}
}
impl<C> Clone for TokenCache<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { shared: self.shared.clone() }
	}
}
impl<C> Debug for TokenCache<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("fetcher", &self.shared.fetcher)
			.field("token_ttl", &self.shared.token_ttl)
			.field("metrics", &self.shared.metrics)
			.finish()
	}
}

struct Shared<C>
where
	C: ?Sized + HttpTransport,
{
	state: AsyncMutex<TokenState>,
	fetcher: Arc<TokenFetcher<C>>,
	token_ttl: Duration,
	refresh_margin: Duration,
	metrics: FetchMetrics,
}
impl<C> Shared<C>
where
	C: ?Sized + HttpTransport,
{
	/// Alarm callback: clears validity only if the alarm still belongs to the current epoch.
	fn expire(&self, epoch: u64, serial: u64) {
		let mut state = self.state.lock_blocking();
		let current = state.timer.as_ref().map(ExpiryTimer::serial);

		if state.epoch == epoch && current == Some(serial) {
			state.valid = false;
			state.timer = None;
			state.expires_at = None;

			trace_event!(epoch, "token expired");
		}
	}
}

#[derive(Debug, Default)]
struct TokenState {
	token: Option<Secret>,
	valid: bool,
	epoch: u64,
	flight: Option<Arc<Flight>>,
	timer: Option<ExpiryTimer>,
	timer_serial: u64,
	expires_at: Option<OffsetDateTime>,
}
impl TokenState {
	fn invalidate(&mut self) {
		self.valid = false;
		self.timer = None;
		self.expires_at = None;
	}

	fn status(&self) -> TokenStatus {
		TokenStatus {
			token: self.token.clone(),
			valid: self.valid && self.token.is_some(),
			fetch_in_flight: self.flight.is_some(),
			epoch: self.epoch,
			expires_at: self.expires_at,
		}
	}
}

/// Progress of one fetch, advanced by whoever holds the flight's lock.
enum FlightSlot {
	/// No request issued yet, or a blocking fetch unwound midway.
	Idle,
	/// Suspending request in progress.
	Running(FetchFuture),
	/// Response received but not yet applied to the cache.
	Fetched(Outcome),
	/// Applied; later holders only read it.
	Settled(Outcome),
}
impl Debug for FlightSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::Idle => "Idle",
			Self::Running(_) => "Running",
			Self::Fetched(_) => "Fetched",
			Self::Settled(_) => "Settled",
		})
	}
}

enum Step {
	Ready(Secret),
	Join { flight: Arc<Flight>, guard: Option<FlightGuard> },
}

fn finish(mode: AccessMode, result: Result<(Secret, AccessOutcome)>) -> Result<Secret> {
	match result {
		Ok((token, outcome)) => {
			obs::record_access_outcome(mode, outcome);

			Ok(token)
		},
		Err(e) => {
			obs::record_access_outcome(mode, AccessOutcome::Failure);

			Err(e)
		},
	}
}
