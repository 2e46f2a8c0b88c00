//! Restartable one-shot alarm backing token expiration.

// std
use std::{thread, time::Instant};
// self
use crate::_prelude::*;

/// Longest wait an alarm accepts.
const MAX_WAIT: Duration = Duration::days(365);

#[derive(Debug, Default)]
struct Cancellation {
	cancelled: Mutex<bool>,
	wake: Condvar,
}

/// One-shot alarm that runs a callback on a parked thread once its deadline passes.
///
/// Dropping or [`cancel`](Self::cancel)ling the alarm wakes the thread, which then exits
/// without running the callback. A callback that already started is not interrupted, so
/// callbacks must tolerate firing after they were superseded.
#[derive(Debug)]
pub(crate) struct ExpiryTimer {
	serial: u64,
	deadline: OffsetDateTime,
	cancellation: Arc<Cancellation>,
}
impl ExpiryTimer {
	/// Arms a new alarm that calls `on_fire` after `after` elapses.
	///
	/// Negative durations fire immediately; durations beyond [`MAX_WAIT`] are capped.
	pub(crate) fn arm<F>(serial: u64, after: Duration, on_fire: F) -> Self
	where
		F: 'static + Send + FnOnce(),
	{
		let after = after.clamp(Duration::ZERO, MAX_WAIT);
		let wait = std::time::Duration::try_from(after).unwrap_or_default();
		let now = OffsetDateTime::now_utc();
		let deadline = now.checked_add(after).unwrap_or(now);
		let cancellation = Arc::new(Cancellation::default());
		let watched = cancellation.clone();

		thread::spawn(move || {
			let fire_at = Instant::now() + wait;
			let mut cancelled = watched.cancelled.lock();

			while !*cancelled {
				if watched.wake.wait_until(&mut cancelled, fire_at).timed_out() {
					break;
				}
			}

			let fire = !*cancelled;

			drop(cancelled);

			if fire {
				on_fire();
			}
		});

		Self { serial, deadline, cancellation }
	}

	/// Serial number the alarm was armed with.
	pub(crate) fn serial(&self) -> u64 {
		self.serial
	}

	/// Wall-clock instant at which the alarm fires.
	pub(crate) fn deadline(&self) -> OffsetDateTime {
		self.deadline
	}

	/// Stops the alarm if it has not fired yet.
	pub(crate) fn cancel(&self) {
		*self.cancellation.cancelled.lock() = true;

		self.cancellation.wake.notify_all();
	}
}
impl Drop for ExpiryTimer {
	fn drop(&mut self) {
		self.cancel();
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::mpsc;
	// self
	use super::*;

	#[test]
	fn alarm_fires_after_deadline() {
		let (tx, rx) = mpsc::channel();
		let timer = ExpiryTimer::arm(7, Duration::milliseconds(5), move || {
			let _ = tx.send(());
		});

		assert_eq!(timer.serial(), 7);
		rx.recv_timeout(std::time::Duration::from_secs(2))
			.expect("Alarm should fire shortly after its deadline.");
	}

	#[test]
	fn cancelled_alarm_never_fires() {
		let (tx, rx) = mpsc::channel();
		let timer = ExpiryTimer::arm(1, Duration::milliseconds(50), move || {
			let _ = tx.send(());
		});

		drop(timer);

		assert!(rx.recv_timeout(std::time::Duration::from_millis(200)).is_err());
	}

	#[test]
	fn extreme_durations_are_clamped() {
		let before = OffsetDateTime::now_utc();
		let far = ExpiryTimer::arm(1, Duration::MAX, || {});

		assert!(far.deadline() - before <= MAX_WAIT + Duration::seconds(1));
		assert!(far.deadline() - before >= MAX_WAIT - Duration::seconds(1));

		let (tx, rx) = mpsc::channel();
		let _past = ExpiryTimer::arm(2, Duration::MIN, move || {
			let _ = tx.send(());
		});

		rx.recv_timeout(std::time::Duration::from_secs(2))
			.expect("Negative durations should fire immediately.");
	}
}
