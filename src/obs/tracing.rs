// self
use crate::{_prelude::*, obs::AccessMode};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAccess<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAccess<F> = F;

/// A span builder used by token cache accessors.
#[derive(Clone, Debug)]
pub struct AccessSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AccessSpan {
	/// Creates a new span tagged with the provided access mode + stage.
	pub fn new(mode: AccessMode, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("conjur_authn.token", mode = mode.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (mode, stage);

			Self {}
		}
	}

	/// Enters the span for blocking accessors.
	pub fn entered(self) -> AccessSpanGuard {
		#[cfg(feature = "tracing")]
		{
			AccessSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			AccessSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAccess<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`AccessSpan::entered`].
pub struct AccessSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for AccessSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AccessSpanGuard(..)")
	}
}

/// Emits a debug event inside the current span (when tracing is enabled).
macro_rules! trace_event {
	($($arg:tt)*) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!($($arg)*);
		}
	};
}
pub(crate) use trace_event;

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn access_span_noop_without_tracing() {
		let _guard = AccessSpan::new(AccessMode::Blocking, "test").entered();
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = AccessSpan::new(AccessMode::Async, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
