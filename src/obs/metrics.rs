// self
use crate::obs::{AccessMode, AccessOutcome};

/// Records an accessor outcome via the global metrics recorder (when enabled).
pub fn record_access_outcome(mode: AccessMode, outcome: AccessOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"conjur_authn_token_total",
			"mode" => mode.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (mode, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_access_outcome_noop_without_metrics() {
		record_access_outcome(AccessMode::Blocking, AccessOutcome::Failure);
	}
}
