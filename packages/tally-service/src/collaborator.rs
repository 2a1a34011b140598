//! Bounded calls to the embedding and generative collaborators.

use std::{future::Future, time::Duration};

use tally_config::Retry;

use crate::Error;

pub(crate) const EMBEDDING: &str = "embedding";
pub(crate) const COMPLETION: &str = "completion";

#[derive(Debug)]
pub(crate) enum Failure {
	/// The final attempt ran past its deadline.
	TimedOut,
	Failed(tally_providers::Error),
}
impl Failure {
	pub(crate) fn into_error(self, collaborator: &str) -> Error {
		match self {
			Self::TimedOut => Error::CollaboratorTimeout { collaborator: collaborator.to_string() },
			Self::Failed(err) => err.into(),
		}
	}
}

/// Runs `op` under a per-attempt deadline, retrying transient failures with exponential
/// backoff.
pub(crate) async fn call<T, F, Fut>(
	collaborator: &'static str,
	timeout_ms: u64,
	retry: &Retry,
	mut op: F,
) -> Result<T, Failure>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = tally_providers::Result<T>>,
{
	let attempts = retry.max_attempts.max(1);
	let deadline = Duration::from_millis(timeout_ms);
	let mut last = Failure::TimedOut;

	for attempt in 1..=attempts {
		match tokio::time::timeout(deadline, op()).await {
			Ok(Ok(value)) => return Ok(value),
			Ok(Err(err)) => {
				tracing::warn!(collaborator, attempt, error = %err, "Collaborator call failed.");

				let transient = err.is_transient();

				last = Failure::Failed(err);

				if !transient {
					return Err(last);
				}
			},
			Err(_) => {
				tracing::warn!(collaborator, attempt, timeout_ms, "Collaborator call timed out.");

				last = Failure::TimedOut;
			},
		}

		if attempt < attempts {
			tokio::time::sleep(backoff(retry, attempt)).await;
		}
	}

	tracing::warn!(collaborator, attempts, "Collaborator retries exhausted.");

	Err(last)
}

/// `base * 2^(attempt - 1)`, capped at `max_backoff_ms`.
fn backoff(retry: &Retry, attempt: u32) -> Duration {
	let factor = 1_u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
	let millis = retry.base_backoff_ms.saturating_mul(factor).min(retry.max_backoff_ms);

	Duration::from_millis(millis)
}
