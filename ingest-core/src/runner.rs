//! Host-side invocation helper: the whole-call retry the scheduler applies
//! around one extraction. Any [`ExtractError`] is retryable; the policy's
//! backoff decides the pause between attempts.

use tracing::{info, warn};

use crate::extract::{ExtractError, Extractor};
use crate::model::{ExtractionRequest, WeatherRecord};
use crate::pipeline::RetryPolicy;

/// A finished invocation: the extracted records plus how many attempts it
/// took (1 = no retries).
#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<WeatherRecord>,
    pub attempts: u32,
}

/// Run one extraction under the given retry policy. Returns the last error
/// once `max_retries` additional attempts are exhausted.
pub async fn run_with_retry<E>(
    extractor: &E,
    request: &ExtractionRequest,
    policy: &RetryPolicy,
) -> Result<RunOutcome, ExtractError>
where
    E: Extractor + ?Sized,
{
    let mut attempt = 0u32;

    loop {
        match extractor.extract(request).await {
            Ok(records) => {
                let attempts = attempt + 1;
                if attempt > 0 {
                    info!(attempts, "extraction succeeded after retries");
                }
                return Ok(RunOutcome { records, attempts });
            }
            Err(err) if attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "extraction attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
