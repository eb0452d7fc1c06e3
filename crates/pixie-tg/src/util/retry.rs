use crate::prelude::*;
use chrono::prelude::*;
use retry_policies::{RetryDecision, RetryPolicy};
use std::future::Future;

/// Invoke `f` until it succeeds, the error is not retryable, or the retry
/// policy gives up. The last error is always surfaced to the caller; this
/// combinator never swallows a failure into a success-shaped void.
///
/// The transport-level http client already retries on its own, so this is
/// only for the logical upstream failures that surface as API-level errors
/// (rate limits, flaky gateways) rather than broken connections.
pub(crate) async fn retry_request<T, E, Fut>(
    policy: &(impl RetryPolicy + Sync),
    f: impl Fn() -> Fut,
    is_retryable: impl Fn(&E) -> bool,
) -> Fut::Output
where
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    let mut attempt = 0;
    loop {
        let err = match f().await {
            Ok(output) => {
                if attempt > 0 {
                    warn!(%attempt, "Upstream request succeeded after a retry");
                }
                return Ok(output);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            if attempt > 0 {
                warn!(%attempt, "Upstream request failed with a non-retryable error after a retry");
            }
            return Err(err);
        }

        let execute_after = match policy.should_retry(attempt) {
            RetryDecision::Retry { execute_after } => execute_after,
            RetryDecision::DoNotRetry => {
                warn!(%attempt, "Giving up retrying upstream request");
                return Err(err);
            }
        };

        let duration = (execute_after.signed_duration_since(Utc::now()))
            .to_std()
            .unwrap_or_else(|err| {
                warn!(
                    err = tracing_err(&err),
                    %execute_after,
                    "Retry policy returned a negative duration, retrying immediately"
                );
                std::time::Duration::ZERO
            });

        // Sleep the requested amount before we try again.
        warn!(
            %attempt,
            err = tracing_err(&err),
            duration = format_args!("{duration:.2?}"),
            "Sleeping before the next attempt",
        );

        tokio::time::sleep(duration).await;

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use retry_policies::policies::ExponentialBackoff;
    use std::sync::atomic::{AtomicU32, Ordering::SeqCst};

    #[derive(Debug, thiserror::Error)]
    enum FakeError {
        #[error("flaky")]
        Flaky,
        #[error("broken request")]
        Broken,
    }

    fn policy_with_attempts(max_attempts: u32) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .backoff_exponent(2)
            .retry_bounds(
                std::time::Duration::from_millis(100),
                std::time::Duration::from_secs(3),
            )
            .build_with_max_retries(max_attempts - 1)
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn exhausts_the_attempt_budget_and_surfaces_the_last_error() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = retry_request(
            &policy_with_attempts(5),
            || async {
                attempts.fetch_add(1, SeqCst);
                Err(FakeError::Flaky)
            },
            |err| matches!(err, FakeError::Flaky),
        )
        .await;

        assert_matches!(result, Err(FakeError::Flaky));
        assert_eq!(attempts.load(SeqCst), 5);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn does_not_retry_non_retryable_errors() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = retry_request(
            &policy_with_attempts(5),
            || async {
                attempts.fetch_add(1, SeqCst);
                Err(FakeError::Broken)
            },
            |err| matches!(err, FakeError::Flaky),
        )
        .await;

        assert_matches!(result, Err(FakeError::Broken));
        assert_eq!(attempts.load(SeqCst), 1);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn returns_the_first_success() {
        let attempts = AtomicU32::new(0);

        let result = retry_request(
            &policy_with_attempts(5),
            || async {
                if attempts.fetch_add(1, SeqCst) < 2 {
                    Err(FakeError::Flaky)
                } else {
                    Ok("done")
                }
            },
            |err| matches!(err, FakeError::Flaky),
        )
        .await;

        assert_matches!(result, Ok("done"));
        assert_eq!(attempts.load(SeqCst), 3);
    }
}
