//! Bounded retry with exponential backoff for the pipeline's I/O stages.

use std::time::Duration;

use tracing::debug;

use scholar_core::errors::ScholarResult;

/// Run `f` up to `attempts` times. The delay doubles after each failure,
/// starting at `base_delay`. The last error is returned when attempts are
/// exhausted.
pub fn with_retry<T, F>(attempts: u32, base_delay: Duration, mut f: F) -> ScholarResult<T>
where
    F: FnMut() -> ScholarResult<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0u32;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(e);
                }
                let delay = base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, ?delay, error = %e, "retrying after failure");
                std::thread::sleep(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::errors::RetrievalError;

    #[test]
    fn returns_first_success() {
        let mut calls = 0;
        let result = with_retry(3, Duration::ZERO, || {
            calls += 1;
            Ok::<_, scholar_core::errors::ScholarError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let mut calls = 0;
        let result = with_retry(3, Duration::ZERO, || {
            calls += 1;
            if calls < 3 {
                Err(RetrievalError::SearchFailed {
                    reason: "transient".into(),
                }
                .into())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn exhausts_and_returns_last_error() {
        let mut calls = 0;
        let result: ScholarResult<()> = with_retry(3, Duration::ZERO, || {
            calls += 1;
            Err(RetrievalError::SearchFailed {
                reason: format!("failure {calls}"),
            }
            .into())
        });
        assert_eq!(calls, 3);
        assert!(result.unwrap_err().to_string().contains("failure 3"));
    }
}
