//! Which caption failures get another attempt, and how long to wait.

use crate::error::PipelineError;
use std::time::Duration;

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Transient failures: the call timed out, never reached the service, or the
/// service answered 429 or 5xx. Anything else is final on the first attempt.
pub fn is_retryable(error: &PipelineError) -> bool {
    matches!(
        error,
        PipelineError::Timeout { .. }
            | PipelineError::CaptionUnreachable { .. }
            | PipelineError::Caption {
                status_code: Some(429 | 500..=599),
                ..
            }
    )
}

/// Delay before retry number `retry` (zero-based): the base delay doubled
/// once per earlier retry, never above [`MAX_BACKOFF`].
pub fn backoff_duration(retry: u32, base_delay_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
    Duration::from_millis(base_delay_ms.saturating_mul(factor)).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_failure(status_code: Option<u16>) -> PipelineError {
        PipelineError::Caption {
            filename: "leaf.jpg".to_string(),
            message: "upstream said no".to_string(),
            status_code,
        }
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let timeout = PipelineError::Timeout {
            filename: "leaf.jpg".to_string(),
            stage: "caption".to_string(),
            timeout_ms: 60000,
        };
        let unreachable = PipelineError::CaptionUnreachable {
            filename: "leaf.jpg".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(is_retryable(&timeout));
        assert!(is_retryable(&unreachable));
        assert!(is_retryable(&http_failure(Some(429))));
        assert!(is_retryable(&http_failure(Some(503))));
    }

    #[test]
    fn test_final_failures_are_not_retried() {
        assert!(!is_retryable(&http_failure(Some(401))));
        assert!(!is_retryable(&http_failure(Some(400))));
        // Parse failures carry no status
        assert!(!is_retryable(&http_failure(None)));
        let classifier = PipelineError::ClassifierHttp {
            status: 503,
            message: "down".to_string(),
        };
        assert!(!is_retryable(&classifier));
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
        assert_eq!(backoff_duration(10, 1000), MAX_BACKOFF);
        assert_eq!(backoff_duration(200, u64::MAX), MAX_BACKOFF);
    }
}
