use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Maximum retry attempts after an initial request attempt.
pub const MAX_RETRIES: u32 = 3;
/// Base delay before the first retry.
pub const BASE_DELAY_MS: u64 = 1000;

fn retryable_status_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)rate.?limit|overloaded|service.?unavailable|upstream.?connect|connection.?refused")
            .expect("retry regex must compile")
    })
}

/// Error text retry policy for transient failures and retryable statuses.
pub fn is_retryable_http_error(status: u16, error_text: &str) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504) || retryable_status_regex().is_match(error_text)
}

/// Compute exponential backoff delay for a retry attempt.
pub fn retry_delay_ms(attempt: u32) -> Duration {
    let exponent = attempt.min(30);
    Duration::from_millis(BASE_DELAY_MS * 2u64.saturating_pow(exponent))
}

#[cfg(test)]
mod tests {
    use super::{is_retryable_http_error, retry_delay_ms};
    use std::time::Duration;

    #[test]
    fn retryable_statuses_match() {
        assert!(is_retryable_http_error(429, ""));
        assert!(is_retryable_http_error(503, ""));
        assert!(!is_retryable_http_error(400, "bad request"));
    }

    #[test]
    fn retryable_error_text_matches_without_status() {
        assert!(is_retryable_http_error(200, "Rate limit exceeded"));
        assert!(is_retryable_http_error(200, "upstream connect failure"));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(retry_delay_ms(0), Duration::from_millis(1000));
        assert_eq!(retry_delay_ms(1), Duration::from_millis(2000));
        assert_eq!(retry_delay_ms(2), Duration::from_millis(4000));
    }
}
