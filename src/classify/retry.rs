use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::insights::ReviewInsights;
use super::provider::Classifier;

/// Attempt bound and pauses around a classification call. The pauses only
/// keep the provider under its rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, first one included.
    pub max_attempts: usize,
    /// Pause after a success, before returning.
    pub pacing_delay: Duration,
    /// Pause after a failure, before the next try.
    pub backoff_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pacing_delay: Duration::from_millis(500),
            backoff_delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Same bound, no pauses.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            pacing_delay: Duration::ZERO,
            backoff_delay: Duration::ZERO,
        }
    }
}

/// Terminal state of a retried classification. Never an error: exhaustion
/// is an ordinary outcome the caller reports and moves past.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Classified {
        insights: ReviewInsights,
        attempts: usize,
    },
    Exhausted {
        attempts: usize,
        last_error: String,
    },
}

impl Outcome {
    pub fn attempts(&self) -> usize {
        match self {
            Outcome::Classified { attempts, .. } | Outcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_insights(self) -> Option<ReviewInsights> {
        match self {
            Outcome::Classified { insights, .. } => Some(insights),
            Outcome::Exhausted { .. } => None,
        }
    }
}

/// Classify `text`, retrying every failure up to `policy.max_attempts`.
pub async fn classify_with_retry<C>(classifier: &C, text: &str, policy: &RetryPolicy) -> Outcome
where
    C: Classifier + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    let mut last_error = String::new();

    while attempt < max_attempts {
        attempt += 1;
        match classifier.classify(text).await {
            Ok(insights) => {
                debug!(attempt, "classified");
                if !policy.pacing_delay.is_zero() {
                    sleep(policy.pacing_delay).await;
                }
                return Outcome::Classified {
                    insights,
                    attempts: attempt,
                };
            }
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts,
                    kind = e.kind(),
                    "classification attempt failed: {}",
                    e
                );
                last_error = format!("{}: {}", e.kind(), e);
                if attempt < max_attempts && !policy.backoff_delay.is_zero() {
                    sleep(policy.backoff_delay).await;
                }
            }
        }
    }

    Outcome::Exhausted {
        attempts: attempt,
        last_error,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classify::error::ClassifyError;
    use crate::classify::insights::tests::app_crash_json;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then succeeds forever.
    pub(crate) struct FlakyClassifier {
        pub(crate) failures: usize,
        pub(crate) calls: AtomicUsize,
    }

    impl FlakyClassifier {
        pub(crate) fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Classifier for FlakyClassifier {
        async fn classify(&self, _text: &str) -> Result<ReviewInsights, ClassifyError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(ClassifyError::Malformed(format!("call {}", n + 1)))
            } else {
                ReviewInsights::from_value(app_crash_json())
            }
        }
    }

    #[tokio::test]
    async fn fails_twice_then_succeeds_on_third_attempt() {
        let stub = FlakyClassifier::new(2);
        let outcome = classify_with_retry(&stub, "text", &RetryPolicy::immediate(3)).await;
        assert_eq!(stub.calls(), 3);
        assert_eq!(outcome.attempts(), 3);
        assert!(matches!(outcome, Outcome::Classified { .. }));
    }

    #[tokio::test]
    async fn always_failing_is_exhausted_after_three_attempts() {
        let stub = FlakyClassifier::new(usize::MAX);
        let outcome = classify_with_retry(&stub, "text", &RetryPolicy::immediate(3)).await;
        assert_eq!(stub.calls(), 3);
        match outcome {
            Outcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.starts_with("malformed"), "{last_error}");
                assert!(last_error.contains("call 3"));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_success_makes_one_call() {
        let stub = FlakyClassifier::new(0);
        let outcome = classify_with_retry(&stub, "text", &RetryPolicy::immediate(3)).await;
        assert_eq!(stub.calls(), 1);
        assert!(outcome.into_insights().is_some());
    }

    #[tokio::test]
    async fn backoff_is_applied_between_attempts_only() {
        let stub = FlakyClassifier::new(usize::MAX);
        let policy = RetryPolicy {
            max_attempts: 2,
            pacing_delay: Duration::ZERO,
            backoff_delay: Duration::from_millis(20),
        };
        let start = std::time::Instant::now();
        let outcome = classify_with_retry(&stub, "text", &policy).await;
        let elapsed = start.elapsed();
        assert_eq!(outcome.attempts(), 2);
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[test]
    fn default_policy_paces_shorter_than_it_backs_off() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert!(p.pacing_delay < p.backoff_delay);
    }
}
