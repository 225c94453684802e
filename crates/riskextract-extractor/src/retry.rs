//! Bounded retry with exponential backoff
//!
//! The policy is a small state machine with pure transitions:
//!
//! ```text
//! Idle ──start──▶ InFlight(n) ──response──▶ Succeeded
//!                     │
//!                     ├── permanent error ──▶ Failed(Permanent)
//!                     ├── transient error, n == max ──▶ Failed(Exhausted)
//!                     └── transient error, n < max ──▶ Backoff(n, delay) ──elapsed──▶ InFlight(n + 1)
//! ```
//!
//! [`generate_with_retry`] drives it against an [`ExtractionClient`],
//! applying the per-attempt timeout and watching for cancellation.

use crate::config::RetryPolicy;
use crate::ExtractorError;
use riskextract_domain::{ExtractionClient, GenerationError, GenerationRequest};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Terminal failure of a retried call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The client reported an error retrying cannot fix
    Permanent {
        /// Attempts made
        attempts: u32,
        /// Client message
        message: String,
    },
    /// Every attempt failed transiently
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Message of the last failure
        last_error: String,
    },
}

/// Retry state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// Nothing sent yet
    Idle,
    /// Attempt `attempt` (1-based) is outstanding
    InFlight {
        /// Current attempt
        attempt: u32,
    },
    /// Waiting before the next attempt
    Backoff {
        /// Attempt that just failed
        attempt: u32,
        /// Wait before retrying
        delay: Duration,
    },
    /// A completion arrived
    Succeeded {
        /// Raw completion
        text: String,
        /// Attempts used
        attempts: u32,
    },
    /// Gave up
    Failed(Failure),
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// Begin the first attempt
    Start,
    /// The outstanding attempt returned text
    Response(String),
    /// The outstanding attempt failed
    Error(GenerationError),
    /// The backoff delay passed
    BackoffElapsed,
}

impl RetryState {
    /// Apply one event
    ///
    /// Events that do not apply to the current state leave it unchanged.
    pub fn next(self, event: RetryEvent, policy: &RetryPolicy) -> RetryState {
        match (self, event) {
            (RetryState::Idle, RetryEvent::Start) => RetryState::InFlight { attempt: 1 },
            (RetryState::InFlight { attempt }, RetryEvent::Response(text)) => {
                RetryState::Succeeded {
                    text,
                    attempts: attempt,
                }
            }
            (RetryState::InFlight { attempt }, RetryEvent::Error(GenerationError::Permanent(message))) => {
                RetryState::Failed(Failure::Permanent {
                    attempts: attempt,
                    message,
                })
            }
            (RetryState::InFlight { attempt }, RetryEvent::Error(GenerationError::Transient(message))) => {
                if attempt >= policy.max_attempts {
                    RetryState::Failed(Failure::Exhausted {
                        attempts: attempt,
                        last_error: message,
                    })
                } else {
                    RetryState::Backoff {
                        attempt,
                        delay: policy.backoff_for(attempt),
                    }
                }
            }
            (RetryState::Backoff { attempt, .. }, RetryEvent::BackoffElapsed) => {
                RetryState::InFlight {
                    attempt: attempt + 1,
                }
            }
            (state, _) => state,
        }
    }

    /// Whether no further events will change the state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Succeeded { .. } | RetryState::Failed(_))
    }
}

/// Result of a retried call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The client produced a completion
    Completed {
        /// Raw completion
        text: String,
        /// Attempts used
        attempts: u32,
    },
    /// The client could not produce one
    Failed(Failure),
}

/// Call the client until it succeeds, fails permanently or the budget is spent
///
/// Returns `Err(Cancelled)` as soon as `cancel` fires, abandoning any
/// outstanding attempt or backoff.
pub async fn generate_with_retry<C>(
    client: &C,
    request: &GenerationRequest,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<RetryOutcome, ExtractorError>
where
    C: ExtractionClient + ?Sized,
{
    let mut state = RetryState::Idle;

    loop {
        state = match state {
            RetryState::Succeeded { text, attempts } => {
                return Ok(RetryOutcome::Completed { text, attempts });
            }
            RetryState::Failed(failure) => return Ok(RetryOutcome::Failed(failure)),
            RetryState::Idle => RetryState::Idle.next(RetryEvent::Start, policy),
            RetryState::InFlight { attempt } => {
                let call = timeout(policy.request_timeout(), client.generate(request));
                let result = tokio::select! {
                    result = call => result,
                    _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
                };

                let event = match result {
                    Ok(Ok(text)) => RetryEvent::Response(text),
                    Ok(Err(e)) => RetryEvent::Error(e),
                    Err(_) => RetryEvent::Error(GenerationError::Transient(format!(
                        "no response within {}s",
                        policy.request_timeout_secs
                    ))),
                };
                if let RetryEvent::Error(e) = &event {
                    warn!(
                        "{} attempt {}/{} failed: {}",
                        client.name(),
                        attempt,
                        policy.max_attempts,
                        e
                    );
                }
                RetryState::InFlight { attempt }.next(event, policy)
            }
            RetryState::Backoff { attempt, delay } => {
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
                }
                RetryState::Backoff { attempt, delay }.next(RetryEvent::BackoffElapsed, policy)
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskextract_llm::MockProvider;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            ..RetryPolicy::default()
        }
    }

    fn transient() -> RetryEvent {
        RetryEvent::Error(GenerationError::Transient("429".to_string()))
    }

    #[test]
    fn test_success_on_first_attempt() {
        let policy = RetryPolicy::default();
        let state = RetryState::Idle
            .next(RetryEvent::Start, &policy)
            .next(RetryEvent::Response("{}".into()), &policy);

        assert_eq!(
            state,
            RetryState::Succeeded {
                text: "{}".into(),
                attempts: 1
            }
        );
        assert!(state.is_terminal());
    }

    #[test]
    fn test_transient_error_backs_off_then_retries() {
        let policy = RetryPolicy::default();
        let state = RetryState::InFlight { attempt: 1 }.next(transient(), &policy);
        assert_eq!(
            state,
            RetryState::Backoff {
                attempt: 1,
                delay: Duration::from_millis(500)
            }
        );

        let state = state.next(RetryEvent::BackoffElapsed, &policy);
        assert_eq!(state, RetryState::InFlight { attempt: 2 });

        let state = state.next(transient(), &policy);
        assert_eq!(
            state,
            RetryState::Backoff {
                attempt: 2,
                delay: Duration::from_millis(1_000)
            }
        );
    }

    #[test]
    fn test_transient_error_on_last_attempt_exhausts() {
        let policy = RetryPolicy::default();
        let state = RetryState::InFlight { attempt: 3 }.next(transient(), &policy);
        assert_eq!(
            state,
            RetryState::Failed(Failure::Exhausted {
                attempts: 3,
                last_error: "429".into()
            })
        );
    }

    #[test]
    fn test_permanent_error_fails_immediately() {
        let policy = RetryPolicy::default();
        let state = RetryState::InFlight { attempt: 1 }.next(
            RetryEvent::Error(GenerationError::Permanent("401".into())),
            &policy,
        );
        assert_eq!(
            state,
            RetryState::Failed(Failure::Permanent {
                attempts: 1,
                message: "401".into()
            })
        );
    }

    #[test]
    fn test_irrelevant_events_are_ignored() {
        let policy = RetryPolicy::default();
        assert_eq!(
            RetryState::Idle.next(RetryEvent::BackoffElapsed, &policy),
            RetryState::Idle
        );
        let done = RetryState::Failed(Failure::Exhausted {
            attempts: 1,
            last_error: String::new(),
        });
        assert_eq!(done.clone().next(RetryEvent::Start, &policy), done);
    }

    #[tokio::test]
    async fn test_driver_recovers_from_transient_failures() {
        let mut client = MockProvider::default();
        client.add_transient_failures("chunk", 2, r#"{"a": 1}"#);
        let request = GenerationRequest::new("chunk text", "m", 0.0);

        let outcome = generate_with_retry(&client, &request, &fast_policy(3), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RetryOutcome::Completed {
                text: r#"{"a": 1}"#.into(),
                attempts: 3
            }
        );
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_driver_exhausts_budget() {
        let mut client = MockProvider::default();
        client.add_transient_error("chunk");
        let request = GenerationRequest::new("chunk", "m", 0.0);

        let outcome = generate_with_retry(&client, &request, &fast_policy(2), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RetryOutcome::Failed(Failure::Exhausted { attempts: 2, .. })
        ));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_driver_stops_on_permanent_error() {
        let mut client = MockProvider::default();
        client.add_permanent_error("chunk");
        let request = GenerationRequest::new("chunk", "m", 0.0);

        let outcome = generate_with_retry(&client, &request, &fast_policy(5), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RetryOutcome::Failed(Failure::Permanent { attempts: 1, .. })
        ));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_driver_treats_timeout_as_transient() {
        let mut client = MockProvider::default();
        client.add_delay("slow", Duration::from_secs(30));
        let request = GenerationRequest::new("slow", "m", 0.0);
        let policy = RetryPolicy {
            request_timeout_secs: 1,
            ..fast_policy(1)
        };

        let outcome = generate_with_retry(&client, &request, &policy, &CancellationToken::new())
            .await
            .unwrap();

        match outcome {
            RetryOutcome::Failed(Failure::Exhausted { attempts, last_error }) => {
                assert_eq!(attempts, 1);
                assert!(last_error.contains("no response within 1s"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_driver_honours_cancellation() {
        let mut client = MockProvider::default();
        client.add_delay("x", Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = GenerationRequest::new("x", "m", 0.0);

        let result = generate_with_retry(&client, &request, &fast_policy(3), &cancel).await;
        assert!(matches!(result, Err(ExtractorError::Cancelled)));
    }
}
