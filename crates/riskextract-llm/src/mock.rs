//! Mock provider for deterministic testing

use async_trait::async_trait;
use riskextract_domain::{ExtractionClient, GenerationError, GenerationRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted reply
#[derive(Debug, Clone, PartialEq)]
pub enum MockOutcome {
    /// Return this text
    Respond(String),
    /// Fail with this error
    Fail(GenerationError),
}

#[derive(Debug, Clone)]
struct MockRule {
    needle: String,
    outcomes: VecDeque<MockOutcome>,
    delay: Option<Duration>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured outcomes without making any network calls.
/// Rules match when the prompt *contains* their needle (first matching
/// rule wins), which lets tests target a chunk by a phrase of its text.
/// A rule with several outcomes plays them in order and then repeats the
/// last one.
///
/// # Examples
///
/// ```
/// use riskextract_llm::MockProvider;
/// use riskextract_domain::{ExtractionClient, GenerationRequest};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut provider = MockProvider::new("{}");
/// provider.add_response("flood", r#"{"key_risk_factors": ["flood"]}"#);
///
/// let request = GenerationRequest::new("text about a flood", "m", 0.0);
/// assert!(provider.generate(&request).await.unwrap().contains("flood"));
/// assert_eq!(provider.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<MockRule>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a sequence of outcomes for prompts containing `needle`
    pub fn add_sequence(&mut self, needle: impl Into<String>, outcomes: Vec<MockOutcome>) {
        self.rules.lock().unwrap().push(MockRule {
            needle: needle.into(),
            outcomes: outcomes.into(),
            delay: None,
        });
    }

    /// Add a specific response for prompts containing `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.add_sequence(needle, vec![MockOutcome::Respond(response.into())]);
    }

    /// Fail transiently `failures` times, then respond
    pub fn add_transient_failures(
        &mut self,
        needle: impl Into<String>,
        failures: usize,
        then: impl Into<String>,
    ) {
        let mut outcomes: Vec<MockOutcome> = (0..failures)
            .map(|i| {
                MockOutcome::Fail(GenerationError::Transient(format!(
                    "mock transient failure {}",
                    i + 1
                )))
            })
            .collect();
        outcomes.push(MockOutcome::Respond(then.into()));
        self.add_sequence(needle, outcomes);
    }

    /// Always fail transiently
    pub fn add_transient_error(&mut self, needle: impl Into<String>) {
        self.add_sequence(
            needle,
            vec![MockOutcome::Fail(GenerationError::Transient(
                "mock rate limit".to_string(),
            ))],
        );
    }

    /// Always fail permanently
    pub fn add_permanent_error(&mut self, needle: impl Into<String>) {
        self.add_sequence(
            needle,
            vec![MockOutcome::Fail(GenerationError::Permanent(
                "mock authentication failure".to_string(),
            ))],
        );
    }

    /// Delay replies to prompts containing `needle` (applies to the latest matching rule)
    pub fn add_delay(&mut self, needle: impl Into<String>, delay: Duration) {
        let needle = needle.into();
        let mut rules = self.rules.lock().unwrap();
        match rules.iter_mut().rev().find(|r| r.needle == needle) {
            Some(rule) => rule.delay = Some(delay),
            None => rules.push(MockRule {
                needle,
                outcomes: VecDeque::from(vec![MockOutcome::Respond(
                    self.default_response.clone(),
                )]),
                delay: Some(delay),
            }),
        }
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Number of calls whose prompt contained `needle`
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Reset the call log
    pub fn reset_call_count(&self) {
        self.prompts.lock().unwrap().clear();
    }

    fn next_outcome(&self, prompt: &str) -> (MockOutcome, Option<Duration>) {
        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if !prompt.contains(&rule.needle) {
                continue;
            }
            let outcome = if rule.outcomes.len() > 1 {
                rule.outcomes.pop_front()
            } else {
                rule.outcomes.front().cloned()
            };
            if let Some(outcome) = outcome {
                return (outcome, rule.delay);
            }
        }
        (MockOutcome::Respond(self.default_response.clone()), None)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ExtractionClient for MockProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let (outcome, delay) = self.next_outcome(&request.prompt);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match outcome {
            MockOutcome::Respond(text) => Ok(text),
            MockOutcome::Fail(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
