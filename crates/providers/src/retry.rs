//! Retrying content client — the single entry point every AI-producing stage
//! uses to talk to the backend.
//!
//! - Rate limiting (by error variant or message content) is retried with a
//!   fixed doubling backoff: 1s, 2s, 4s, 8s between up to five attempts.
//! - A length-limited response is a hard failure and is never retried:
//!   the same input under the same ceiling truncates the same way.
//! - Every other error propagates on the first occurrence.
//!
//! The wait itself goes through an injected [`Sleeper`], so the schedule
//! can be asserted in tests without real delays.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use toolscribe_config::AppConfig;
use toolscribe_core::error::GenerationError;
use toolscribe_core::provider::{CompletionRequest, FinishReason, Provider};
use toolscribe_core::CancelFlag;
use tracing::{debug, warn};

/// Something that can wait. Injected so backoff is testable.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waiting on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded exponential backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &toolscribe_config::RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
        }
    }

    /// The wait after the given (1-based) failed attempt: `initial × 2^(attempt-1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Wraps a [`Provider`] with retry, truncation detection and cancellation.
pub struct RetryingClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelFlag,
}

impl RetryingClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            cancel: CancelFlag::new(),
        }
    }

    /// Build a client with the model, temperature and retry schedule from config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self::new(provider, model)
            .with_temperature(config.default_temperature)
            .with_policy(RetryPolicy::from_config(&config.retry))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate text for one prompt pair under an output-token ceiling.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            max_output_tokens,
            temperature: self.temperature,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.cancel.is_cancelled() {
                return Err(GenerationError::Cancelled);
            }

            debug!(
                provider = %self.provider.name(),
                attempt,
                max_output_tokens,
                "Requesting completion"
            );

            match self.provider.complete(request.clone()).await {
                Ok(response) => {
                    return match response.finish_reason {
                        FinishReason::LengthLimited => {
                            warn!(max_output_tokens, "Completion truncated at output ceiling");
                            Err(GenerationError::Truncated { max_output_tokens })
                        }
                        _ if response.text.trim().is_empty() => Err(GenerationError::EmptyResponse),
                        FinishReason::Other(reason) => {
                            warn!(%reason, "Completion finished with unexpected reason, keeping output");
                            Ok(response.text)
                        }
                        FinishReason::Complete => Ok(response.text),
                    };
                }
                Err(e) if e.is_rate_limit() => {
                    if attempt >= self.policy.max_attempts {
                        warn!(attempts = attempt, error = %e, "Rate limit retries exhausted");
                        return Err(GenerationError::RetriesExhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Rate limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) => return Err(GenerationError::Provider(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use toolscribe_core::error::ProviderError;
    use toolscribe_core::provider::CompletionResponse;

    type Scripted = Result<CompletionResponse, ProviderError>;

    /// A provider that replays scripted outcomes and records requests.
    struct ScriptedProvider {
        outcomes: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Scripted>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::RateLimited { retry_after_secs: 1 }))
        }
    }

    /// Records requested waits instead of sleeping.
    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
        cancel_on_sleep: Option<CancelFlag>,
    }

    impl RecordingSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
            if let Some(flag) = &self.cancel_on_sleep {
                flag.cancel();
            }
        }
    }

    fn ok(text: &str) -> Scripted {
        Ok(CompletionResponse {
            text: text.into(),
            finish_reason: FinishReason::Complete,
            usage: None,
            model: "test-model".into(),
        })
    }

    fn truncated() -> Scripted {
        Ok(CompletionResponse {
            text: "partial".into(),
            finish_reason: FinishReason::LengthLimited,
            usage: None,
            model: "test-model".into(),
        })
    }

    fn rate_limited() -> Scripted {
        Err(ProviderError::RateLimited { retry_after_secs: 5 })
    }

    fn client(provider: Arc<ScriptedProvider>, sleeper: Arc<RecordingSleeper>) -> RetryingClient {
        RetryingClient::new(provider, "test-model").with_sleeper(sleeper)
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..=5).map(|a| policy.delay_after(a)).collect();
        assert_eq!(delays, secs(&[1, 2, 4, 8, 16]));
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_after(64) >= policy.delay_after(30));
    }

    #[tokio::test]
    async fn first_attempt_succeeds_without_waiting() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("hello")]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let text = client(provider.clone(), sleeper.clone())
            .complete("sys", "user", 256)
            .await
            .unwrap();

        assert_eq!(text, "hello");
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn request_carries_prompts_and_ceiling() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("x")]));
        let sleeper = Arc::new(RecordingSleeper::default());
        client(provider.clone(), sleeper)
            .complete("system text", "user text", 777)
            .await
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].system_prompt, "system text");
        assert_eq!(requests[0].user_prompt, "user text");
        assert_eq!(requests[0].max_output_tokens, 777);
        assert_eq!(requests[0].model, "test-model");
    }

    #[tokio::test]
    async fn rate_limits_back_off_then_succeed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            rate_limited(),
            rate_limited(),
            ok("done"),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let text = client(provider.clone(), sleeper.clone())
            .complete("s", "u", 100)
            .await
            .unwrap();

        assert_eq!(text, "done");
        assert_eq!(provider.calls(), 3);
        assert_eq!(sleeper.waits(), secs(&[1, 2]));
    }

    #[tokio::test]
    async fn persistent_rate_limit_exhausts_after_five_attempts() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = client(provider.clone(), sleeper.clone())
            .complete("s", "u", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::RetriesExhausted { attempts: 5, .. }));
        assert_eq!(provider.calls(), 5);
        assert_eq!(sleeper.waits(), secs(&[1, 2, 4, 8]));
    }

    #[tokio::test]
    async fn rate_limit_detected_from_message_is_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::ApiError {
                status_code: 400,
                message: "Too Many Requests: please slow down".into(),
            }),
            ok("fine"),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let text = client(provider.clone(), sleeper.clone())
            .complete("s", "u", 100)
            .await
            .unwrap();

        assert_eq!(text, "fine");
        assert_eq!(provider.calls(), 2);
        assert_eq!(sleeper.waits(), secs(&[1]));
    }

    #[tokio::test]
    async fn truncation_fails_immediately_without_retry() {
        let provider = Arc::new(ScriptedProvider::new(vec![truncated(), ok("never reached")]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = client(provider.clone(), sleeper.clone())
            .complete("s", "u", 500)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Truncated { max_output_tokens: 500 }));
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn other_errors_propagate_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = client(provider.clone(), sleeper.clone())
            .complete("s", "u", 100)
            .await
            .unwrap_err();

        match err {
            GenerationError::Provider(ProviderError::AuthenticationFailed(_)) => {}
            other => panic!("Expected AuthenticationFailed, got: {other:?}"),
        }
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn blank_output_is_an_empty_response() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("  \n")]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = client(provider, sleeper).complete("s", "u", 100).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn cancelled_before_first_attempt() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("x")]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = client(provider.clone(), sleeper)
            .with_cancel(cancel)
            .complete("s", "u", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Cancelled));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_is_checked_between_attempts() {
        let provider = Arc::new(ScriptedProvider::new(vec![rate_limited(), ok("x")]));
        let cancel = CancelFlag::new();
        let sleeper = Arc::new(RecordingSleeper {
            waits: Mutex::new(Vec::new()),
            cancel_on_sleep: Some(cancel.clone()),
        });
        let err = client(provider.clone(), sleeper)
            .with_cancel(cancel)
            .complete("s", "u", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Cancelled));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn custom_policy_limits_attempts() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let err = client(provider.clone(), sleeper.clone())
            .with_policy(RetryPolicy {
                max_attempts: 2,
                initial_delay: Duration::from_millis(10),
            })
            .complete("s", "u", 100)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(10)]);
    }

    #[test]
    fn from_config_prefers_provider_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "openai".into(),
            toolscribe_config::ProviderConfig {
                default_model: Some("gpt-4.1-mini".into()),
                ..Default::default()
            },
        );
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let client = RetryingClient::from_config(provider, &config);
        assert_eq!(client.model(), "gpt-4.1-mini");
        assert_eq!(client.policy().max_attempts, 5);
    }
}
