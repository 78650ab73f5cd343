//! LLM-backed implementation of the decision oracle.
//!
//! The oracle is an external collaborator: potentially slow, potentially
//! failing, non-idempotent in content. The client gives the call its own
//! generous timeout and a rate limit, and leaves all shape validation to
//! [`crate::types::parse_decisions`].

use crate::error::{OracleError, Result};
use crate::prompt::build_prompt;
use crate::types::{parse_decisions, Decision, OpenPosition};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use chrono::Utc;
use edgebet_strategy::Candidate;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// The boundary to the probability-estimation oracle.
///
/// Implementations may be slow, may fail, and may return different output
/// for identical input. Callers own validation of whatever comes back.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Asks the oracle for decisions over a candidate batch.
    ///
    /// Returns zero or more validated decisions; zero is a normal outcome
    /// (the oracle passed, or nothing survived validation).
    async fn decide(
        &self,
        candidates: &[Candidate],
        portfolio: &[OpenPosition],
    ) -> Result<Vec<Decision>>;
}

/// Decision oracle backed by an OpenAI-compatible chat completions API.
pub struct LlmOracle {
    client: Client<OpenAIConfig>,
    model: String,
    timeout_secs: u64,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl std::fmt::Debug for LlmOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmOracle")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl LlmOracle {
    /// Creates an oracle client from configuration.
    ///
    /// # Errors
    /// Returns [`OracleError::Configuration`] if the API key environment
    /// variable is missing — the pipeline cannot do anything useful
    /// without its oracle, so this is checked at startup.
    pub fn from_config(config: &edgebet_core::OracleConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            OracleError::Configuration(format!(
                "missing environment variable: {}",
                config.api_key_env
            ))
        })?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.base_url);

        let rpm = NonZeroU32::new(config.rate_limit_rpm.max(1)).expect("rpm is at least 1");
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            limiter,
        })
    }

    /// Returns the configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    async fn decide(
        &self,
        candidates: &[Candidate],
        portfolio: &[OpenPosition],
    ) -> Result<Vec<Decision>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        self.limiter.until_ready().await;

        let prompt = build_prompt(candidates, portfolio, Utc::now().date_naive());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You are a careful forecasting assistant that outputs strict JSON.")
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        tracing::info!(
            model = %self.model,
            candidates = candidates.len(),
            "requesting oracle decision"
        );

        let response = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| OracleError::timeout(self.timeout_secs))??;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| OracleError::InvalidResponse("no content in completion".to_string()))?;

        parse_decisions(content, candidates)
    }
}
