//! Single-rule evaluation.
//!
//! [`RuleEvaluator`] turns one rule plus the document text into a
//! [`Verdict`]. It never fails outward: a backend error, an expired
//! timeout or an unusable reply is logged and replaced by
//! [`Verdict::fallback`], so one bad rule cannot sink its siblings.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use rulecheck_core::{parse_verdict, Rule, Verdict, VerdictError};

use crate::cache::{CacheKey, VerdictCache};
use crate::config::{RetryConfig, RuntimeConfig};
use crate::prompts::build_rule_prompt;
use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};
use crate::resilience::retry_transient;

/// Why a rule fell back. Logged, never returned to callers of `evaluate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationFailure {
    #[error("model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("unusable model reply: {0}")]
    InvalidResponse(#[from] VerdictError),

    #[error("reply cut off at max_tokens ({max_tokens}): {source}")]
    Truncated { max_tokens: u32, source: VerdictError },
}

/// Where a verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    /// Validated model reply
    Model,
    /// Earlier validated reply for the same inputs
    Cache,
    /// The fixed fallback verdict
    Fallback,
}

/// A verdict plus what it cost to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    pub verdict: Verdict,

    /// Tokens billed for the final model call, if one completed
    pub usage: Option<TokenUsage>,

    pub source: VerdictSource,

    /// Why the fallback was used; `None` for model and cache verdicts
    pub failure: Option<EvaluationFailure>,
}

impl RuleEvaluation {
    fn fallback(rule: &Rule, failure: EvaluationFailure, usage: Option<TokenUsage>) -> Self {
        tracing::warn!(
            rule = %rule,
            error = %failure,
            "Rule evaluation failed, using fallback verdict"
        );
        Self {
            verdict: Verdict::fallback(rule),
            usage,
            source: VerdictSource::Fallback,
            failure: Some(failure),
        }
    }
}

/// Checks one rule against document text through an [`LlmProvider`].
pub struct RuleEvaluator {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryConfig,
    cache: Option<VerdictCache>,
}

impl RuleEvaluator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RuntimeConfig) -> Self {
        Self {
            provider,
            completion: config.completion.clone(),
            retry: config.retry.clone(),
            cache: VerdictCache::from_config(&config.cache),
        }
    }

    pub fn completion(&self) -> &CompletionConfig {
        &self.completion
    }

    /// Evaluate `rule` against `text`. Always yields a verdict.
    pub async fn evaluate(&self, rule: &Rule, text: &str) -> Verdict {
        self.evaluate_detailed(rule, text).await.verdict
    }

    /// Like [`evaluate`](Self::evaluate), also reporting source and usage.
    pub async fn evaluate_detailed(&self, rule: &Rule, text: &str) -> RuleEvaluation {
        let key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::new(&self.completion.model, rule, text));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(verdict) = cache.get(key).await {
                tracing::debug!(rule = %rule, "Verdict served from cache");
                return RuleEvaluation {
                    verdict,
                    usage: None,
                    source: VerdictSource::Cache,
                    failure: None,
                };
            }
        }

        let messages = build_rule_prompt(rule, text);
        let response = match self.complete(&messages).await {
            Ok(response) => response,
            Err(err) => return RuleEvaluation::fallback(rule, err.into(), None),
        };

        let verdict = match parse_verdict(rule, &response.content) {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::debug!(
                    raw = %response.content,
                    stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
                    "Rejected model reply"
                );
                let failure = if response.is_truncated() {
                    EvaluationFailure::Truncated {
                        max_tokens: self.completion.max_tokens,
                        source: err,
                    }
                } else {
                    err.into()
                };
                return RuleEvaluation::fallback(rule, failure, Some(response.usage));
            }
        };

        tracing::debug!(
            rule = %rule,
            status = %verdict.status,
            confidence = verdict.confidence,
            tokens = response.usage.total(),
            "Rule evaluated"
        );

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(key, verdict.clone()).await;
        }

        RuleEvaluation {
            verdict,
            usage: Some(response.usage),
            source: VerdictSource::Model,
            failure: None,
        }
    }

    /// One bounded model call, retried on transient failure.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, ProviderError> {
        let provider = &*self.provider;
        let completion = &self.completion;

        retry_transient(&self.retry, move || async move {
            let call = provider.complete(messages.to_vec(), completion);
            match tokio::time::timeout(completion.timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(completion.timeout)),
            }
        })
        .await
    }
}

impl std::fmt::Debug for RuleEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEvaluator")
            .field("provider", &self.provider.name())
            .field("completion", &self.completion)
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish()
    }
}
