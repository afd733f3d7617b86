//! Evaluation pipeline.
//!
//! One run is:
//! - Validate the request (exactly three non-empty rules, a document)
//! - Extract the document text once, on the blocking pool
//! - Fan out one [`RuleEvaluator`] call per rule via `tokio::join!`
//! - Fan in the verdicts in input order
//!
//! Request and extraction errors abort the run before any model call.
//! Per-rule failures never do; they come back as fallback verdicts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use rulecheck_core::{
    validate_request, EvaluationResult, ExtractedText, ExtractionError, PdfTextExtractor,
    RequestError, Rule, TextExtractor, RULES_PER_REQUEST,
};

use crate::config::{ConfigError, RuntimeConfig};
use crate::evaluator::{RuleEvaluation, RuleEvaluator, VerdictSource};
use crate::providers::LlmProvider;
use crate::resilience::{LlmUsage, UsageTracker};

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),
}

/// Result of one run, with accounting.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeResult {
    /// The three verdicts, in rule order
    pub evaluation: EvaluationResult,

    /// Where each verdict came from, in rule order
    pub sources: [VerdictSource; RULES_PER_REQUEST],

    /// Model usage for this run only
    pub llm_usage: LlmUsage,

    /// Number of fallback verdicts
    pub fallbacks: usize,

    pub evaluated_at: DateTime<Utc>,
}

/// Runs the extract-then-evaluate pipeline.
pub struct EvaluationOrchestrator {
    extractor: Arc<dyn TextExtractor>,
    evaluator: RuleEvaluator,
    usage: UsageTracker,
}

impl EvaluationOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        extractor: Arc<dyn TextExtractor>,
        config: &RuntimeConfig,
    ) -> Self {
        Self {
            extractor,
            evaluator: RuleEvaluator::new(provider, config),
            usage: UsageTracker::new(),
        }
    }

    pub fn builder() -> EvaluationOrchestratorBuilder {
        EvaluationOrchestratorBuilder::new()
    }

    /// Check `document` against exactly three `rules`.
    pub async fn run<S: AsRef<str>>(
        &self,
        document: &[u8],
        rules: &[S],
    ) -> Result<EvaluationResult, PipelineError> {
        Ok(self.run_detailed(document, rules).await?.evaluation)
    }

    /// Like [`run`](Self::run), also reporting sources and usage.
    pub async fn run_detailed<S: AsRef<str>>(
        &self,
        document: &[u8],
        rules: &[S],
    ) -> Result<RuntimeResult, PipelineError> {
        let rules = validate_request(document, rules)?;

        let text = self.extract(document).await?;
        if text.is_blank() {
            tracing::warn!("Document has no extractable text; rules will be judged against nothing");
        }
        tracing::debug!(chars = text.len(), "Extracted document text");
        let text: Arc<str> = text.into();

        // Fan-out: one evaluation per rule
        let [first, second, third] = rules.rules();
        let (first, second, third) = tokio::join!(
            self.evaluate_rule(0, first, &text),
            self.evaluate_rule(1, second, &text),
            self.evaluate_rule(2, third, &text),
        );

        // Fan-in: input order
        let evaluations = [first, second, third];
        let mut llm_usage = LlmUsage::default();
        for evaluation in &evaluations {
            if let Some(tokens) = &evaluation.usage {
                llm_usage.add(tokens, &self.evaluator.completion().model);
            }
            match evaluation.source {
                VerdictSource::Cache => llm_usage.cache_hits += 1,
                VerdictSource::Fallback => llm_usage.fallbacks += 1,
                VerdictSource::Model => {}
            }
        }
        self.usage.record(&llm_usage);

        let sources = evaluations.each_ref().map(|evaluation| evaluation.source);
        let fallbacks = llm_usage.fallbacks as usize;
        let evaluation = EvaluationResult::new(evaluations.map(|evaluation| evaluation.verdict));

        tracing::info!(
            passed = evaluation.passed_count(),
            fallbacks,
            tokens = llm_usage.total_tokens,
            "Evaluation complete"
        );

        Ok(RuntimeResult {
            evaluation,
            sources,
            llm_usage,
            fallbacks,
            evaluated_at: Utc::now(),
        })
    }

    /// Extract document text without evaluating anything.
    pub async fn extract(&self, document: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let extractor = Arc::clone(&self.extractor);
        let bytes = document.to_vec();

        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|err| ExtractionError::Task(err.to_string()))?
    }

    async fn evaluate_rule(&self, index: usize, rule: &Rule, text: &str) -> RuleEvaluation {
        self.evaluator
            .evaluate_detailed(rule, text)
            .instrument(tracing::debug_span!("rule", index))
            .await
    }

    /// Usage accumulated across every run so far.
    pub fn usage(&self) -> LlmUsage {
        self.usage.snapshot()
    }

    pub fn reset_usage(&self) {
        self.usage.reset();
    }
}

impl std::fmt::Debug for EvaluationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationOrchestrator")
            .field("evaluator", &self.evaluator)
            .field("usage", &self.usage)
            .finish()
    }
}

/// Builder for [`EvaluationOrchestrator`].
pub struct EvaluationOrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    extractor: Option<Arc<dyn TextExtractor>>,
    config: RuntimeConfig,
}

impl EvaluationOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            extractor: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the model backend.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the default PDF extractor.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator. Fails without a provider or on invalid config.
    pub fn build(self) -> Result<EvaluationOrchestrator, PipelineError> {
        let provider = self
            .provider
            .ok_or_else(|| PipelineError::ProviderNotConfigured("No provider set".to_string()))?;
        self.config.validate()?;

        let extractor: Arc<dyn TextExtractor> = match self.extractor {
            Some(extractor) => extractor,
            None => Arc::new(PdfTextExtractor::new()),
        };

        Ok(EvaluationOrchestrator::new(provider, extractor, &self.config))
    }
}

impl Default for EvaluationOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
