//! # rulecheck-runtime
//!
//! Async evaluation pipeline for rulecheck.
//!
//! `rulecheck-core` owns the deterministic pieces: request validation,
//! PDF text extraction and strict parsing of model replies. This crate
//! adds everything that talks to a language model:
//!
//! - [`providers`]: the [`LlmProvider`] seam, the OpenAI backend (feature
//!   `openai`) and the registry that builds providers from config
//! - [`evaluator`]: one rule in, one verdict out, fallback on any failure
//! - [`orchestrator`]: validate, extract once, evaluate three rules
//!   concurrently, return verdicts in input order
//! - [`resilience`]: bounded retry and usage accounting
//! - [`cache`]: reuse of validated verdicts
//!
//! ## Example
//!
//! ```rust,ignore
//! use rulecheck_runtime::{EvaluationOrchestrator, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("rulecheck.yaml")?;
//! let provider = ProviderRegistry::with_defaults()
//!     .create(&config.provider.kind, &config.provider.settings)?;
//!
//! let orchestrator = EvaluationOrchestrator::builder()
//!     .provider(provider)
//!     .config(config)
//!     .build()?;
//!
//! let pdf = std::fs::read("contract.pdf")?;
//! let result = orchestrator
//!     .run(&pdf, &["Must be signed", "Must be dated", "Names a governing law"])
//!     .await?;
//! ```

pub mod cache;
pub mod config;
pub mod evaluator;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheKey, VerdictCache};
pub use config::{CacheConfig, ConfigError, ProviderConfig, RetryConfig, RuntimeConfig};
pub use evaluator::{EvaluationFailure, RuleEvaluation, RuleEvaluator, VerdictSource};
pub use orchestrator::{
    EvaluationOrchestrator, EvaluationOrchestratorBuilder, PipelineError, RuntimeResult,
};
pub use prompts::build_rule_prompt;
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    LlmProvider, ProviderError, ProviderFactory, ProviderRegistry, TokenUsage,
    STOP_REASON_LENGTH,
};
pub use resilience::{LlmUsage, UsageTracker};

#[cfg(feature = "openai")]
pub use providers::{OpenAiProvider, OpenAiProviderFactory};
