//! Scripted backends for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rulecheck_core::{ExtractedText, ExtractionError, TextExtractor};

use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
    STOP_REASON_LENGTH,
};

/// What the provider does for one call.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    /// Reply cut off at `max_tokens`
    Truncated(String),
    Error(ProviderError),
    /// Never completes
    Hang,
}

#[derive(Debug, Clone)]
struct Script {
    /// Matched against the prompt text; `None` matches everything
    needle: Option<String>,
    replies: Vec<Reply>,
    delay: Duration,
}

/// Fake backend that answers from a script.
///
/// A script is chosen by the first needle found in the prompt. Each script
/// replays its replies in order and repeats the last one once exhausted.
#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    scripts: Vec<Script>,
    cursors: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    completed: Mutex<Vec<String>>,
    usage: TokenUsage,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            cursors: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
            },
        }
    }

    /// Answer every call with `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new().fallback_script(vec![Reply::Text(reply.into())], Duration::ZERO)
    }

    /// Fail every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new().fallback_script(vec![Reply::Error(error)], Duration::ZERO)
    }

    /// Answer prompts containing `needle` with `reply` after `delay`.
    pub fn on(self, needle: impl Into<String>, reply: Reply, delay: Duration) -> Self {
        self.on_sequence(needle, vec![reply], delay)
    }

    /// Answer prompts containing `needle` with `replies`, one per call.
    pub fn on_sequence(
        mut self,
        needle: impl Into<String>,
        replies: Vec<Reply>,
        delay: Duration,
    ) -> Self {
        self.scripts.push(Script {
            needle: Some(needle.into()),
            replies,
            delay,
        });
        self.cursors.get_mut().push(0);
        self
    }

    fn fallback_script(mut self, replies: Vec<Reply>, delay: Duration) -> Self {
        self.scripts.push(Script {
            needle: None,
            replies,
            delay,
        });
        self.cursors.get_mut().push(0);
        self
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Needles of the scripts whose calls finished, in completion order.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    fn pick(&self, prompt: &str) -> Option<(usize, Reply)> {
        let index = self.scripts.iter().position(|script| match &script.needle {
            Some(needle) => prompt.contains(needle.as_str()),
            None => true,
        })?;

        let script = &self.scripts[index];
        let mut cursors = self.cursors.lock();
        let cursor = cursors[index];
        cursors[index] += 1;
        let reply = script
            .replies
            .get(cursor)
            .or_else(|| script.replies.last())
            .cloned()?;
        Some((index, reply))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let prompt: String = messages.iter().map(|m| m.content.as_str()).collect();
        let (index, reply) = self
            .pick(&prompt)
            .ok_or_else(|| ProviderError::NotConfigured("no script matches prompt".into()))?;

        let delay = self.scripts[index].delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = match reply {
            Reply::Text(content) => Ok(CompletionResponse {
                content,
                usage: self.usage,
                stop_reason: Some("stop".to_string()),
            }),
            Reply::Truncated(content) => Ok(CompletionResponse {
                content,
                usage: TokenUsage {
                    completion_tokens: config.max_tokens,
                    ..self.usage
                },
                stop_reason: Some(STOP_REASON_LENGTH.to_string()),
            }),
            Reply::Error(error) => Err(error),
            Reply::Hang => std::future::pending().await,
        };

        let label = self.scripts[index]
            .needle
            .clone()
            .unwrap_or_else(|| "*".to_string());
        self.completed.lock().push(label);
        result
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A well-formed verdict reply.
pub(crate) fn verdict_json(rule: &str, status: &str, confidence: f64) -> String {
    serde_json::json!({
        "rule": rule,
        "status": status,
        "evidence": format!("Evidence for {rule}"),
        "reasoning": format!("Reasoning for {rule}"),
        "confidence": confidence,
    })
    .to_string()
}

/// Extractor returning a fixed outcome and counting calls.
#[derive(Debug)]
pub(crate) struct StaticExtractor {
    outcome: Result<String, ExtractionError>,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            outcome: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ExtractionError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for StaticExtractor {
    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map(ExtractedText::new)
    }
}
