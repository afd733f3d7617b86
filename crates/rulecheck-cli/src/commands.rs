//! Command definitions, dispatch and output rendering.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};

use rulecheck_core::{EvaluationResult, ExtractedText, PdfTextExtractor, TextExtractor};
use rulecheck_runtime::{
    EvaluationOrchestrator, ProviderRegistry, RuntimeConfig, RuntimeResult, VerdictSource,
};

/// Check a PDF against natural-language rules using a language model.
#[derive(Parser, Debug)]
#[command(name = "rulecheck", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Verbosity (-v for debug, -vv for trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Evaluate a PDF against exactly three rules.
    Check {
        /// PDF file to check.
        pdf: PathBuf,

        /// Rule to check; pass exactly three times.
        #[arg(short, long = "rule", value_name = "RULE", required = true)]
        rules: Vec<String>,

        /// Runtime config (YAML). Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured model.
        #[arg(long)]
        model: Option<String>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print the text extracted from a PDF.
    Extract {
        /// PDF file to read.
        pdf: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// JSON array of verdicts
    Json,
    /// Human-readable summary
    Text,
}

/// Install the stderr subscriber.
pub(crate) fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "warn",
        1 => "rulecheck_runtime=debug,rulecheck_core=debug,warn",
        _ => "rulecheck_runtime=trace,rulecheck_core=trace,info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Check {
            pdf,
            rules,
            config,
            model,
            format,
        } => check(&pdf, &rules, config.as_deref(), model, format).await,
        Command::Extract { pdf } => extract(&pdf).await,
    }
}

async fn check(
    pdf: &Path,
    rules: &[String],
    config_path: Option<&Path>,
    model: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(model) = model {
        config.completion.model = model;
    }

    let provider = ProviderRegistry::with_defaults()
        .create(&config.provider.kind, &config.provider.settings)
        .context("creating model provider")?;
    if !provider.health_check().await {
        anyhow::bail!("provider '{}' is not usable; check its API key", provider.name());
    }
    tracing::debug!(provider = provider.name(), model = %config.completion.model, "Provider ready");

    let orchestrator = EvaluationOrchestrator::builder()
        .provider(provider)
        .config(config)
        .build()?;

    let document = tokio::fs::read(pdf)
        .await
        .with_context(|| format!("reading {}", pdf.display()))?;

    let result = orchestrator.run_detailed(&document, rules).await?;

    let rendered = match format {
        OutputFormat::Json => render_json(&result.evaluation)?,
        OutputFormat::Text => render_text(&result),
    };
    println!("{rendered}");
    Ok(())
}

async fn extract(pdf: &Path) -> Result<()> {
    let text = extract_text(pdf).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_str().as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Read `pdf` and pull out its text layer off the async runtime.
async fn extract_text(pdf: &Path) -> Result<ExtractedText> {
    let document = tokio::fs::read(pdf)
        .await
        .with_context(|| format!("reading {}", pdf.display()))?;

    let text = tokio::task::spawn_blocking(move || PdfTextExtractor::new().extract(&document))
        .await
        .context("extraction task failed")?
        .with_context(|| format!("extracting text from {}", pdf.display()))?;

    if text.is_blank() {
        tracing::warn!(path = %pdf.display(), "No extractable text");
    }
    Ok(text)
}

fn render_json(evaluation: &EvaluationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(evaluation)?)
}

fn render_text(result: &RuntimeResult) -> String {
    let mut out = String::new();

    for (verdict, source) in result.evaluation.iter().zip(result.sources) {
        let marker = if verdict.passed() { "PASS" } else { "FAIL" };
        out.push_str(&format!(
            "[{marker}] {} (confidence {})\n",
            verdict.rule, verdict.confidence
        ));
        out.push_str(&format!("  evidence:  {}\n", verdict.evidence));
        out.push_str(&format!("  reasoning: {}\n", verdict.reasoning));
        if source != VerdictSource::Model {
            out.push_str(&format!("  source:    {}\n", source_label(source)));
        }
    }

    let usage = &result.llm_usage;
    out.push_str(&format!(
        "\n{}/{} passed, {} tokens, ~${:.4}",
        result.evaluation.passed_count(),
        result.evaluation.verdicts().len(),
        usage.total_tokens,
        usage.estimated_cost
    ));
    if result.fallbacks > 0 {
        out.push_str(&format!(", {} fallback", result.fallbacks));
    }
    out
}

fn source_label(source: VerdictSource) -> &'static str {
    match source {
        VerdictSource::Model => "model",
        VerdictSource::Cache => "cache",
        VerdictSource::Fallback => "fallback",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rulecheck_core::{Rule, Status, Verdict};
    use rulecheck_runtime::LlmUsage;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "rulecheck", "check", "contract.pdf", "-r", "Must be signed", "--rule",
            "Must be dated", "-r", "Names a governing law", "--format", "text", "-v",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Check {
                pdf, rules, format, config, ..
            } => {
                assert_eq!(pdf, PathBuf::from("contract.pdf"));
                assert_eq!(rules, ["Must be signed", "Must be dated", "Names a governing law"]);
                assert_eq!(format, OutputFormat::Text);
                assert!(config.is_none());
            }
            other => panic!("Expected check, got {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_rules() {
        assert!(Cli::try_parse_from(["rulecheck", "check", "contract.pdf"]).is_err());
    }

    fn sample() -> RuntimeResult {
        let signed = Rule::new("Must be signed").unwrap();
        let dated = Rule::new("Must be dated").unwrap();
        let law = Rule::new("Names a governing law").unwrap();
        let pass = Verdict {
            rule: signed.as_str().to_string(),
            status: Status::Pass,
            evidence: "Signed by both parties".into(),
            reasoning: "Signature block present".into(),
            confidence: 92,
        };
        let fail = Verdict {
            rule: dated.as_str().to_string(),
            status: Status::Fail,
            evidence: "No date found".into(),
            reasoning: "Signature block is undated".into(),
            confidence: 70,
        };

        RuntimeResult {
            evaluation: EvaluationResult::new([pass, fail, Verdict::fallback(&law)]),
            sources: [VerdictSource::Model, VerdictSource::Cache, VerdictSource::Fallback],
            llm_usage: LlmUsage::default(),
            fallbacks: 1,
            evaluated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_render_json_is_plain_array() {
        let json = render_json(&sample().evaluation).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let verdicts = value.as_array().unwrap();
        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts[0]["status"], "pass");
        assert_eq!(verdicts[0]["confidence"], 92);
        assert_eq!(verdicts[2]["evidence"], "Unable to analyze");
    }

    fn one_page_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[tokio::test]
    async fn test_extract_reads_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        std::fs::write(&path, one_page_pdf("The vendor is responsible for delivery")).unwrap();

        let text = extract_text(&path).await.unwrap();

        assert!(!text.is_blank());
        assert!(text.as_str().contains("vendor"));
    }

    #[tokio::test]
    async fn test_extract_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"plain text, not a PDF").unwrap();

        let err = extract_text(&path).await.unwrap_err();
        assert!(err.to_string().contains("notes.pdf"));
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_text(&dir.path().join("absent.pdf")).await.unwrap_err();
        assert!(err.to_string().starts_with("reading "));
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());

        assert!(text.contains("[PASS] Must be signed (confidence 92)"));
        assert!(text.contains("[FAIL] Must be dated (confidence 70)"));
        assert!(text.contains("source:    cache"));
        assert!(text.contains("source:    fallback"));
        assert!(text.contains("1/3 passed"));
        assert!(text.contains("1 fallback"));
    }
}
