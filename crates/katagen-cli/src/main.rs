//! `katagen generate` - run the generation pipeline against a spec file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use katagen_core::{
    ActivitySpec, GenerationConfig, GenerationPipeline, ProgressEvent, RunContext,
};
use katagen_judge::SandboxJudge;
use katagen_llm::OpenAiCompatibleClient;

mod generate;

/// katagen - validated practice-problem generation.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an activity from an ActivitySpec JSON file
    Generate {
        /// Path to the ActivitySpec JSON
        #[arg(short, long, value_name = "FILE")]
        spec: PathBuf,

        /// Output directory for the generated problems JSON
        #[arg(short, long, value_name = "DIR", default_value = "out")]
        out: PathBuf,

        /// Seed for deterministic ids (reproduction / debugging)
        #[arg(long)]
        seed: Option<u64>,

        /// Chat-completions base URL
        #[arg(long, default_value = "https://api.openai.com/v1")]
        base_url: String,

        /// Model name to request
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,

        /// Activity id to stamp on the run (assigned by the caller)
        #[arg(long, default_value = "local-activity")]
        activity_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            spec,
            out,
            seed,
            base_url,
            model,
            activity_id,
        } => {
            let spec: ActivitySpec = load_spec(&spec)?;
            let api_key = std::env::var("KATAGEN_API_KEY").ok();
            let llm = Arc::new(OpenAiCompatibleClient::new(base_url, api_key, model));
            let judge = Arc::new(SandboxJudge::new());
            let pipeline =
                GenerationPipeline::new(llm, judge, GenerationConfig::default());
            let ctx = match seed {
                Some(seed) => RunContext::seeded(activity_id, seed),
                None => RunContext::new(activity_id),
            };
            generate::run(&pipeline, &spec, &ctx, &out).await
        }
    }
}

fn load_spec(path: &PathBuf) -> Result<ActivitySpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading spec: {}", path.display()))?;
    let spec: ActivitySpec = serde_json::from_str(&content)
        .with_context(|| format!("parsing spec: {}", path.display()))?;
    spec.validate().context("invalid activity spec")?;
    Ok(spec)
}

/// Render one progress event as a human line, or None for events the
/// terminal view skips.
pub(crate) fn render_event(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::GenerationStarted {
            language,
            problem_count,
            ..
        } => Some(format!(
            "▶ Generating {problem_count} {language} problem(s)"
        )),
        ProgressEvent::SlotStarted {
            slot_index,
            difficulty,
            topics,
        } => Some(format!(
            "→ slot {slot_index}: {difficulty} on {}",
            topics.join(" + ")
        )),
        ProgressEvent::SlotLlmAttemptStarted { slot_index, attempt } => {
            Some(format!("  ○ slot {slot_index} attempt {attempt}"))
        }
        ProgressEvent::SlotContractFailed {
            slot_index,
            obligation_id,
            message,
            ..
        } => Some(format!(
            "  ✗ slot {slot_index} contract: {} ({message})",
            obligation_id.as_deref().unwrap_or("shape")
        )),
        ProgressEvent::SlotDockerValidationFailed {
            slot_index,
            kind,
            message,
            ..
        } => Some(format!("  ✗ slot {slot_index} {kind}: {message}")),
        ProgressEvent::SlotCompleted {
            slot_index, title, ..
        } => Some(format!("  ✓ slot {slot_index} complete: {title}")),
        ProgressEvent::GenerationSoftFallbackApplied(fallback) => Some(format!(
            "  ⚠ slot {} downgraded {} → {}",
            fallback.slot_index, fallback.from, fallback.to
        )),
        ProgressEvent::GenerationCompleted { problem_count, .. } => {
            Some(format!("✅ Generation complete: {problem_count} problem(s)"))
        }
        ProgressEvent::GenerationFailed { kind, message, .. } => {
            Some(format!("✗ Generation failed ({kind}): {message}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katagen_core::Difficulty;

    #[test]
    fn renders_completion_line() {
        let line = render_event(&ProgressEvent::GenerationCompleted {
            activity_id: "a".to_string(),
            problem_count: 2,
        })
        .unwrap();
        assert!(line.contains("2 problem(s)"));
    }

    #[test]
    fn skips_heartbeats() {
        assert!(render_event(&ProgressEvent::Heartbeat).is_none());
    }

    #[test]
    fn renders_slot_start_with_topics() {
        let line = render_event(&ProgressEvent::SlotStarted {
            slot_index: 1,
            difficulty: Difficulty::Hard,
            topics: vec!["polymorphism".to_string(), "collections".to_string()],
        })
        .unwrap();
        assert!(line.contains("polymorphism + collections"));
    }
}
