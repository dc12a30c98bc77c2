//! Drive one generation run: stream progress to the terminal, then write
//! the external drafts to disk.

use std::path::Path;

use anyhow::{Context, Result};

use katagen_core::{ActivitySpec, GenerationPipeline, RunContext};

use crate::render_event;

pub async fn run(
    pipeline: &GenerationPipeline,
    spec: &ActivitySpec,
    ctx: &RunContext,
    out_dir: &Path,
) -> Result<()> {
    let progress = pipeline.progress();
    let (history, mut rx) = progress.subscribe();
    for event in &history {
        if let Some(line) = render_event(&event.event) {
            println!("{line}");
        }
    }
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let Some(line) = render_event(&event.event) {
                println!("{line}");
            }
        }
    });

    let outcome = pipeline.generate_from_spec(spec, ctx).await;
    printer.abort();

    let output = outcome.context("generation failed")?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output dir {}", out_dir.display()))?;
    let path = out_dir.join(format!("activity-{}.json", ctx.activity_id));
    let payload = serde_json::json!({
        "activity_id": ctx.activity_id,
        "run_id": ctx.run_id,
        "problems": output.problems,
        "rewrites": output.rewrites,
        "soft_fallbacks": output.soft_fallbacks,
    });
    std::fs::write(&path, serde_json::to_string_pretty(&payload)?)
        .with_context(|| format!("writing {}", path.display()))?;

    println!("  wrote {}", path.display());
    if !output.soft_fallbacks.is_empty() {
        println!(
            "  note: {} slot(s) were downgraded from hard to medium",
            output.soft_fallbacks.len()
        );
    }
    Ok(())
}
