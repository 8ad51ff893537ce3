use anyhow::Result;
use colored::Colorize;
use declarative::ApplyResult;

use crate::Context;
use crate::config::AppConfig;
use crate::state::{self, RunRecord, RunStatus};
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let Some(record) = RunRecord::load()? else {
        if !ctx.quiet {
            ui::info("No apply run recorded yet");
            ui::dim("Run: provision apply <descriptor>");
        }
        return Ok(());
    };

    ui::header("Last Apply Run");
    show_run(&record);
    show_outcomes(&record, ctx.verbose > 0);
    show_config()?;

    println!();
    Ok(())
}

fn show_run(record: &RunRecord) {
    ui::section("Run");

    let status = match record.status {
        RunStatus::Succeeded => "succeeded".green(),
        RunStatus::Failed => "failed".red(),
        RunStatus::Cancelled => "cancelled".yellow(),
    };
    let mode = if record.dry_run { " (dry run)" } else { "" };
    ui::kv("Status", &format!("{status}{mode}"));
    ui::kv("Descriptor", &record.descriptor.display().to_string());
    ui::kv(
        "Finished",
        &format!(
            "{} ({}s)",
            record.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.duration().num_seconds()
        ),
    );

    match std::fs::read(&record.descriptor) {
        Ok(content) if state::fingerprint(&content) == record.fingerprint => {
            ui::kv("Drift", &"descriptor unchanged since this run".dimmed().to_string());
        }
        Ok(_) => ui::kv(
            "Drift",
            &"descriptor changed since this run".yellow().to_string(),
        ),
        Err(_) => ui::kv("Drift", &"descriptor no longer readable".yellow().to_string()),
    }

    if let Some(failure) = &record.failure {
        ui::kv(
            "Stopped at",
            &format!("resource[{}] {}", failure.index, failure.id.bold()),
        );
        ui::kv("Cause", &failure.message);
        if let Some(category) = failure.category {
            ui::dim(category.advice());
        }
    }
}

fn show_outcomes(record: &RunRecord, list_all: bool) {
    ui::section("Resources");

    let count = |pred: fn(&ApplyResult) -> bool| {
        record.outcomes.iter().filter(|o| pred(&o.result)).count()
    };
    ui::kv(
        "Outcome",
        &format!(
            "{} changed, {} already satisfied, {} skipped",
            count(ApplyResult::is_change).to_string().green(),
            count(|r| *r == ApplyResult::NoChange),
            count(|r| matches!(r, ApplyResult::Skipped { .. }))
        ),
    );

    if !list_all {
        return;
    }
    for outcome in &record.outcomes {
        let symbol = match &outcome.result {
            ApplyResult::NoChange => "○".dimmed(),
            ApplyResult::Created | ApplyResult::Modified => "✓".green(),
            ApplyResult::Skipped { .. } => "⊘".yellow(),
        };
        println!("    {} [{}] {}", symbol, outcome.index, outcome.id);
    }
}

fn show_config() -> Result<()> {
    ui::section("Configuration");

    let path = AppConfig::default_path()?;
    let config = AppConfig::load_from(&path)?;
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (defaults)", path.display())
    };
    ui::kv("Config", &source);
    ui::kv("Sources dir", &config.apt.sources_dir);
    ui::kv(
        "Retry",
        &format!(
            "{} attempts, {}s base delay, x{}",
            config.retry.max_attempts, config.retry.base_delay_secs, config.retry.backoff_factor
        ),
    );
    ui::kv("Force yes", &config.apt.force_yes.to_string());
    Ok(())
}
