//! Execution engine - provision-specific executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyError, ApplyErrorKind, ApplyResult, CancelToken, ExecuteOptions, ExecuteSummary,
    ExecutionPlan, ProgressCallback,
};
use indicatif::ProgressBar;
use std::io::{self, Write};

use crate::progress;

/// Progress callback drawing a bar, with one line per finished resource
pub struct BarProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if !self.quiet {
            self.bar = Some(progress::bar(count as u64, "Applying"));
        }
    }

    fn on_resource_start(&mut self, id: &str, _description: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(id.to_string());
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        let Some(pb) = &self.bar else {
            return;
        };

        let line = match result {
            ApplyResult::NoChange => format!("    {} {}", "○".dimmed(), id.dimmed()),
            ApplyResult::Created => format!("    {} {}", "✓".green(), id),
            ApplyResult::Modified => format!("    {} {} {}", "✓".green(), id, "(changed)".dimmed()),
            ApplyResult::Skipped { reason } => {
                format!("    {} {} {}", "⊘".yellow(), id, format!("({reason})").dimmed())
            }
        };
        pb.println(line);
        pb.inc(1);
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Run the plan with a progress bar
pub fn execute<A: aptkit::Adapter + ?Sized>(
    plan: &ExecutionPlan<'_>,
    adapter: &A,
    opts: &ExecuteOptions,
    cancel: &CancelToken,
    quiet: bool,
) -> Result<ExecuteSummary, ApplyError> {
    if !quiet {
        println!();
        let verb = if opts.dry_run { "Checking" } else { "Applying" };
        println!("  {} {} {} resources...", "→".cyan(), verb, plan.len());
    }

    let mut progress = BarProgress::new(quiet);
    declarative::execute(plan, adapter, opts, &mut progress, cancel)
}

/// Confirm with user
pub fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!(
            "  {} Dry run - {} resources would change, no changes made",
            "ℹ".blue(),
            summary.skipped
        );
        return;
    }

    if summary.total_changes() == 0 {
        println!("  {} Already up to date", "✓".green().bold());
    } else {
        println!("  {} Descriptor applied successfully!", "✓".green().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources changed version", summary.modified);
    }
    if summary.no_change > 0 {
        println!("    • {} resources already satisfied", summary.no_change);
    }
}

/// Print the failure that stopped a run, to stderr
pub fn print_failure(err: &ApplyError) {
    if let Err(e) = write_failure(&mut io::stderr().lock(), err) {
        log::debug!("Could not write failure report: {e}");
    }
}

fn write_failure(out: &mut impl Write, err: &ApplyError) -> io::Result<()> {
    writeln!(out)?;
    match &err.kind {
        ApplyErrorKind::Cancelled => {
            writeln!(
                out,
                "  {} Cancelled before resource[{}] {}",
                "⚠".yellow().bold(),
                err.index,
                err.id
            )?;
        }
        ApplyErrorKind::Fatal(e) | ApplyErrorKind::Exhausted { last: e, .. } => {
            writeln!(
                out,
                "  {} Failed at resource[{}] {}",
                "✗".red().bold(),
                err.index,
                err.id.bold()
            )?;
            writeln!(out, "    {}", err.kind)?;
            let category = e.category();
            writeln!(out, "    {} {}", "category:".dimmed(), category)?;
            writeln!(out, "    {} {}", "hint:".dimmed(), category.advice())?;
        }
    }

    let done = err.summary.total_changes();
    if done > 0 {
        writeln!(
            out,
            "    • {done} resources were applied before the failure and are left in place"
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure_text(err: &ApplyError) -> String {
        let mut out = Vec::new();
        write_failure(&mut out, err).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_failure_report_names_resource_and_cause() {
        let err = ApplyError {
            index: 2,
            id: "package:ocaml".to_string(),
            kind: ApplyErrorKind::Fatal(aptkit::Error::Permission {
                message: "are you root?".to_string(),
            }),
            summary: ExecuteSummary {
                created: 2,
                ..ExecuteSummary::default()
            },
        };

        let text = failure_text(&err);
        assert!(text.contains("Failed at resource[2]"));
        assert!(text.contains("package:ocaml"));
        assert!(text.contains("are you root?"));
        assert!(text.contains("2 resources were applied before the failure"));
    }

    #[test]
    fn test_cancel_report() {
        let err = ApplyError {
            index: 4,
            id: "package:ocaml-native-compilers".to_string(),
            kind: ApplyErrorKind::Cancelled,
            summary: ExecuteSummary::default(),
        };

        let text = failure_text(&err);
        assert!(text.contains("Cancelled before resource[4] package:ocaml-native-compilers"));
        assert!(!text.contains("applied before the failure"));
    }
}
