//! Declarative commands for the provision CLI
//!
//! - `apply` - Make the system match a descriptor
//! - `diff` - Preview what apply would change
//! - `validate` - Check a descriptor and show its apply order

use anyhow::{Context as AnyhowContext, Result};
use aptkit::adapter::apt::AptAdapter;
use chrono::Utc;
use declarative::{CancelToken, Descriptor, ExecuteOptions, ExecutionPlan, compute_diffs};
use std::path::Path;

use crate::Context;
use crate::cli::{ApplyArgs, DiffArgs};
use crate::config::AppConfig;
use crate::engine::{differ, executor};
use crate::state::{self, RunRecord};
use crate::sudo::{self, SudoContext};
use crate::{progress, ui};

/// Load and validate a descriptor, keeping its text for fingerprinting
fn load_descriptor(path: &Path) -> Result<(Descriptor, String)> {
    let loaded = Descriptor::load_with_content(path)
        .with_context(|| format!("Could not load descriptor {}", path.display()))?;

    log::info!(
        "Loaded {} resources from {}",
        loaded.0.len(),
        path.display()
    );
    Ok(loaded)
}

fn filtered_plan<'a>(descriptor: &'a Descriptor, only: Option<&str>) -> Result<ExecutionPlan<'a>> {
    let plan = ExecutionPlan::for_target(descriptor, only)?;
    if let Some(target) = only {
        log::debug!("Filter '{}' kept {} of {} resources", target, plan.len(), descriptor.len());
    }
    Ok(plan)
}

// ============================================================================
// validate
// ============================================================================

pub fn validate(ctx: &Context, path: &Path) -> Result<()> {
    let (descriptor, _) = load_descriptor(path)?;

    if ctx.quiet {
        return Ok(());
    }

    ui::header(&format!("Descriptor {}", path.display()));
    let plan = ExecutionPlan::from_descriptor(&descriptor);
    differ::display_plan(&plan);
    println!();
    ui::success(&format!("{} resources, valid", descriptor.len()));
    Ok(())
}

// ============================================================================
// diff
// ============================================================================

pub fn diff(ctx: &Context, args: DiffArgs) -> Result<()> {
    let config = AppConfig::load()?;
    let (descriptor, _) = load_descriptor(&args.descriptor)?;
    let plan = filtered_plan(&descriptor, args.only.as_deref())?;

    let adapter = AptAdapter::new(config.apt_options(sudo::is_root()))
        .context("Could not set up the APT adapter")?;

    let spinner = (!ctx.quiet).then(|| progress::spinner("Querying package state..."));
    let diffs = compute_diffs(&plan, &adapter, &config.retry_config());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    differ::display_diff(&diffs?);
    Ok(())
}

// ============================================================================
// apply
// ============================================================================

pub fn apply(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let config = AppConfig::load()?.with_overrides(args.retries, args.force_yes);
    let (descriptor, raw) = load_descriptor(&args.descriptor)?;
    let plan = filtered_plan(&descriptor, args.only.as_deref())?;

    if plan.is_empty() {
        ui::warn("Nothing to apply");
        return Ok(());
    }

    let apt_options = config.apt_options(sudo::is_root());
    let use_sudo = apt_options.use_sudo;
    let adapter = AptAdapter::new(apt_options).context("Could not set up the APT adapter")?;
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        retry: config.retry_config(),
    };

    if !args.dry_run {
        let diffs = {
            let spinner = (!ctx.quiet).then(|| progress::spinner("Querying package state..."));
            let diffs = compute_diffs(&plan, &adapter, &opts.retry);
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            diffs?
        };

        if !ctx.quiet {
            differ::display_diff(&diffs);
        }
        if diffs.is_empty() {
            return Ok(());
        }

        if !args.yes && !executor::confirm_proceed()? {
            println!();
            ui::error("Aborted");
            return Ok(());
        }
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupt received, stopping after the current resource");
        handler_token.cancel();
    })
    .context("Could not install Ctrl-C handler")?;

    let _sudo = if use_sudo && !args.dry_run {
        Some(SudoContext::acquire("Install packages and register apt repositories")?)
    } else {
        None
    };

    let started_at = Utc::now();
    let result = executor::execute(&plan, &adapter, &opts, &cancel, ctx.quiet);

    let record = RunRecord::from_result(
        &args.descriptor,
        state::fingerprint(raw.as_bytes()),
        started_at,
        args.dry_run,
        &result,
    );
    match record.save() {
        Ok(path) => log::debug!("Run recorded at {}", path.display()),
        Err(e) => log::warn!("Could not record run: {e:#}"),
    }

    match result {
        Ok(summary) => {
            if !ctx.quiet {
                executor::print_summary(&summary, args.dry_run);
            }
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
