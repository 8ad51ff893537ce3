//! Execution engine - applies resources sequentially in plan order

use crate::context::{CancelToken, NoProgress, ProgressCallback};
use crate::error::{ApplyError, ApplyErrorKind};
use crate::planner::ExecutionPlan;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceOutcome};
use aptkit::retry::{LogCallback, with_retry};
use aptkit::{Adapter, RetryConfig};

/// Execute a plan against an adapter
///
/// Resources are applied one at a time in plan order. For each one the
/// current state is queried; a satisfied resource is left alone, otherwise
/// the adapter's install/add call is made. Transient adapter errors are
/// retried per `opts.retry`; the first error that survives retrying stops
/// the run and nothing after it is touched.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `adapter` - Target system
/// * `opts` - Execution options (dry_run, retry)
/// * `progress` - Progress callback
/// * `cancel` - Checked before each resource
///
/// # Returns
/// Summary of execution results, or the failure with the partial summary
pub fn execute<A, P>(
    plan: &ExecutionPlan<'_>,
    adapter: &A,
    opts: &ExecuteOptions,
    progress: &mut P,
    cancel: &CancelToken,
) -> Result<ExecuteSummary, ApplyError>
where
    A: Adapter + ?Sized,
    P: ProgressCallback,
{
    let mut summary = ExecuteSummary::default();

    progress.on_batch_start(plan.len());
    let outcome = apply_steps(plan, adapter, opts, progress, cancel, &mut summary);
    progress.on_batch_complete();

    outcome.map(|()| summary)
}

fn apply_steps<A, P>(
    plan: &ExecutionPlan<'_>,
    adapter: &A,
    opts: &ExecuteOptions,
    progress: &mut P,
    cancel: &CancelToken,
    summary: &mut ExecuteSummary,
) -> Result<(), ApplyError>
where
    A: Adapter + ?Sized,
    P: ProgressCallback,
{
    for step in plan.iter() {
        let resource = step.resource;
        let id = resource.display_id();

        if cancel.is_cancelled() {
            log::warn!("cancelled before {id}");
            return Err(ApplyError {
                index: step.index,
                id,
                kind: ApplyErrorKind::Cancelled,
                summary: summary.clone(),
            });
        }

        progress.on_resource_start(&id, &resource.description());

        let current = retrying(&opts.retry, step.index, &id, summary, || {
            resource.current_state(adapter)
        })?;
        let desired = resource.desired_state();

        let result = if current.satisfies(&desired) {
            log::info!("{id}: already satisfied");
            ApplyResult::NoChange
        } else if opts.dry_run {
            ApplyResult::Skipped {
                reason: "dry run".to_string(),
            }
        } else {
            retrying(&opts.retry, step.index, &id, summary, || {
                resource.converge(adapter)
            })?;
            log::info!("{id}: applied {}", resource.description());
            if current.is_absent() {
                ApplyResult::Created
            } else {
                ApplyResult::Modified
            }
        };

        progress.on_resource_complete(&id, &result);
        summary.record(ResourceOutcome {
            index: step.index,
            id,
            result,
        });
    }

    Ok(())
}

/// Run one adapter operation through the retry wrapper, turning a final
/// failure into an `ApplyError` for the given step.
pub(crate) fn retrying<T>(
    retry: &RetryConfig,
    index: usize,
    id: &str,
    summary: &ExecuteSummary,
    mut operation: impl FnMut() -> aptkit::Result<T>,
) -> Result<T, ApplyError> {
    let mut attempts = 0;
    with_retry(retry, Some(&LogCallback { subject: id }), || {
        attempts += 1;
        operation()
    })
    .map_err(|e| ApplyError::from_adapter(index, id.to_string(), e, attempts, summary.clone()))
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or cancellation.
pub fn execute_simple<A: Adapter + ?Sized>(
    plan: &ExecutionPlan<'_>,
    adapter: &A,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary, ApplyError> {
    execute(plan, adapter, opts, &mut NoProgress, &CancelToken::new())
}
