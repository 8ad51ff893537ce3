//! Diff and plan display - provision-specific UI

use colored::Colorize;
use declarative::{DiffSummary, ExecutionPlan, ResourceDiff, ResourceState, group_by_type};

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    let summary = DiffSummary::from_diffs(diffs);
    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Provisioning Diff".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in &group_by_type(diffs) {
        let type_name = match resource_type.as_str() {
            "repository" => "Repositories (apt sources)",
            "package" => "Packages (apt)",
            other => other,
        };
        println!("│ {}", type_name.bold());

        for diff in type_diffs {
            let symbol = if diff.is_modification() {
                "~".yellow()
            } else {
                "+".green()
            };

            println!(
                "│   {} {:<40} {}",
                symbol,
                diff.resource_id,
                state_change(&diff.current, &diff.desired).dimmed()
            );
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} to add, {} to change version)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn state_change(current: &ResourceState, desired: &ResourceState) -> String {
    match (current, desired) {
        (ResourceState::Absent, ResourceState::Present { details }) => format!(
            "(not present){}",
            details
                .as_ref()
                .map(|d| format!(" → {d}"))
                .unwrap_or_default()
        ),
        (ResourceState::Present { details: from }, ResourceState::Present { details: to }) => {
            format!(
                "{} → {}",
                from.as_deref().unwrap_or("installed"),
                to.as_deref().unwrap_or("any version")
            )
        }
        _ => String::new(),
    }
}

/// Display the apply order of a plan
pub fn display_plan(plan: &ExecutionPlan<'_>) {
    println!();
    for (position, step) in plan.iter().enumerate() {
        let resource = step.resource;
        let deps = resource.depends_on();
        let after = if deps.is_empty() {
            String::new()
        } else {
            format!(" (after {})", deps.join(", "))
        };
        println!(
            "  {} {:<40} {}{}",
            format!("{:>2}.", position + 1).blue(),
            resource.display_id(),
            resource.description().dimmed(),
            after.dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_change_text() {
        let absent = ResourceState::Absent;
        let pinned = ResourceState::Present {
            details: Some("4.01.0-1ppa4~precise".to_string()),
        };
        let old = ResourceState::Present {
            details: Some("3.12.1-2".to_string()),
        };

        assert_eq!(
            state_change(&absent, &pinned),
            "(not present) → 4.01.0-1ppa4~precise"
        );
        assert_eq!(
            state_change(&absent, &ResourceState::Present { details: None }),
            "(not present)"
        );
        assert_eq!(state_change(&old, &pinned), "3.12.1-2 → 4.01.0-1ppa4~precise");
    }
}
