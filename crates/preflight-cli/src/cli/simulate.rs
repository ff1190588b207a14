//! `preflight simulate` — standalone policy evaluation for one action.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use preflight_core::collaborator::builtin::RiskTierGuard;
use preflight_core::runner::SimulationRunner;
use preflight_core::runner::store::InMemoryResultStore;
use preflight_types::testing::PolicySimulationRequest;

pub async fn handle_simulate(file: &Path, json: bool, quiet: bool) -> Result<()> {
    let yaml = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let request: PolicySimulationRequest =
        serde_yaml_ng::from_str(&yaml).with_context(|| "failed to parse simulation request")?;

    let runner =
        SimulationRunner::new(Arc::new(InMemoryResultStore::new())).with_guard(Arc::new(RiskTierGuard));
    let result = runner.simulate_policy(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    let verdict = if result.decision.allowed {
        style("ALLOWED").green().bold()
    } else {
        style("DENIED").red().bold()
    };

    println!();
    println!(
        "  Action '{}' ({}): {verdict}",
        style(&request.action.name).cyan(),
        request.action.risk_tier
    );
    println!("  Reason: {}", result.decision.reason);
    if result.decision.requires_human_approval {
        println!(
            "  {} Human approval required",
            style("!").yellow().bold()
        );
        if let Some(token) = &result.decision.approval_token {
            println!("  Approval token: {token}");
        }
    }
    println!("  Approval path: {}", result.approval_path.join(" -> "));
    println!("  Estimated approval time: {}", result.estimated_approval_time);
    println!();

    Ok(())
}
