//! Preflight CLI entry point.
//!
//! Binary name: `preflight`
//!
//! Parses CLI arguments, initializes tracing, then dispatches to the
//! validate / test / simulate handlers. The process exits with code 1
//! when a workflow is not deployable or a test run does not pass.

mod cli;

use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Map verbosity to a default filter; RUST_LOG still wins.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,preflight=debug",
        _ => "trace",
    };
    if let Err(e) = preflight_observe::tracing_setup::init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let ok = match cli.command {
        Commands::Validate { file } => cli::validate::handle_validate(&file, cli.json, cli.quiet)?,
        Commands::Test {
            file,
            mode,
            fail_gate,
            report,
        } => {
            cli::test::handle_test(&file, mode.into(), fail_gate, report, cli.json, cli.quiet)
                .await?
        }
        Commands::Simulate { file } => {
            cli::simulate::handle_simulate(&file, cli.json, cli.quiet).await?;
            true
        }
    };

    preflight_observe::tracing_setup::shutdown_tracing();
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
