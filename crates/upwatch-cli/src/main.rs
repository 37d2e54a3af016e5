//! upwatch CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use upwatch_cli::cli::{Cli, Commands};
use upwatch_cli::client::ClientConfig;
use upwatch_cli::commands::{FollowCommand, WatchCommand};
use upwatch_cli::output::OutputFormat;
use upwatch_core::{Mode, StopReason};

fn main() -> ExitCode {
    // Logs share stderr with error reports, stdout carries data only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(reason) => {
            info!(?reason, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<StopReason, upwatch_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let client = ClientConfig {
        base_url: cli.api_url,
        token: cli.token,
        timeout: cli.timeout,
    };
    let mode = Mode::detect();
    let cancel = cancel_on_interrupt();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();

    match cli.command {
        Commands::Watch(args) => {
            let cmd = WatchCommand::new(client);
            cmd.execute(&mut stdout, &mut stderr, &format, &args, mode, cancel).await
        }
        Commands::Follow(args) => {
            let cmd = FollowCommand::new(client);
            cmd.execute(&mut stdout, &mut stderr, &format, &args, mode, cancel).await
        }
    }
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                child.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for interrupts"),
        }
    });
    token
}
