//! ftb-debug - diagnostic collection tool for the FTB App
//!
//! One-shot CLI: locates the App's data on disk, uploads sanitized logs and
//! settings, probes the endpoints the App depends on, and prints a support
//! code referencing the assembled manifest. Runs to completion without input;
//! the only interaction is the final "press Enter" pause so the code stays
//! visible when the tool is launched by double-click.

use anyhow::{Context, Result};
use clap::Parser;
use ftb_debug::logging;
use tokio_util::sync::CancellationToken;
use ftb_debug::platform::HostEnv;
use ftb_debug::services::{run_diagnostics, NetworkProbe, RunOptions, Uploader};
use ftb_debug::{APP_NAME, VERSION};

#[derive(Parser, Debug)]
#[command(name = "ftb-debug", version, about = "Collects FTB App diagnostics and uploads a sanitized report")]
struct Cli {
    /// Enable debug-level output
    #[arg(short, long)]
    verbose: bool,

    /// Target the beta/preview App instead of the release App
    #[arg(long)]
    beta: bool,

    /// No console output and no final pause (for scripted use)
    #[arg(long)]
    silent: bool,

    /// Disable ANSI colors in console output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let capture = logging::setup_logging(cli.verbose, !cli.silent, !cli.no_color);

    tracing::info!("starting {} v{}", APP_NAME, VERSION);

    // First Ctrl-C cancels the run but lets it finish with a partial
    // manifest; a second one exits immediately.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing with partial data");
            signal_cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    let outcome = run(&cli, &capture, &cancel).await;

    let code = match outcome {
        Ok(code) => {
            println!("Please provide this code to support: {code}");
            0
        }
        Err(e) => {
            tracing::error!("diagnostic run failed: {e:#}");
            1
        }
    };

    if !cli.silent {
        wait_for_enter();
    }
    std::process::exit(code);
}

async fn run(
    cli: &Cli,
    capture: &logging::LogCapture,
    cancel: &CancellationToken,
) -> Result<String> {
    let env = HostEnv::detect().context("failed to detect host environment")?;
    let uploader = Uploader::new().context("failed to build upload client")?;
    let probe = NetworkProbe::new().context("failed to build probe client")?;
    let opts = RunOptions { beta: cli.beta };
    run_diagnostics(&env, &opts, &uploader, &probe, capture, cancel).await
}

/// Block on one line of stdin so the window stays open when the tool was
/// launched outside a terminal.
fn wait_for_enter() {
    println!("Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
