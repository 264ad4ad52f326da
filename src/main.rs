//! swarmctl entry point.

use clap::Parser;
use log::{error, info, warn};
use tokio::signal;
use tokio_util::sync::CancellationToken;

mod cli;
mod config;
mod error;
mod inventory;
mod readiness;
mod remote;
mod stack;
mod swarm;
mod types;

use cli::{Cli, Step};
use config::Config;
use inventory::ConfiguredInventory;
use readiness::cancellable;
use remote::OpenSshShell;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Load configuration
    let cfg = Config::load(cli.config.as_deref())?;
    info!("Running {:?} with config: {:?}", cli.command, cfg);

    let inventory = ConfiguredInventory::from_config(&cfg);
    let shell = OpenSshShell::from_config(&cfg);

    // First Ctrl+C cancels the running step, a second one exits immediately
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        loop {
            if let Err(err) = signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", err);
                return;
            }
            if trigger.is_cancelled() {
                error!("Received second Ctrl+C, exiting");
                std::process::exit(130);
            }
            warn!("Received Ctrl+C, cancelling...");
            trigger.cancel();
        }
    });

    for step in cli.command.steps() {
        match step {
            Step::Bootstrap => {
                let report = cancellable(
                    &cancel,
                    swarm::bootstrap_swarm(&cfg, &inventory, &shell, &cancel),
                )
                .await?;
                if report.initialized {
                    println!("Swarm initialized on {}", report.manager);
                } else {
                    println!("{} already manages a swarm", report.manager);
                }
                println!(
                    "Worker join token {} saved to {}",
                    swarm::redact(&report.token),
                    cfg.token_path.display()
                );
            }
            Step::Join => {
                let report =
                    cancellable(&cancel, swarm::join_workers(&cfg, &inventory, &shell)).await?;
                for (worker, outcome) in &report.outcomes {
                    println!("{}: {}", worker, outcome);
                }
                println!("{}", report.summary());
                if !report.none_failed() {
                    anyhow::bail!("{} worker(s) failed to join", report.failed().len());
                }
            }
            Step::Deploy => {
                let report =
                    cancellable(&cancel, stack::deploy_stack(&cfg, &inventory, &shell)).await?;
                for upload in &report.uploads {
                    println!(
                        "Uploaded {} ({} bytes, sha256 {})",
                        upload.remote_path, upload.bytes, upload.sha256
                    );
                }
                println!("Stack {} deployed on {}", report.stack, report.manager);
            }
        }
    }

    Ok(())
}
