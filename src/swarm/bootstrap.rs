use super::{redact, write_token};
use crate::config::Config;
use crate::error::{Result, SwarmError};
use crate::inventory::Inventory;
use crate::readiness::wait_for_daemon_ready;
use crate::remote::RemoteShell;
use crate::types::BootstrapReport;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

const SWARM_STATE: &str = "docker info --format '{{.Swarm.LocalNodeState}}'";
const SWARM_INIT: &str = "docker swarm init";
const WORKER_TOKEN: &str = "docker swarm join-token -q worker";

/// Initialise a swarm on the manager node and persist its worker join token.
///
/// A manager that already reports an active swarm is not re-initialised;
/// its current token is fetched and written instead.
pub async fn bootstrap_swarm(
    cfg: &Config,
    inventory: &dyn Inventory,
    shell: &dyn RemoteShell,
    cancel: &CancellationToken,
) -> Result<BootstrapReport> {
    let manager = inventory.manager_address().await?;
    info!("Connecting to manager server at {}...", manager);

    wait_for_daemon_ready(shell, &manager, &cfg.readiness_policy(), cancel).await?;

    let state = shell.exec(&manager, SWARM_STATE).await?;
    let initialized = if state.success() && state.stdout.trim() == "active" {
        warn!("{} is already part of a swarm; skipping init", manager);
        false
    } else {
        let init = shell.exec(&manager, SWARM_INIT).await?;
        if init.success() {
            info!("Swarm initialised on {}: {}", manager, init.stdout.trim());
        } else {
            // The token request below still decides whether the manager is usable.
            warn!("docker swarm init on {} failed: {}", manager, init.diagnostic());
        }
        init.success()
    };

    let output = shell.exec(&manager, WORKER_TOKEN).await?;
    let token = output.stdout.trim();
    if !output.success() || token.is_empty() {
        return Err(SwarmError::TokenUnavailable {
            host: manager,
            message: output.diagnostic().to_string(),
        });
    }

    write_token(&cfg.token_path, token).await?;
    info!(
        "Docker Swarm token {} saved to {}",
        redact(token),
        cfg.token_path.display()
    );

    Ok(BootstrapReport {
        manager,
        initialized,
        token: token.to_string(),
    })
}
