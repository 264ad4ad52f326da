use super::{read_token, redact};
use crate::config::Config;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::remote::RemoteShell;
use crate::types::{JoinOutcome, JoinReport};
use log::{info, warn};

const ALREADY_MEMBER: &str = "already part of a swarm";

pub fn join_command(token: &str, manager: &str, port: u16) -> String {
    format!("docker swarm join --token {} {}:{}", token, manager, port)
}

/// Join every worker to the manager's swarm, one at a time.
///
/// A failing worker never stops the loop; its outcome is recorded in the
/// returned report.
pub async fn join_workers(
    cfg: &Config,
    inventory: &dyn Inventory,
    shell: &dyn RemoteShell,
) -> Result<JoinReport> {
    let manager = inventory.manager_address().await?;
    let workers = inventory.worker_addresses().await?;
    let token = read_token(&cfg.token_path).await?;
    info!(
        "Joining {} worker(s) to {}:{} with token {}",
        workers.len(),
        manager,
        cfg.swarm_port,
        redact(&token)
    );

    let command = join_command(&token, &manager, cfg.swarm_port);
    let mut report = JoinReport {
        manager,
        outcomes: Vec::with_capacity(workers.len()),
    };

    for worker in workers {
        let outcome = match shell.exec(&worker, &command).await {
            Ok(output) if output.success() => {
                info!("{}: {}", worker, output.stdout.trim());
                JoinOutcome::Joined
            }
            Ok(output) if output.stderr.contains(ALREADY_MEMBER) => {
                info!("{} is already part of a swarm", worker);
                JoinOutcome::AlreadyMember
            }
            Ok(output) => {
                warn!("{} failed to join: {}", worker, output.diagnostic());
                JoinOutcome::Failed {
                    reason: output.diagnostic().to_string(),
                }
            }
            Err(e) => {
                warn!("{} failed to join: {}", worker, e);
                JoinOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.outcomes.push((worker, outcome));
    }

    info!("{}", report.summary());
    Ok(report)
}
