//! Compose stack deployment on the manager node.

use crate::config::Config;
use crate::error::{Result, SwarmError};
use crate::inventory::Inventory;
use crate::remote::{copy_file, RemoteShell};
use crate::types::DeployReport;
use log::{debug, info};

/// Shell line that exports the env file's non-comment lines and deploys the stack.
pub fn deploy_command(remote_env: &str, remote_compose: &str, stack: &str) -> String {
    format!(
        "export $(grep -v '^#' {} | xargs) > /dev/null 2>&1 && docker stack deploy --compose-file {} {}",
        remote_env, remote_compose, stack
    )
}

/// Upload the compose and env files to the manager, then deploy the stack.
pub async fn deploy_stack(
    cfg: &Config,
    inventory: &dyn Inventory,
    shell: &dyn RemoteShell,
) -> Result<DeployReport> {
    let manager = inventory.manager_address().await?;
    info!(
        "Starting to deploy stack {} (manager ip: {})",
        cfg.stack_name, manager
    );

    let uploads = vec![
        copy_file(shell, &manager, &cfg.compose_path, &cfg.remote_compose_path).await?,
        copy_file(shell, &manager, &cfg.env_path, &cfg.remote_env_path).await?,
    ];

    let command = deploy_command(&cfg.remote_env_path, &cfg.remote_compose_path, &cfg.stack_name);
    let output = shell.exec(&manager, &command).await?;
    debug!("docker stack deploy stdout:\n{}", output.stdout);

    if !output.success() {
        return Err(SwarmError::DeployFailed {
            stack: cfg.stack_name.clone(),
            message: output.diagnostic().to_string(),
        });
    }
    for line in output.stdout.lines() {
        info!("{}", line);
    }

    Ok(DeployReport {
        manager,
        stack: cfg.stack_name.clone(),
        uploads,
        output,
    })
}
