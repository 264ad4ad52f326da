use super::Inventory;
use crate::config::Config;
use crate::error::{Result, SwarmError};
use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;
use tokio::process::Command;

/// Reads node addresses from `terraform output` in a state directory.
pub struct TerraformInventory {
    binary: String,
    workdir: PathBuf,
    manager_output: String,
    workers_output: String,
}

impl TerraformInventory {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            binary: cfg.terraform_bin.clone(),
            workdir: cfg.terraform_dir.clone(),
            manager_output: cfg.manager_output.clone(),
            workers_output: cfg.workers_output.clone(),
        }
    }

    async fn output(&self, format_flag: &str, name: &str) -> Result<String> {
        debug!(
            "{} output {} {} (in {})",
            self.binary,
            format_flag,
            name,
            self.workdir.display()
        );
        let output = Command::new(&self.binary)
            .args(["output", format_flag, name])
            .current_dir(&self.workdir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SwarmError::provisioner(format!("failed to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            return Err(SwarmError::provisioner(format!(
                "`{} output {}` exited with {}: {}",
                self.binary,
                name,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Inventory for TerraformInventory {
    async fn manager_address(&self) -> Result<String> {
        let raw = self.output("-raw", &self.manager_output).await?;
        let address = parse_manager_address(&raw, &self.manager_output)?;
        info!("Manager address from terraform: {}", address);
        Ok(address)
    }

    async fn worker_addresses(&self) -> Result<Vec<String>> {
        let raw = self.output("-json", &self.workers_output).await?;
        let workers = parse_worker_addresses(&raw)?;
        info!("Terraform reports {} worker(s)", workers.len());
        Ok(workers)
    }
}

fn parse_manager_address(raw: &str, name: &str) -> Result<String> {
    let address = raw.trim();
    if address.is_empty() {
        return Err(SwarmError::provisioner(format!("output `{}` is empty", name)));
    }
    Ok(address.to_string())
}

fn parse_worker_addresses(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw.trim())?)
}
