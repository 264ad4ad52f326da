use crate::config::Config;
use crate::error::{Result, SwarmError};
use async_trait::async_trait;

pub mod terraform;
pub use terraform::TerraformInventory;

/// Source of node addresses. The provisioning tool owns these values; they
/// are read, never generated or validated here.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Public address of the first manager node.
    async fn manager_address(&self) -> Result<String>;

    /// Public addresses of every worker node.
    async fn worker_addresses(&self) -> Result<Vec<String>>;
}

/// Fixed addresses, used when the configuration pins them.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    pub manager: Option<String>,
    pub workers: Option<Vec<String>>,
}

impl StaticInventory {
    pub fn new(manager: impl Into<String>, workers: Vec<String>) -> Self {
        Self {
            manager: Some(manager.into()),
            workers: Some(workers),
        }
    }
}

#[async_trait]
impl Inventory for StaticInventory {
    async fn manager_address(&self) -> Result<String> {
        self.manager
            .clone()
            .ok_or_else(|| SwarmError::config("no static manager address configured"))
    }

    async fn worker_addresses(&self) -> Result<Vec<String>> {
        self.workers
            .clone()
            .ok_or_else(|| SwarmError::config("no static worker addresses configured"))
    }
}

/// Static overrides first, Terraform for whatever is not pinned.
pub struct ConfiguredInventory {
    pinned: StaticInventory,
    terraform: TerraformInventory,
}

impl ConfiguredInventory {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            pinned: StaticInventory {
                manager: cfg.manager_address.clone(),
                workers: cfg.worker_addresses.clone(),
            },
            terraform: TerraformInventory::from_config(cfg),
        }
    }
}

#[async_trait]
impl Inventory for ConfiguredInventory {
    async fn manager_address(&self) -> Result<String> {
        match self.pinned.manager {
            Some(_) => self.pinned.manager_address().await,
            None => self.terraform.manager_address().await,
        }
    }

    async fn worker_addresses(&self) -> Result<Vec<String>> {
        match self.pinned.workers {
            Some(_) => self.pinned.worker_addresses().await,
            None => self.terraform.worker_addresses().await,
        }
    }
}
