use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SwarmError};
use crate::readiness::ReadinessPolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub ssh_user: String,
    pub ssh_key_path: PathBuf,
    /// Trust-on-first-use store; keys are recorded on first contact and pinned afterwards.
    pub known_hosts_path: PathBuf,
    pub ssh_timeout_secs: u64,
    pub terraform_bin: String,
    pub terraform_dir: PathBuf,
    pub manager_output: String,
    pub workers_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_addresses: Option<Vec<String>>,
    pub token_path: PathBuf,
    pub swarm_port: u16,
    pub compose_path: PathBuf,
    pub env_path: PathBuf,
    pub remote_compose_path: String,
    pub remote_env_path: String,
    pub stack_name: String,
    /// Bytes kept per captured output stream.
    pub output_limit: usize,
    pub readiness: ReadinessConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadinessConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssh_user: "docker".into(),
            ssh_key_path: "ssh/id_rsa".into(),
            known_hosts_path: "ssh/known_hosts".into(),
            ssh_timeout_secs: 200,
            terraform_bin: "terraform".into(),
            terraform_dir: ".".into(),
            manager_output: "manager_first_node_public_ip".into(),
            workers_output: "worker_ips".into(),
            manager_address: None,
            worker_addresses: None,
            token_path: "./swarm-worker-token".into(),
            swarm_port: 2377,
            compose_path: "../../docker-compose.yml".into(),
            env_path: "../../.env.prod".into(),
            remote_compose_path: "/home/docker/docker-compose.yml".into(),
            remote_env_path: "/home/docker/.env".into(),
            stack_name: "cjs".into(),
            output_limit: 64 * 1024,
            readiness: ReadinessConfig::default(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl Config {
    /// Defaults, then `swarmctl.toml`, `swarmctl.json`, the optional extra
    /// file and finally `SWARMCTL_*` environment variables.
    pub fn load(extra: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("swarmctl.toml"))
            .merge(Json::file("swarmctl.json"));
        if let Some(path) = extra {
            if !path.exists() {
                return Err(SwarmError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed("SWARMCTL_").split("__")))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| SwarmError::config(format!("failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ssh_user.trim().is_empty() {
            return Err(SwarmError::config("ssh_user must not be empty"));
        }
        if self.stack_name.trim().is_empty() {
            return Err(SwarmError::config("stack_name must not be empty"));
        }
        if self.ssh_timeout_secs == 0 {
            return Err(SwarmError::config("ssh_timeout_secs must be positive"));
        }
        if self.output_limit == 0 {
            return Err(SwarmError::config("output_limit must be positive"));
        }
        if self.readiness.max_attempts == 0 {
            return Err(SwarmError::config("readiness.max_attempts must be positive"));
        }
        if self.readiness.initial_delay_ms > self.readiness.max_delay_ms {
            return Err(SwarmError::config(
                "readiness.initial_delay_ms exceeds readiness.max_delay_ms",
            ));
        }
        Ok(())
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_timeout_secs)
    }

    pub fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            max_attempts: self.readiness.max_attempts,
            initial_delay: Duration::from_millis(self.readiness.initial_delay_ms),
            max_delay: Duration::from_millis(self.readiness.max_delay_ms),
        }
    }
}
