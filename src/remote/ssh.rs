use super::RemoteShell;
use crate::config::Config;
use crate::error::{Result, SwarmError};
use crate::types::CommandOutput;
use async_trait::async_trait;
use log::{debug, warn};
use openssh::{KnownHosts, Session, SessionBuilder, Stdio};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// `RemoteShell` over the system OpenSSH client.
///
/// Host keys are handled trust-on-first-use: an unknown key is recorded in
/// `known_hosts` on first contact and every later connection must present
/// the same key.
pub struct OpenSshShell {
    user: String,
    keyfile: PathBuf,
    known_hosts: PathBuf,
    connect_timeout: Duration,
    output_limit: usize,
}

impl OpenSshShell {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            user: cfg.ssh_user.clone(),
            keyfile: cfg.ssh_key_path.clone(),
            known_hosts: cfg.known_hosts_path.clone(),
            connect_timeout: cfg.ssh_timeout(),
            output_limit: cfg.output_limit,
        }
    }

    async fn connect(&self, host: &str) -> Result<Session> {
        if let Some(parent) = self.known_hosts.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut builder = SessionBuilder::default();
        builder
            .user(self.user.clone())
            .keyfile(&self.keyfile)
            .connect_timeout(self.connect_timeout)
            .known_hosts_check(KnownHosts::Add)
            .user_known_hosts_file(&self.known_hosts);

        debug!("Connecting to {}@{}", self.user, host);
        builder
            .connect_mux(host)
            .await
            .map_err(|e| SwarmError::ssh(host, e))
    }

    async fn close(host: &str, session: Session) {
        if let Err(e) = session.close().await {
            warn!("Failed to close SSH session to {}: {}", host, e);
        }
    }
}

#[async_trait]
impl RemoteShell for OpenSshShell {
    async fn exec(&self, host: &str, command: &str) -> Result<CommandOutput> {
        let session = self.connect(host).await?;
        debug!("[{}] $ {}", host, command);
        let result = session.raw_command(command).output().await;
        Self::close(host, session).await;

        let output = result.map_err(|e| SwarmError::ssh(host, e))?;
        let captured = CommandOutput::capture(
            &output.stdout,
            &output.stderr,
            output.status.code(),
            self.output_limit,
        );
        if captured.truncated {
            warn!(
                "[{}] output of `{}` cut at {} bytes per stream",
                host, command, self.output_limit
            );
        }
        Ok(captured)
    }

    async fn upload(&self, host: &str, contents: &[u8], remote_path: &str) -> Result<()> {
        let transfer = |message: String| SwarmError::Transfer {
            host: host.to_string(),
            path: remote_path.to_string(),
            message,
        };

        let session = self.connect(host).await?;
        let result: Result<()> = async {
            // tee truncates the destination before writing, so existing files are replaced.
            let mut child = session
                .command("tee")
                .arg(remote_path)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn()
                .await
                .map_err(|e| transfer(e.to_string()))?;

            if let Some(mut stdin) = child.stdin().take() {
                stdin
                    .write_all(contents)
                    .await
                    .map_err(|e| transfer(e.to_string()))?;
                stdin.shutdown().await.map_err(|e| transfer(e.to_string()))?;
            }

            let output = child
                .wait_with_output()
                .await
                .map_err(|e| transfer(e.to_string()))?;
            if output.status.success() {
                Ok(())
            } else {
                Err(transfer(
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ))
            }
        }
        .await;
        Self::close(host, session).await;
        result
    }
}
