use crate::error::{Result, SwarmError};
use crate::types::{CommandOutput, UploadReceipt};
use async_trait::async_trait;
use log::info;
use sha2::{Digest, Sha256};
use std::path::Path;

pub mod ssh;
pub use ssh::OpenSshShell;

#[cfg(test)]
pub mod mock;

/// One-shot access to a remote host. Every call stands alone: implementations
/// open a connection, perform the action and close it again.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` through the remote user's shell and capture both streams.
    async fn exec(&self, host: &str, command: &str) -> Result<CommandOutput>;

    /// Write `contents` to `remote_path`, replacing any existing file.
    async fn upload(&self, host: &str, contents: &[u8], remote_path: &str) -> Result<()>;
}

/// Copy a local file byte-for-byte to `remote_path` on `host`.
pub async fn copy_file(
    shell: &dyn RemoteShell,
    host: &str,
    local_path: &Path,
    remote_path: &str,
) -> Result<UploadReceipt> {
    let contents = tokio::fs::read(local_path).await.map_err(|e| SwarmError::Transfer {
        host: host.to_string(),
        path: local_path.display().to_string(),
        message: e.to_string(),
    })?;

    shell.upload(host, &contents, remote_path).await?;

    let receipt = UploadReceipt {
        remote_path: remote_path.to_string(),
        bytes: contents.len(),
        sha256: hex::encode(Sha256::digest(&contents)),
    };
    info!(
        "Copied {} -> {}:{} ({} bytes, sha256 {})",
        local_path.display(),
        host,
        remote_path,
        receipt.bytes,
        receipt.sha256
    );
    Ok(receipt)
}
