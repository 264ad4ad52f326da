//! Swarm bootstrap and worker join.
//!
//! The join token is the only durable state this tool creates: the
//! bootstrap step writes it, the join step reads it back.

use crate::error::{Result, SwarmError};
use std::path::Path;
use tokio::io::AsyncWriteExt;

pub mod bootstrap;
pub mod join;

pub use bootstrap::bootstrap_swarm;
pub use join::join_workers;

/// Persist `token` verbatim, replacing any previous contents. On unix the
/// file is readable by its owner only.
pub async fn write_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;

    // mode() only applies on creation; tighten a pre-existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    file.write_all(token.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

pub async fn read_token(path: &Path) -> Result<String> {
    let missing = || SwarmError::TokenMissing(path.display().to_string());
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(e.into()),
    };
    let token = raw.trim();
    if token.is_empty() {
        return Err(missing());
    }
    Ok(token.to_string())
}

/// Short, log-safe form of a join token.
pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(12).collect();
    if prefix.len() < token.len() {
        format!("{}…", prefix)
    } else {
        prefix
    }
}
