//! Error types shared by every subcommand.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SwarmError>;

#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provisioning tool error: {0}")]
    Provisioner(String),

    #[error("SSH error on {host}: {message}")]
    Ssh { host: String, message: String },

    #[error("Transfer of {path} to {host} failed: {message}")]
    Transfer {
        host: String,
        path: String,
        message: String,
    },

    #[error("Docker daemon on {host} not ready after {attempts} attempts: {last_error}")]
    DaemonNotReady {
        host: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Join token file {0} is missing or empty")]
    TokenMissing(String),

    #[error("Manager {host} did not issue a worker join token: {message}")]
    TokenUnavailable { host: String, message: String },

    #[error("Stack deploy of {stack} failed: {message}")]
    DeployFailed { stack: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SwarmError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provisioner(msg: impl Into<String>) -> Self {
        Self::Provisioner(msg.into())
    }

    pub fn ssh(host: impl Into<String>, message: impl ToString) -> Self {
        Self::Ssh {
            host: host.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = SwarmError::ssh("10.0.0.2", "connection refused");
        assert_eq!(err.to_string(), "SSH error on 10.0.0.2: connection refused");

        let err = SwarmError::DaemonNotReady {
            host: "1.2.3.4".into(),
            attempts: 3,
            last_error: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "Docker daemon on 1.2.3.4 not ready after 3 attempts: timeout"
        );
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SwarmError = io_err.into();
        assert!(matches!(err, SwarmError::Io(_)));
    }
}
