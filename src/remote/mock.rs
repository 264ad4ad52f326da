//! Scripted in-memory shell for tests.

use super::RemoteShell;
use crate::error::{Result, SwarmError};
use crate::types::CommandOutput;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&str, &str) -> Result<CommandOutput> + Send + Sync>;

pub struct MockShell {
    responder: Responder,
    commands: Mutex<Vec<(String, String)>>,
    files: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MockShell {
    /// Every command succeeds with empty output.
    pub fn new() -> Self {
        Self::with(|_, _| Ok(ok("")))
    }

    pub fn with<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            commands: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.commands.lock().unwrap().clone()
    }

    pub fn file(&self, host: &str, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&(host.to_string(), path.to_string()))
            .cloned()
    }
}

#[async_trait]
impl RemoteShell for MockShell {
    async fn exec(&self, host: &str, command: &str) -> Result<CommandOutput> {
        self.commands
            .lock()
            .unwrap()
            .push((host.to_string(), command.to_string()));
        (self.responder)(host, command)
    }

    async fn upload(&self, host: &str, contents: &[u8], remote_path: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert((host.to_string(), remote_path.to_string()), contents.to_vec());
        Ok(())
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        truncated: false,
    }
}

pub fn failed(stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(1),
        truncated: false,
    }
}

pub fn refused(host: &str) -> SwarmError {
    SwarmError::ssh(host, "connection refused")
}
