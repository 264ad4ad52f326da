//! Data structures passed between the remote shell and the swarm steps.
//!
//! Remote commands are observed through [`CommandOutput`], which keeps both
//! streams in full up to a byte cap.  Reports returned by the bootstrap,
//! join and deploy steps are plain values so the CLI can print them and
//! tests can assert on them.

use std::fmt;

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the remote process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Set when either stream was cut at the configured byte cap.
    pub truncated: bool,
}

impl CommandOutput {
    /// Builds an output from raw stream bytes, keeping at most `limit` bytes
    /// of each stream.
    pub fn capture(stdout: &[u8], stderr: &[u8], exit_code: Option<i32>, limit: usize) -> Self {
        let (stdout, out_cut) = cap_utf8(stdout, limit);
        let (stderr, err_cut) = cap_utf8(stderr, limit);
        Self {
            stdout,
            stderr,
            exit_code,
            truncated: out_cut || err_cut,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr if present, otherwise stdout; used for error messages.
    pub fn diagnostic(&self) -> &str {
        let err = self.stderr.trim();
        if err.is_empty() {
            self.stdout.trim()
        } else {
            err
        }
    }
}

fn cap_utf8(bytes: &[u8], limit: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= limit {
        return (text.into_owned(), false);
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (text[..end].to_string(), true)
}

/// Result of copying one local artifact to a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub remote_path: String,
    pub bytes: usize,
    /// Hex SHA-256 of the uploaded bytes.
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub manager: String,
    /// False when the manager already belonged to a swarm and init was skipped.
    pub initialized: bool,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    Failed { reason: String },
}

impl JoinOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, JoinOutcome::Failed { .. })
    }
}

impl fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinOutcome::Joined => write!(f, "joined"),
            JoinOutcome::AlreadyMember => write!(f, "already a member"),
            JoinOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-worker outcomes of a join run, in the order workers were visited.
#[derive(Debug, Clone, Default)]
pub struct JoinReport {
    pub manager: String,
    pub outcomes: Vec<(String, JoinOutcome)>,
}

impl JoinReport {
    /// Workers that joined this manager during the run.
    pub fn joined(&self) -> usize {
        self.count(|o| *o == JoinOutcome::Joined)
    }

    /// Workers that refused because they already belong to some swarm,
    /// which may not be this manager's.
    pub fn already_members(&self) -> usize {
        self.count(|o| *o == JoinOutcome::AlreadyMember)
    }

    fn count(&self, pred: impl Fn(&JoinOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failure())
            .map(|(w, _)| w.as_str())
            .collect()
    }

    pub fn none_failed(&self) -> bool {
        self.failed().is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} of {} workers joined the swarm at {}",
            self.joined(),
            self.outcomes.len(),
            self.manager
        );
        let already = self.already_members();
        if already > 0 {
            summary.push_str(&format!("; {} already in a swarm", already));
        }
        let failed = self.failed();
        if !failed.is_empty() {
            summary.push_str(&format!("; failed: {}", failed.join(", ")));
        }
        summary
    }
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub manager: String,
    pub stack: String,
    pub uploads: Vec<UploadReceipt>,
    pub output: CommandOutput,
}
