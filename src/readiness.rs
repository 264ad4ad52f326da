//! Polling a freshly provisioned host until its Docker daemon answers.

use crate::error::{Result, SwarmError};
use crate::remote::RemoteShell;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DOCKER_INFO: &str = "docker info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl ReadinessPolicy {
    /// Pause after the given (1-based) failed attempt: doubles from
    /// `initial_delay` and never exceeds `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `docker info` on `host` until it exits successfully.
///
/// Connection failures and failing checks are retried with backoff. Returns
/// the attempt number that succeeded.
pub async fn wait_for_daemon_ready(
    shell: &dyn RemoteShell,
    host: &str,
    policy: &ReadinessPolicy,
    cancel: &CancellationToken,
) -> Result<u32> {
    let mut last_error = String::from("no check completed");

    for attempt in 1..=policy.max_attempts {
        let checked = tokio::select! {
            _ = cancel.cancelled() => return Err(SwarmError::Cancelled),
            checked = shell.exec(host, DOCKER_INFO) => checked,
        };

        match checked {
            Ok(output) if output.success() => {
                if !output.stderr.trim().is_empty() {
                    debug!("docker info on {} reported: {}", host, output.stderr.trim());
                }
                info!("Docker on {} is ready (attempt {})", host, attempt);
                return Ok(attempt);
            }
            Ok(output) => last_error = output.diagnostic().to_string(),
            Err(e) => last_error = e.to_string(),
        }
        warn!(
            "Waiting for Docker on {} (attempt {}/{}): {}",
            host, attempt, policy.max_attempts, last_error
        );

        if attempt < policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(SwarmError::Cancelled),
                _ = tokio::time::sleep(policy.delay_after(attempt)) => {}
            }
        }
    }

    Err(SwarmError::DaemonNotReady {
        host: host.to_string(),
        attempts: policy.max_attempts,
        last_error,
    })
}

/// Drive `step` to completion unless `cancel` fires first, in which case the
/// step is dropped mid-flight.
pub async fn cancellable<T, F>(cancel: &CancellationToken, step: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(SwarmError::Cancelled),
        result = step => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::{failed, ok, refused, MockShell};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> ReadinessPolicy {
        ReadinessPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn backoff_doubles_up_to_the_ceiling() {
        let policy = ReadinessPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(5), Duration::from_secs(16));
        assert_eq!(policy.delay_after(6), Duration::from_secs(30));
        assert_eq!(policy.delay_after(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn healthy_host_is_ready_on_first_attempt() {
        let shell = MockShell::with(|_, _| Ok(ok("Server Version: 24.0.7\n")));
        let attempt = wait_for_daemon_ready(&shell, "1.2.3.4", &fast(5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(attempt, 1);
        assert_eq!(
            shell.commands(),
            vec![("1.2.3.4".to_string(), "docker info".to_string())]
        );
    }

    #[tokio::test]
    async fn unreachable_host_stops_at_the_attempt_cap() {
        let shell = MockShell::with(|host, _| Err(refused(host)));
        let err = wait_for_daemon_ready(&shell, "1.2.3.4", &fast(4), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            SwarmError::DaemonNotReady {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(shell.commands().len(), 4);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let shell = MockShell::with(move |host, _| match counter.fetch_add(1, Ordering::SeqCst) {
            0 => Err(refused(host)),
            1 => Ok(failed("Cannot connect to the Docker daemon at unix:///var/run/docker.sock")),
            _ => Ok(ok("")),
        });
        let attempt = wait_for_daemon_ready(&shell, "1.2.3.4", &fast(10), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(attempt, 3);
    }

    #[tokio::test]
    async fn cancellable_passes_results_through() {
        let cancel = CancellationToken::new();
        let value = cancellable(&cancel, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_token_drops_a_pending_step() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = cancellable(&cancel, std::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, SwarmError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let shell = MockShell::with(|host, _| Err(refused(host)));
        let policy = ReadinessPolicy {
            max_attempts: u32::MAX,
            initial_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = wait_for_daemon_ready(&shell, "1.2.3.4", &policy, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SwarmError::Cancelled));
    }
}
