//! Boot-time reachability guard.
//!
//! Nothing authenticated runs until the API has answered one liveness
//! probe. The guard probes in an explicit loop, sleeping a fixed backoff
//! between failures, for as long as the caller keeps awaiting it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::SdkError;

/// One unauthenticated liveness check against the API.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// `Ok` if the API answered with success within the probe timeout.
    async fn probe(&self) -> Result<(), SdkError>;
}

/// What the guard currently knows about the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    /// No probe has completed yet.
    Checking,
    /// A probe succeeded.
    Ready,
    /// The latest probe failed.
    Unreachable {
        /// Number of consecutive failures so far.
        attempt: u32,
        /// Why the latest probe failed.
        reason: String,
    },
}

impl Reachability {
    /// Line shown to the user while waiting.
    pub fn status_text(&self) -> String {
        match self {
            Self::Checking => "Checking API status...".to_string(),
            Self::Ready => "Connected.".to_string(),
            Self::Unreachable { attempt, .. } => {
                format!("Connection failed. Retrying... ({attempt})")
            }
        }
    }

    /// `true` for [`Reachability::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Probes until the API answers, publishing progress on a watch channel.
pub struct ReachabilityGuard {
    probe: Arc<dyn LivenessProbe>,
    backoff: Duration,
    status: watch::Sender<Reachability>,
}

impl ReachabilityGuard {
    /// Guard around `probe` that waits `backoff` between failures.
    pub fn new(probe: Arc<dyn LivenessProbe>, backoff: Duration) -> Self {
        let (status, _) = watch::channel(Reachability::Checking);
        Self {
            probe,
            backoff,
            status,
        }
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<Reachability> {
        self.status.subscribe()
    }

    /// Latest status.
    pub fn status(&self) -> Reachability {
        self.status.borrow().clone()
    }

    /// `true` once a probe has succeeded.
    pub fn is_ready(&self) -> bool {
        self.status.borrow().is_ready()
    }

    /// Probe until one succeeds. Returns the number of failed probes.
    ///
    /// Returns immediately once the guard is ready. Dropping the future
    /// stops the loop.
    pub async fn wait_until_ready(&self) -> u32 {
        if self.is_ready() {
            return 0;
        }

        let mut failures = 0u32;
        loop {
            match self.probe.probe().await {
                Ok(()) => {
                    info!(failures, "API reachable");
                    self.status.send_replace(Reachability::Ready);
                    return failures;
                }
                Err(e) => {
                    failures += 1;
                    warn!(attempt = failures, error = %e, "API unreachable, retrying");
                    self.status.send_replace(Reachability::Unreachable {
                        attempt: failures,
                        reason: e.to_string(),
                    });
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for ReachabilityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityGuard")
            .field("backoff", &self.backoff)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails the first `failures` probes, then succeeds.
    struct FlakyProbe {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LivenessProbe for FlakyProbe {
        async fn probe(&self) -> Result<(), SdkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SdkError::Unreachable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    fn guard(failures: u32) -> (ReachabilityGuard, Arc<FlakyProbe>) {
        let probe = Arc::new(FlakyProbe {
            failures,
            calls: AtomicU32::new(0),
        });
        let guard = ReachabilityGuard::new(probe.clone(), Duration::from_millis(5));
        (guard, probe)
    }

    #[tokio::test]
    async fn retries_until_probe_succeeds() {
        let (guard, probe) = guard(3);
        let mut rx = guard.subscribe();
        assert_eq!(guard.status(), Reachability::Checking);

        let failures = guard.wait_until_ready().await;

        assert_eq!(failures, 3);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);
        assert!(guard.is_ready());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Reachability::Ready);
    }

    #[tokio::test]
    async fn ready_guard_does_not_probe_again() {
        let (guard, probe) = guard(0);
        assert_eq!(guard.wait_until_ready().await, 0);
        assert_eq!(guard.wait_until_ready().await, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropped_wait_leaves_last_failure_visible() {
        let (guard, _probe) = guard(u32::MAX);
        let _ = tokio::time::timeout(Duration::from_millis(30), guard.wait_until_ready()).await;
        match guard.status() {
            Reachability::Unreachable { attempt, .. } => assert!(attempt >= 1),
            other => panic!("expected Unreachable, got {other:?}"),
        }
        assert!(!guard.is_ready());
    }

    #[test]
    fn status_text() {
        assert_eq!(Reachability::Checking.status_text(), "Checking API status...");
        assert_eq!(
            Reachability::Unreachable {
                attempt: 2,
                reason: "timeout".into()
            }
            .status_text(),
            "Connection failed. Retrying... (2)"
        );
    }
}
