//! Wallet-link progress and the single-flight guard.
//!
//! ```text
//! Idle ─► RequestingNonce ─► AwaitingSignature ─► Verifying ─► Linked
//!              │                     │                 │
//!              └─────────────────────┴─────────────────┴─────► Failed
//! ```
//!
//! At most one attempt runs per [`Portal`](crate::Portal). The attempt
//! holds a [`LinkAttempt`]; dropping it (including by dropping the future
//! that owns it) releases the slot.

use std::sync::atomic::{AtomicBool, Ordering};

use eid_models::{ChainId, SuiNetwork};
use tokio::sync::watch;
use tracing::debug;

/// Where the current link attempt stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkPhase {
    /// No attempt running.
    #[default]
    Idle,
    /// Waiting for the server to issue a nonce.
    RequestingNonce,
    /// Waiting for the wallet to sign the nonce.
    AwaitingSignature,
    /// Waiting for the server to verify the signature.
    Verifying,
    /// The wallet was linked.
    Linked,
    /// The attempt ended with an error.
    Failed(LinkError),
}

impl LinkPhase {
    /// `true` while an attempt is between its first request and its outcome.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::RequestingNonce | Self::AwaitingSignature | Self::Verifying
        )
    }
}

/// Why a link attempt did not start or did not finish.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// The API has not been reachable yet.
    #[error("API not reachable yet")]
    NotReady,

    /// No credential is stored.
    #[error("sign in before linking a wallet")]
    NotAuthenticated,

    /// The wallet has no selected account.
    #[error("no wallet account selected")]
    NoAccount,

    /// The wallet is connected to a different chain than the portal uses.
    #[error("Please switch your wallet to {}. Currently on {}.", .target.as_str(), .current.network())]
    WrongNetwork {
        /// Network the portal is configured for.
        target: SuiNetwork,
        /// Chain the wallet reported.
        current: ChainId,
    },

    /// Another attempt is already running.
    #[error("a wallet link is already in progress")]
    AlreadyInFlight,

    /// The server did not issue a nonce. `detail` is what the transport
    /// or the server said, for logs.
    #[error("Failed to get nonce")]
    NonceUnavailable {
        /// Underlying failure.
        detail: String,
    },

    /// The wallet or its user refused to sign.
    #[error("{0}")]
    UserDeclined(String),

    /// The server refused the signature.
    #[error("{0}")]
    Rejected(String),
}

/// Publishes [`LinkPhase`] and enforces a single attempt at a time.
#[derive(Debug)]
pub struct LinkTracker {
    in_flight: AtomicBool,
    phase: watch::Sender<LinkPhase>,
}

impl Default for LinkTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkTracker {
    /// A tracker in [`LinkPhase::Idle`].
    pub fn new() -> Self {
        let (phase, _) = watch::channel(LinkPhase::Idle);
        Self {
            in_flight: AtomicBool::new(false),
            phase,
        }
    }

    /// Claim the attempt slot. `None` if another attempt holds it.
    pub fn try_begin(&self) -> Option<LinkAttempt<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(LinkAttempt {
            tracker: self,
            finished: false,
        })
    }

    /// `true` while an attempt holds the slot.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The latest phase.
    pub fn phase(&self) -> LinkPhase {
        self.phase.borrow().clone()
    }

    /// Receive every phase change.
    pub fn subscribe(&self) -> watch::Receiver<LinkPhase> {
        self.phase.subscribe()
    }
}

/// Exclusive handle on the running attempt.
///
/// Finishing records `Linked` or `Failed`. Dropping an unfinished attempt
/// puts the tracker back to `Idle`.
#[derive(Debug)]
pub struct LinkAttempt<'a> {
    tracker: &'a LinkTracker,
    finished: bool,
}

impl LinkAttempt<'_> {
    /// Move to an intermediate phase.
    pub fn advance(&self, phase: LinkPhase) {
        debug!(?phase, "link phase");
        self.tracker.phase.send_replace(phase);
    }

    /// Record the outcome and release the slot.
    pub fn finish(mut self, outcome: Result<(), LinkError>) -> Result<(), LinkError> {
        let phase = match &outcome {
            Ok(()) => LinkPhase::Linked,
            Err(e) => LinkPhase::Failed(e.clone()),
        };
        self.advance(phase);
        self.finished = true;
        outcome
    }
}

impl Drop for LinkAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("link attempt abandoned");
            self.tracker.phase.send_replace(LinkPhase::Idle);
        }
        self.tracker.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_attempt_is_refused() {
        let tracker = LinkTracker::new();
        let first = tracker.try_begin();
        assert!(first.is_some());
        assert!(tracker.try_begin().is_none());
        drop(first);
        assert!(tracker.try_begin().is_some());
    }

    #[test]
    fn finish_publishes_outcome() {
        let tracker = LinkTracker::new();
        let attempt = tracker.try_begin().unwrap();
        attempt.advance(LinkPhase::Verifying);
        assert_eq!(tracker.phase(), LinkPhase::Verifying);

        let result = attempt.finish(Err(LinkError::Rejected("Signature verification failed".into())));
        assert!(result.is_err());
        assert_eq!(
            tracker.phase(),
            LinkPhase::Failed(LinkError::Rejected("Signature verification failed".into()))
        );
        assert!(!tracker.is_in_flight());
    }

    #[test]
    fn abandoned_attempt_resets_to_idle() {
        let tracker = LinkTracker::new();
        let attempt = tracker.try_begin().unwrap();
        attempt.advance(LinkPhase::AwaitingSignature);
        drop(attempt);
        assert_eq!(tracker.phase(), LinkPhase::Idle);
        assert!(!tracker.is_in_flight());
    }

    #[test]
    fn subscribers_see_changes() {
        let tracker = LinkTracker::new();
        let mut rx = tracker.subscribe();
        let attempt = tracker.try_begin().unwrap();
        attempt.advance(LinkPhase::RequestingNonce);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), LinkPhase::RequestingNonce);
        assert!(LinkPhase::RequestingNonce.is_in_progress());
        assert!(!LinkPhase::Linked.is_in_progress());
    }

    #[test]
    fn wrong_network_message() {
        let err = LinkError::WrongNetwork {
            target: SuiNetwork::Testnet,
            current: ChainId::new("sui", "mainnet"),
        };
        assert_eq!(
            err.to_string(),
            "Please switch your wallet to testnet. Currently on mainnet."
        );
    }

    #[test]
    fn nonce_failure_has_a_fixed_reason() {
        let err = LinkError::NonceUnavailable {
            detail: "db pool exhausted".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to get nonce");
    }
}
