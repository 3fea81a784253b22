//! Session orchestrator.
//!
//! [`Portal`] ties the pieces together: it owns the [`SessionStore`], the
//! loaded [`Identity`], the [`ReachabilityGuard`] and the link tracker,
//! and exposes the operations a front end calls.
//!
//! # Lifecycle
//!
//! ```text
//! boot ─► guard ready ─► stored credential? ─► refresh_identity
//!                                                  │
//!                 ┌────────── 4xx ─────────────────┤
//!                 ▼                                ▼
//!          session torn down              identity + tribe set
//! ```
//!
//! Internal state sits behind a `std::sync::Mutex` that is only held for
//! short synchronous sections, never across an `.await`. Every credential
//! change bumps a generation counter; an identity fetch that started under
//! an older generation is dropped instead of applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eid_models::{
    explorer_url, ExplorerKind, Identity, MemberNote, MemberQuery, NetworkMatch, RosterMember,
    RosterQuery, TribeName, VoiceAccountCredentials, VoiceAccountStatus, WalletAddress, WalletId,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::callback::{CallbackOutcome, CallbackParams};
use crate::client::PortalClient;
use crate::config::PortalConfig;
use crate::credentials::Credential;
use crate::error::SdkError;
use crate::link::{LinkAttempt, LinkError, LinkPhase, LinkTracker};
use crate::reachability::{Reachability, ReachabilityGuard};
use crate::session::SessionStore;
use crate::storage::KeyValueStorage;
use crate::tribe::select_current_tribe;
use crate::wallet::WalletCapability;

/// What an identity refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fresh identity was stored.
    Loaded,
    /// The credential changed while the fetch was running; the result was
    /// discarded.
    Superseded,
    /// The server rejected the credential; the session was cleared.
    SessionEnded,
    /// No credential is stored, nothing was fetched.
    NoCredential,
}

struct PortalState {
    session: SessionStore,
    identity: Option<Identity>,
    generation: u64,
}

/// Client-side session for one user of the portal.
pub struct Portal {
    config: PortalConfig,
    client: PortalClient,
    guard: ReachabilityGuard,
    state: Mutex<PortalState>,
    link: LinkTracker,
}

impl Portal {
    /// Build a portal session, restoring whatever `storage` holds.
    ///
    /// No network traffic happens until [`boot`](Self::boot).
    pub fn new(config: PortalConfig, storage: Arc<dyn KeyValueStorage>) -> Result<Self, SdkError> {
        let client = PortalClient::new(&config)?;
        let guard = ReachabilityGuard::new(Arc::new(client.clone()), config.retry_backoff);
        let session = SessionStore::restore(storage);

        Ok(Self {
            config,
            client,
            guard,
            state: Mutex::new(PortalState {
                session,
                identity: None,
                generation: 0,
            }),
            link: LinkTracker::new(),
        })
    }

    fn state(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_ready(&self) -> Result<(), SdkError> {
        if self.guard.is_ready() {
            Ok(())
        } else {
            Err(SdkError::NotReady)
        }
    }

    fn require_credential(&self) -> Result<Credential, SdkError> {
        self.ensure_ready()?;
        self.credential().ok_or(SdkError::NotAuthenticated)
    }

    // ------------------------------------------------------------------
    // Boot
    // ------------------------------------------------------------------

    /// Wait for the API to become reachable, then load the identity of
    /// the stored credential (if any).
    pub async fn boot(&self) -> Result<RefreshOutcome, SdkError> {
        let failures = self.guard.wait_until_ready().await;
        debug!(failures, "reachability guard passed");
        self.refresh_identity().await
    }

    /// Current reachability.
    pub fn reachability(&self) -> Reachability {
        self.guard.status()
    }

    /// Receive reachability changes.
    pub fn subscribe_reachability(&self) -> watch::Receiver<Reachability> {
        self.guard.subscribe()
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Configuration this session was built with.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Where to send the user agent to log in.
    pub fn login_url(&self) -> String {
        self.client.login_url()
    }

    /// The stored credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.state().session.credential().cloned()
    }

    /// `true` if a credential is stored (not necessarily a valid one).
    pub fn is_authenticated(&self) -> bool {
        self.state().session.credential().is_some()
    }

    /// The loaded identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.state().identity.clone()
    }

    /// The current tribe context, if any.
    pub fn current_tribe(&self) -> Option<TribeName> {
        self.state().session.current_tribe().cloned()
    }

    /// Replace the credential.
    ///
    /// The new value is persisted before anything else happens. `Some`
    /// then loads the matching identity; `None` forgets the identity but
    /// keeps the tribe context.
    pub async fn set_credential(&self, credential: Option<Credential>) -> Result<RefreshOutcome, SdkError> {
        let has_credential = {
            let mut state = self.state();
            state.generation += 1;
            let has_credential = credential.is_some();
            state.session.set_credential(credential);
            if !has_credential {
                state.identity = None;
            }
            has_credential
        };

        if has_credential {
            self.refresh_identity().await
        } else {
            Ok(RefreshOutcome::NoCredential)
        }
    }

    /// Forget the credential, tribe context and identity.
    pub fn logout(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.session.clear();
        state.identity = None;
        info!("logged out");
    }

    /// Select the tribe admin views are scoped to.
    ///
    /// Not validated here; the next identity refresh clears it if the
    /// identity does not carry it.
    pub fn set_current_tribe(&self, tribe: Option<TribeName>) {
        self.state().session.set_current_tribe(tribe);
    }

    /// Finish an OAuth redirect.
    ///
    /// A `code` is exchanged for a credential and wins over a `token`. A
    /// credential the server then rejects counts as
    /// [`CallbackOutcome::LoginRequired`].
    pub async fn handle_callback(&self, params: CallbackParams) -> Result<CallbackOutcome, SdkError> {
        let credential = match (params.code, params.token) {
            (Some(code), _) => self.client.exchange_code(&code).await?,
            (None, Some(token)) => Credential::new(token),
            (None, None) => return Ok(CallbackOutcome::LoginRequired),
        };

        match self.set_credential(Some(credential)).await {
            Ok(RefreshOutcome::SessionEnded) => Ok(CallbackOutcome::LoginRequired),
            Ok(_) => Ok(CallbackOutcome::Authenticated),
            Err(e) => {
                warn!(error = %e, "identity fetch after login failed");
                Ok(CallbackOutcome::Authenticated)
            }
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Refetch the identity of the current credential.
    ///
    /// A rejected credential tears the session down. Transport and server
    /// failures leave the session as it was and are returned.
    pub async fn refresh_identity(&self) -> Result<RefreshOutcome, SdkError> {
        self.ensure_ready()?;

        let (credential, generation) = {
            let state = self.state();
            match state.session.credential() {
                Some(c) => (c.clone(), state.generation),
                None => return Ok(RefreshOutcome::NoCredential),
            }
        };

        let result = self.client.fetch_identity(&credential).await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(
                started = generation,
                current = state.generation,
                "discarding superseded identity fetch"
            );
            return Ok(RefreshOutcome::Superseded);
        }

        match result {
            Ok(identity) => {
                let previous = state.session.current_tribe().cloned();
                let selected = select_current_tribe(&identity, previous.as_ref());
                if selected != previous {
                    if selected.is_none() {
                        debug!(tribe = ?previous, "clearing stale tribe context");
                    }
                    state.session.set_current_tribe(selected);
                }
                info!(user = %identity.username, wallets = identity.wallets.len(), "identity loaded");
                state.identity = Some(identity);
                Ok(RefreshOutcome::Loaded)
            }
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "credential rejected, ending session");
                state.generation += 1;
                state.session.clear();
                state.identity = None;
                Ok(RefreshOutcome::SessionEnded)
            }
            Err(e) => {
                warn!(error = %e, "identity fetch failed, keeping session");
                Err(e)
            }
        }
    }

    /// `true` when the loaded identity may see the roster.
    pub fn is_roster_visible(&self) -> bool {
        self.state()
            .identity
            .as_ref()
            .is_some_and(Identity::can_view_roster)
    }

    // ------------------------------------------------------------------
    // Wallet linking
    // ------------------------------------------------------------------

    /// Compare the wallet's chain with the configured network. `None` when
    /// the wallet has no account selected.
    pub fn network_status(&self, wallet: &dyn WalletCapability) -> Option<NetworkMatch> {
        let account = wallet.current_account()?;
        Some(NetworkMatch::evaluate(&account.chains, &self.config.sui_network))
    }

    /// Latest link phase.
    pub fn link_phase(&self) -> LinkPhase {
        self.link.phase()
    }

    /// Receive link phase changes.
    pub fn subscribe_link_phase(&self) -> watch::Receiver<LinkPhase> {
        self.link.subscribe()
    }

    /// `true` while a link attempt is running.
    pub fn is_link_in_flight(&self) -> bool {
        self.link.is_in_flight()
    }

    /// Prove ownership of the wallet's current account and attach it to
    /// the identity.
    ///
    /// Preconditions (reachability, credential, account, network, no other
    /// attempt running) fail fast without touching the network or the
    /// published phase. After a successful verification the identity is
    /// refetched before the phase becomes [`LinkPhase::Linked`].
    pub async fn link_wallet(&self, wallet: &dyn WalletCapability) -> Result<(), LinkError> {
        if !self.guard.is_ready() {
            return Err(LinkError::NotReady);
        }
        let credential = self.credential().ok_or(LinkError::NotAuthenticated)?;
        let account = wallet.current_account().ok_or(LinkError::NoAccount)?;

        if let NetworkMatch::WrongNetwork { current } =
            NetworkMatch::evaluate(&account.chains, &self.config.sui_network)
        {
            return Err(LinkError::WrongNetwork {
                target: self.config.sui_network.clone(),
                current,
            });
        }

        let attempt = self.link.try_begin().ok_or(LinkError::AlreadyInFlight)?;
        info!(address = %account.address, "linking wallet");

        let outcome = self
            .run_link(&attempt, wallet, &credential, &account.address)
            .await;

        match &outcome {
            Ok(()) => {
                if let Err(e) = self.refresh_identity().await {
                    warn!(error = %e, "identity refresh after link failed");
                }
            }
            Err(e) => warn!(error = ?e, "wallet link failed"),
        }

        attempt.finish(outcome)
    }

    async fn run_link(
        &self,
        attempt: &LinkAttempt<'_>,
        wallet: &dyn WalletCapability,
        credential: &Credential,
        address: &WalletAddress,
    ) -> Result<(), LinkError> {
        attempt.advance(LinkPhase::RequestingNonce);
        let nonce = self
            .client
            .request_link_nonce(credential, address)
            .await
            .map_err(|e| LinkError::NonceUnavailable {
                detail: e.to_string(),
            })?;

        attempt.advance(LinkPhase::AwaitingSignature);
        let signed = wallet
            .sign_personal_message(nonce.as_bytes())
            .await
            .map_err(|e| LinkError::UserDeclined(e.0))?;

        attempt.advance(LinkPhase::Verifying);
        self.client
            .verify_link(credential, address, &signed.signature)
            .await
            .map_err(|e| LinkError::Rejected(e.user_message()))
    }

    /// Detach a linked wallet.
    ///
    /// The identity is refetched whatever the delete returned; the delete
    /// result is what comes back.
    pub async fn unlink_wallet(&self, id: &WalletId) -> Result<(), SdkError> {
        let credential = self.require_credential()?;
        let result = self.client.unlink_wallet(&credential, id).await;
        if let Err(e) = &result {
            warn!(wallet = %id, error = %e, "unlink failed");
        }

        if let Err(e) = self.refresh_identity().await {
            warn!(error = %e, "identity refresh after unlink failed");
        }
        result
    }

    // ------------------------------------------------------------------
    // Voice and roster
    // ------------------------------------------------------------------

    /// Voice account status.
    pub async fn voice_status(&self) -> Result<VoiceAccountStatus, SdkError> {
        let credential = self.require_credential()?;
        self.client.voice_status(&credential).await
    }

    /// Create the voice account or reset its password.
    pub async fn create_voice_account(&self) -> Result<VoiceAccountCredentials, SdkError> {
        let credential = self.require_credential()?;
        self.client.create_voice_account(&credential).await
    }

    /// Tribe roster. Without an explicit tribe the query is scoped to the
    /// current tribe context.
    pub async fn roster(&self, mut query: RosterQuery) -> Result<Vec<RosterMember>, SdkError> {
        let credential = self.require_credential()?;
        if query.tribe.is_none() {
            query.tribe = self.current_tribe();
        }
        self.client.roster(&credential, &query).await
    }

    /// One roster member with a page of their audit trail, scoped like
    /// [`roster`](Self::roster).
    pub async fn roster_member(&self, discord_id: &str, mut query: MemberQuery) -> Result<RosterMember, SdkError> {
        let credential = self.require_credential()?;
        if query.tribe.is_none() {
            query.tribe = self.current_tribe();
        }
        self.client.roster_member(&credential, discord_id, &query).await
    }

    /// Notes on a member within the current tribe. Notes belong to a tribe,
    /// so without a current tribe there is nothing to show.
    pub async fn member_notes(&self, discord_id: &str) -> Result<Vec<MemberNote>, SdkError> {
        let credential = self.require_credential()?;
        let Some(tribe) = self.current_tribe() else {
            debug!(discord_id, "no current tribe; no notes");
            return Ok(Vec::new());
        };
        self.client.member_notes(&credential, discord_id, &tribe).await
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Explorer link for `value` on the configured network.
    pub fn explorer_link(&self, value: &str, kind: ExplorerKind) -> String {
        explorer_url(
            &self.config.block_explorer_url,
            self.config.sui_network.as_str(),
            value,
            kind,
        )
    }
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("api_url", &self.config.api_url)
            .field("reachability", &self.guard.status())
            .field("link_phase", &self.link.phase())
            .finish_non_exhaustive()
    }
}
