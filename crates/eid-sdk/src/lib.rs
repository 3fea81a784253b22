//! # EID SDK
//!
//! Client core for the **EID member portal**.
//!
//! The SDK provides:
//!
//! * [`Portal`]: the session orchestrator (boot guard, credential,
//!   identity, tribe context, wallet linking, voice and roster reads).
//! * [`PortalClient`]: stateless typed calls against the REST API.
//! * [`WalletCapability`]: what an external wallet must offer to be
//!   linked (current account, personal-message signing).
//! * [`ReachabilityGuard`]: the liveness loop everything else waits on.
//! * [`KeyValueStorage`]: where the credential and tribe context persist
//!   ([`MemoryStorage`], [`FileStorage`]).
//! * [`SdkError`] / [`LinkError`]: error types.
//!
//! Models from [`eid_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use eid_sdk::{FileStorage, MemoryStorage, KeyValueStorage, Portal, PortalConfig};
//!
//! # async fn run() -> Result<(), eid_sdk::SdkError> {
//! let storage: Arc<dyn KeyValueStorage> = match FileStorage::default_location() {
//!     Some(file) => Arc::new(file),
//!     None => Arc::new(MemoryStorage::new()),
//! };
//! let portal = Portal::new(PortalConfig::from_env(), storage)?;
//!
//! // Blocks until the API answers its liveness probe.
//! portal.boot().await?;
//!
//! if let Some(me) = portal.identity() {
//!     println!("signed in as {} ({} wallets)", me.username, me.wallets.len());
//! } else {
//!     println!("log in at {}", portal.login_url());
//! }
//! # Ok(())
//! # }
//! ```

pub mod callback;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod link;
pub mod portal;
pub mod reachability;
pub mod session;
pub mod storage;
pub mod tribe;
pub mod wallet;

pub use callback::{CallbackOutcome, CallbackParams};
pub use client::PortalClient;
pub use config::PortalConfig;
pub use credentials::Credential;
pub use error::SdkError;
pub use link::{LinkAttempt, LinkError, LinkPhase, LinkTracker};
pub use portal::{Portal, RefreshOutcome};
pub use reachability::{LivenessProbe, Reachability, ReachabilityGuard};
pub use session::SessionStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageKey};
pub use tribe::select_current_tribe;
pub use wallet::{SignRejected, SignedMessage, WalletAccount, WalletCapability};

pub use eid_models;
