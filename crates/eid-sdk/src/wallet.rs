//! The external wallet the SDK asks for an address and a signature.
//!
//! The SDK never touches keys. Anything that can report the selected
//! account and sign a personal message (a browser extension bridge, a
//! hardware signer, or a human pasting a signature into a terminal)
//! implements [`WalletCapability`].

use async_trait::async_trait;
use eid_models::{ChainId, WalletAddress};

/// The account currently selected in the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    /// Account address.
    pub address: WalletAddress,
    /// Chains the account reports, most relevant first. May be empty when
    /// the wallet does not expose them.
    pub chains: Vec<ChainId>,
}

impl WalletAccount {
    /// An account on a single chain.
    pub fn on_chain(address: impl Into<WalletAddress>, chain: ChainId) -> Self {
        Self {
            address: address.into(),
            chains: vec![chain],
        }
    }
}

/// Output of a successful personal-message signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    /// Serialized signature, passed to the server untouched.
    pub signature: String,
}

/// The wallet (or its user) refused to sign. Carries the wallet's reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SignRejected(pub String);

/// Capability surface of an external wallet.
#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// The selected account, or `None` when no wallet is connected.
    fn current_account(&self) -> Option<WalletAccount>;

    /// Sign `message` as a personal message. May wait indefinitely for
    /// the user.
    async fn sign_personal_message(&self, message: &[u8]) -> Result<SignedMessage, SignRejected>;
}
