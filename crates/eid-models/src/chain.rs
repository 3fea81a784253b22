//! Chain identifiers and Sui network selection.
//!
//! Wallets report the chains an account is usable on as
//! `namespace:network` strings (e.g. `sui:testnet`). The portal is
//! configured for exactly one [`SuiNetwork`]; a wallet whose first
//! reported chain is a different network must not be linked.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Namespace used by Sui wallets in chain identifiers.
pub const SUI_NAMESPACE: &str = "sui";

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// A `namespace:network` chain identifier as reported by a wallet.
///
/// # Examples
///
/// ```
/// use eid_models::ChainId;
///
/// let chain: ChainId = "sui:testnet".parse().unwrap();
/// assert_eq!(chain.namespace(), "sui");
/// assert_eq!(chain.network(), "testnet");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId {
    namespace: String,
    network: String,
}

impl ChainId {
    /// Build a chain identifier from its two halves.
    pub fn new(namespace: &str, network: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            network: network.to_string(),
        }
    }

    /// The namespace half (`sui` in `sui:testnet`).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The network half (`testnet` in `sui:testnet`).
    pub fn network(&self) -> &str {
        &self.network
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.network)
    }
}

impl FromStr for ChainId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ModelError::InvalidChainId {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (namespace, network) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected namespace:network"))?;
        if namespace.is_empty() || network.is_empty() {
            return Err(invalid("namespace and network must not be empty"));
        }
        Ok(Self::new(namespace, network))
    }
}

impl TryFrom<String> for ChainId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainId> for String {
    fn from(chain: ChainId) -> Self {
        chain.to_string()
    }
}

// ---------------------------------------------------------------------------
// SuiNetwork
// ---------------------------------------------------------------------------

/// The Sui network the portal expects wallets to be connected to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SuiNetwork {
    /// `mainnet`
    Mainnet,
    /// `testnet`
    #[default]
    Testnet,
    /// `devnet`
    Devnet,
    /// `localnet`
    Localnet,
    /// Any other network name, kept verbatim.
    Custom(String),
}

impl SuiNetwork {
    /// Lower-case network name as it appears in chain identifiers.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
            Self::Localnet => "localnet",
            Self::Custom(name) => name,
        }
    }

    /// The chain identifier a wallet must report to match this network.
    pub fn target_chain(&self) -> ChainId {
        ChainId::new(SUI_NAMESPACE, self.as_str())
    }

    /// Display label: `Mainnet`, `Testnet` or `Devnet`; any other network
    /// shows its raw name.
    pub fn label(&self) -> &str {
        match self {
            Self::Mainnet => "Mainnet",
            Self::Testnet => "Testnet",
            Self::Devnet => "Devnet",
            Self::Localnet | Self::Custom(_) => self.as_str(),
        }
    }
}

impl fmt::Display for SuiNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuiNetwork {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Self::Mainnet,
            "testnet" => Self::Testnet,
            "devnet" => Self::Devnet,
            "localnet" => Self::Localnet,
            _ => Self::Custom(s.trim().to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Network detection
// ---------------------------------------------------------------------------

/// Result of comparing a wallet's reported chains with the target network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMatch {
    /// The first chain is the target chain.
    Matches,
    /// The wallet is on another chain.
    WrongNetwork {
        /// The chain the wallet reported.
        current: ChainId,
    },
    /// The wallet reported no chains; detection is not possible.
    Unknown,
}

impl NetworkMatch {
    /// Compare the wallet's chains against `target`.
    ///
    /// Only the first chain is authoritative.
    pub fn evaluate(chains: &[ChainId], target: &SuiNetwork) -> Self {
        let Some(first) = chains.first() else {
            return Self::Unknown;
        };
        if first.namespace() == SUI_NAMESPACE && first.network() == target.as_str() {
            Self::Matches
        } else {
            Self::WrongNetwork {
                current: first.clone(),
            }
        }
    }

    /// `true` when the wallet is known to be on the wrong network.
    pub fn is_wrong_network(&self) -> bool {
        matches!(self, Self::WrongNetwork { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_parse_and_display() {
        let chain: ChainId = "sui:mainnet".parse().unwrap();
        assert_eq!(chain.namespace(), "sui");
        assert_eq!(chain.network(), "mainnet");
        assert_eq!(chain.to_string(), "sui:mainnet");
    }

    #[test]
    fn chain_id_rejects_missing_separator() {
        assert!(matches!(
            "testnet".parse::<ChainId>(),
            Err(ModelError::InvalidChainId { .. })
        ));
        assert!("sui:".parse::<ChainId>().is_err());
    }

    #[test]
    fn chain_id_serde_as_string() {
        let chains: Vec<ChainId> = serde_json::from_str(r#"["sui:testnet"]"#).unwrap();
        assert_eq!(chains[0], ChainId::new("sui", "testnet"));
        assert_eq!(serde_json::to_string(&chains).unwrap(), r#"["sui:testnet"]"#);
    }

    #[test]
    fn sui_network_from_str() {
        assert_eq!("Testnet".parse::<SuiNetwork>().unwrap(), SuiNetwork::Testnet);
        assert_eq!(
            "staging".parse::<SuiNetwork>().unwrap(),
            SuiNetwork::Custom("staging".into())
        );
        assert_eq!(SuiNetwork::Devnet.target_chain().to_string(), "sui:devnet");
    }

    #[test]
    fn labels() {
        assert_eq!(SuiNetwork::Mainnet.label(), "Mainnet");
        assert_eq!(SuiNetwork::Custom("staging".into()).label(), "staging");
        assert_eq!(SuiNetwork::Localnet.label(), "localnet");
    }

    #[test]
    fn wallet_on_mainnet_is_wrong_for_testnet() {
        let chains = vec![ChainId::new("sui", "mainnet")];
        let result = NetworkMatch::evaluate(&chains, &SuiNetwork::Testnet);
        assert!(result.is_wrong_network());
        assert_eq!(
            result,
            NetworkMatch::WrongNetwork {
                current: ChainId::new("sui", "mainnet")
            }
        );
    }

    #[test]
    fn only_first_chain_is_authoritative() {
        let chains = vec![
            ChainId::new("sui", "testnet"),
            ChainId::new("sui", "mainnet"),
        ];
        assert_eq!(
            NetworkMatch::evaluate(&chains, &SuiNetwork::Testnet),
            NetworkMatch::Matches
        );
    }

    #[test]
    fn foreign_namespace_is_wrong_network() {
        let chains = vec![ChainId::new("eip155", "testnet")];
        assert!(NetworkMatch::evaluate(&chains, &SuiNetwork::Testnet).is_wrong_network());
    }

    #[test]
    fn no_chains_is_unknown() {
        assert_eq!(
            NetworkMatch::evaluate(&[], &SuiNetwork::Testnet),
            NetworkMatch::Unknown
        );
    }
}
