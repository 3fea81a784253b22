//! The authenticated user's identity as returned by `GET /api/me`.
//!
//! An [`Identity`] is always replaced wholesale when it is refetched; the
//! client never patches individual fields. The linked wallets it carries
//! are owned by the server.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::wallet::{WalletAddress, WalletId};

// ---------------------------------------------------------------------------
// TribeName
// ---------------------------------------------------------------------------

/// Name of a tribe (the organisation scope admin views are filtered by).
///
/// # Examples
///
/// ```
/// use eid_models::TribeName;
///
/// let fire: TribeName = "Fire".into();
/// assert_eq!(fire.as_str(), "Fire");
/// assert!(TribeName::parse("  ").is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TribeName(String);

impl TribeName {
    /// Create a new `TribeName` from a string slice.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Validate user input: trims whitespace and rejects blank names.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidTribeName {
                value: input.to_string(),
                reason: "must not be blank".to_string(),
            });
        }
        Ok(Self::new(trimmed))
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TribeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TribeName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TribeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// LinkedWallet
// ---------------------------------------------------------------------------

/// Network label assumed for wallets the server reports without one.
pub const DEFAULT_WALLET_NETWORK: &str = "mainnet";

/// A wallet address verified by the server and attached to an identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedWallet {
    /// Server-side wallet identifier (used for unlinking).
    pub id: WalletId,
    /// The wallet address.
    pub address: WalletAddress,
    /// When the server verified the ownership signature.
    pub verified_at: DateTime<Utc>,
    /// Network label the wallet was linked on, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Tribes for which this wallet itself has standing.
    #[serde(default)]
    pub tribes: Vec<TribeName>,
}

impl LinkedWallet {
    /// Network label, defaulting to [`DEFAULT_WALLET_NETWORK`].
    pub fn network(&self) -> &str {
        self.network.as_deref().unwrap_or(DEFAULT_WALLET_NETWORK)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Profile of the authenticated user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable portal identifier.
    pub id: String,
    /// Discord user identifier.
    pub discord_id: String,
    /// Display name.
    pub username: String,
    /// Discord discriminator (`0` for migrated accounts).
    #[serde(default)]
    pub discriminator: String,
    /// Avatar hash, if the user has one.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Tribes the user is a member of.
    #[serde(default)]
    pub tribes: Vec<TribeName>,
    /// Tribes the user administers.
    #[serde(default)]
    pub admin_tribes: Vec<TribeName>,
    /// Global admin flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Super-admin flag.
    #[serde(default)]
    pub is_super_admin: bool,
    /// Previous login time, if any.
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    /// Wallets linked to this identity.
    #[serde(default)]
    pub wallets: Vec<LinkedWallet>,
}

impl Identity {
    /// `true` if `tribe` is among the user's memberships or admin tribes.
    pub fn knows_tribe(&self, tribe: &TribeName) -> bool {
        self.tribes.contains(tribe) || self.admin_tribes.contains(tribe)
    }

    /// `true` if the user may see the tribe roster.
    pub fn can_view_roster(&self) -> bool {
        self.is_admin || !self.admin_tribes.is_empty()
    }

    /// Find a linked wallet by address (case-insensitive).
    pub fn wallet_by_address(&self, address: &WalletAddress) -> Option<&LinkedWallet> {
        self.wallets
            .iter()
            .find(|w| w.address.as_str().eq_ignore_ascii_case(address.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ME_JSON: &str = r#"{
        "id": "1",
        "discordId": "123456789",
        "username": "ember",
        "discriminator": "0",
        "avatar": null,
        "tribes": ["Fire", "Water"],
        "adminTribes": ["Fire"],
        "isAdmin": false,
        "isSuperAdmin": false,
        "lastLoginAt": "2026-02-05T10:00:00Z",
        "wallets": [{
            "id": "w-1",
            "userId": "1",
            "address": "0xabc",
            "verifiedAt": "2026-02-01T08:30:00Z",
            "tribes": ["Fire"]
        }]
    }"#;

    #[test]
    fn parses_me_response() {
        let identity: Identity = serde_json::from_str(ME_JSON).unwrap();
        assert_eq!(identity.discord_id, "123456789");
        assert_eq!(identity.admin_tribes, vec![TribeName::new("Fire")]);
        assert_eq!(identity.wallets.len(), 1);
        assert_eq!(identity.wallets[0].network(), "mainnet");
        assert_eq!(identity.wallets[0].tribes, vec![TribeName::new("Fire")]);
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let identity: Identity =
            serde_json::from_str(r#"{"id":"2","discordId":"9","username":"ash"}"#).unwrap();
        assert!(identity.tribes.is_empty());
        assert!(identity.wallets.is_empty());
        assert!(!identity.can_view_roster());
    }

    #[test]
    fn knows_tribe_checks_both_sets() {
        let mut identity: Identity = serde_json::from_str(ME_JSON).unwrap();
        identity.tribes.clear();
        assert!(identity.knows_tribe(&"Fire".into()));
        assert!(!identity.knows_tribe(&"Earth".into()));
    }

    #[test]
    fn wallet_lookup_ignores_case() {
        let identity: Identity = serde_json::from_str(ME_JSON).unwrap();
        assert!(identity.wallet_by_address(&"0xABC".into()).is_some());
        assert!(identity.wallet_by_address(&"0xdef".into()).is_none());
    }

    #[test]
    fn tribe_name_parse_trims() {
        assert_eq!(TribeName::parse(" Fire ").unwrap(), TribeName::new("Fire"));
    }
}
