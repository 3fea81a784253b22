//! Admin roster rows and query parameters (`GET /api/roster`), plus the
//! member detail view (`GET /api/roster/{discord_id}`) with its audit trail
//! and admin notes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ModelError;
use crate::identity::TribeName;
use crate::wallet::{WalletAddress, WalletId};

/// Column the roster is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RosterSort {
    /// Alphabetical by username.
    #[default]
    Username,
    /// Number of linked wallets.
    WalletCount,
    /// Most recent login.
    LastLogin,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl RosterSort {
    /// Parse a user-supplied sort keyword.
    pub fn parse_keyword(value: &str) -> Result<Self, ModelError> {
        Self::from_str(value).map_err(|_| ModelError::UnknownRosterKeyword {
            field: "sort".to_string(),
            value: value.to_string(),
        })
    }
}

impl SortOrder {
    /// Parse a user-supplied order keyword.
    pub fn parse_keyword(value: &str) -> Result<Self, ModelError> {
        Self::from_str(value).map_err(|_| ModelError::UnknownRosterKeyword {
            field: "order".to_string(),
            value: value.to_string(),
        })
    }
}

/// Filters for a roster request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterQuery {
    /// Tribe to scope the roster to (required by the server for tribe admins).
    pub tribe: Option<TribeName>,
    /// Free-text filter on username or Discord id.
    pub search: Option<String>,
    /// Sort column.
    pub sort: RosterSort,
    /// Sort direction.
    pub order: SortOrder,
}

impl RosterQuery {
    /// Query-string pairs in the order the portal sends them. Empty
    /// filters are omitted; `sort` and `order` are always present.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(tribe) = &self.tribe {
            pairs.push(("tribe", tribe.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs.push(("sort", self.sort.to_string()));
        pairs.push(("order", self.order.to_string()));
        pairs
    }
}

/// Wallet as it appears in a roster row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterWallet {
    /// Wallet identifier.
    pub id: WalletId,
    /// Wallet address.
    pub address: WalletAddress,
    /// Set when the wallet has been unlinked (soft delete).
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Tribes the wallet has standing in.
    #[serde(default)]
    pub tribes: Vec<TribeName>,
}

/// One member of a tribe roster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    /// Discord user identifier.
    pub discord_id: String,
    /// Display name.
    pub username: String,
    /// Avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Previous login time.
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    /// Wallets, including soft-deleted ones.
    #[serde(default)]
    pub wallets: Vec<RosterWallet>,
    /// Audit page; only the member detail view carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audits: Option<AuditPage>,
}

impl RosterMember {
    /// Wallets that have not been unlinked.
    pub fn active_wallets(&self) -> impl Iterator<Item = &RosterWallet> {
        self.wallets.iter().filter(|w| w.deleted_at.is_none())
    }
}

/// Default audit page size of the member detail view.
pub const DEFAULT_AUDIT_PER_PAGE: u32 = 10;
/// Largest audit page the server hands out.
pub const MAX_AUDIT_PER_PAGE: u32 = 100;

/// Parameters of a member detail request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberQuery {
    /// Tribe the caller administers and the member belongs to.
    pub tribe: Option<TribeName>,
    /// 1-based audit page.
    pub audit_page: u32,
    /// Audit entries per page.
    pub audit_per_page: u32,
}

impl Default for MemberQuery {
    fn default() -> Self {
        Self {
            tribe: None,
            audit_page: 1,
            audit_per_page: DEFAULT_AUDIT_PER_PAGE,
        }
    }
}

impl MemberQuery {
    /// Query-string pairs; `tribe` is omitted when unset.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(tribe) = &self.tribe {
            pairs.push(("tribe", tribe.to_string()));
        }
        pairs.push(("audit_page", self.audit_page.to_string()));
        pairs.push(("audit_per_page", self.audit_per_page.to_string()));
        pairs
    }
}

/// One entry of a member's audit trail.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Entry identifier.
    pub id: String,
    /// Action keyword, e.g. `WALLET_LINK` or `VIEW_MEMBER`.
    pub action: String,
    /// User who acted.
    pub actor_id: String,
    /// User acted upon; absent for self-actions.
    #[serde(default)]
    pub target_id: Option<String>,
    /// Free-text description.
    pub details: String,
    /// When it happened.
    pub created_at: DateTime<Utc>,
    /// Actor's display name.
    pub actor_username: String,
    /// Actor's Discord discriminator.
    pub actor_discriminator: String,
}

/// One page of audit entries, newest first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    /// Entries on this page.
    pub items: Vec<AuditEntry>,
    /// Entries across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Number of pages (`0` when there are no entries).
    pub total_pages: u32,
}

/// A note a tribe admin left on a member. Notes are scoped to one tribe.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberNote {
    /// Note identifier.
    pub id: String,
    /// Member the note is about.
    pub target_user_id: String,
    /// Admin who wrote it.
    pub author_id: String,
    /// Tribe the note belongs to.
    pub tribe: TribeName,
    /// Note text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
    /// Author's display name.
    pub author_username: String,
    /// Author's Discord discriminator.
    pub author_discriminator: String,
}
