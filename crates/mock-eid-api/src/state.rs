//! In-memory data behind the stub API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use eid_models::{AuditEntry, Identity, LinkedWallet, MemberNote, TribeName, VerifyRequest, WalletId};
use uuid::Uuid;

/// State shared by all handlers.
pub(crate) type SharedState = Arc<Shared>;

pub(crate) struct Shared {
    pub jwt_secret: String,
    /// Where stub logins redirect to (`<frontend>/auth/callback?code=…`).
    pub frontend_url: String,
    /// Tribe a user must belong to before a voice account is created.
    pub voice_tribe: TribeName,
    data: Mutex<MockData>,
}

impl Shared {
    pub fn new(jwt_secret: String, frontend_url: String, voice_tribe: TribeName) -> Self {
        Self {
            jwt_secret,
            frontend_url,
            voice_tribe,
            data: Mutex::new(MockData::default()),
        }
    }

    pub fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A wallet the user unlinked; still listed (as deleted) in the roster.
pub(crate) struct RemovedWallet {
    pub user_id: String,
    pub wallet: LinkedWallet,
    pub deleted_at: DateTime<Utc>,
}

/// A nonce waiting for its signature.
pub(crate) struct PendingNonce {
    pub user_id: String,
    pub nonce: String,
}

#[derive(Default)]
pub(crate) struct MockData {
    pub users: HashMap<String, Identity>,
    /// One-time auth code → user id.
    pub auth_codes: HashMap<String, String>,
    /// Lower-cased address → pending nonce.
    pub nonces: HashMap<String, PendingNonce>,
    /// Value handed out by the next nonce request instead of a UUID.
    pub next_nonce: Option<String>,
    pub reject_signatures: bool,
    pub unavailable: bool,
    pub nonce_requests: usize,
    pub verify_requests: Vec<VerifyRequest>,
    /// User id → voice username.
    pub voice_accounts: HashMap<String, String>,
    pub removed_wallets: Vec<RemovedWallet>,
    /// Audit trail, oldest first.
    pub audits: Vec<AuditEntry>,
    pub notes: Vec<MemberNote>,
}

impl MockData {
    /// `true` if any user has `address` linked (case-insensitive).
    pub fn address_linked(&self, address: &str) -> bool {
        self.users.values().any(|u| {
            u.wallets
                .iter()
                .any(|w| w.address.as_str().eq_ignore_ascii_case(address))
        })
    }

    pub fn user_by_discord_id(&self, discord_id: &str) -> Option<&Identity> {
        self.users.values().find(|u| u.discord_id == discord_id)
    }

    /// Append to the audit trail. `target_id` is `None` for self-actions.
    pub fn record_audit(&mut self, action: &str, actor_id: &str, target_id: Option<&str>, details: String) {
        let (actor_username, actor_discriminator) = self
            .users
            .get(actor_id)
            .map(|u| (u.username.clone(), u.discriminator.clone()))
            .unwrap_or_default();
        self.audits.push(AuditEntry {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            actor_id: actor_id.to_string(),
            target_id: target_id.map(str::to_string),
            details,
            created_at: Utc::now(),
            actor_username,
            actor_discriminator,
        });
    }
}

/// The identities [`MockApi::seeded`](crate::MockApi::seeded) starts with.
///
/// | id | username | tribes        | admin of | flags       | wallets |
/// |----|----------|---------------|----------|-------------|---------|
/// | 1  | ember    | Fire, Water   | Fire     |             | 1       |
/// | 2  | ash      | Fire, Water   |          |             | 0       |
/// | 3  | root     |               |          | super admin | 0       |
pub(crate) fn seed_users() -> Vec<Identity> {
    let verified_at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 30, 0).single();
    let last_login = Utc.with_ymd_and_hms(2026, 2, 5, 10, 0, 0).single();

    let fire = TribeName::new("Fire");
    let water = TribeName::new("Water");

    let mut ember = Identity {
        id: "1".to_string(),
        discord_id: "100000000000000001".to_string(),
        username: "ember".to_string(),
        discriminator: "0".to_string(),
        avatar: None,
        tribes: vec![fire.clone(), water.clone()],
        admin_tribes: vec![fire.clone()],
        is_admin: false,
        is_super_admin: false,
        last_login_at: last_login,
        wallets: Vec::new(),
    };
    if let Some(verified_at) = verified_at {
        ember.wallets.push(LinkedWallet {
            id: WalletId::new("w-ember-1"),
            address: "0xemberwallet0000000000000000000000000001".into(),
            verified_at,
            network: Some("testnet".to_string()),
            tribes: vec![fire.clone()],
        });
    }

    let ash = Identity {
        id: "2".to_string(),
        discord_id: "100000000000000002".to_string(),
        username: "ash".to_string(),
        discriminator: "0".to_string(),
        avatar: None,
        tribes: vec![fire, water],
        admin_tribes: Vec::new(),
        is_admin: false,
        is_super_admin: false,
        last_login_at: None,
        wallets: Vec::new(),
    };

    let root = Identity {
        id: "3".to_string(),
        discord_id: "100000000000000003".to_string(),
        username: "root".to_string(),
        discriminator: "0".to_string(),
        avatar: None,
        tribes: Vec::new(),
        admin_tribes: Vec::new(),
        is_admin: true,
        is_super_admin: true,
        last_login_at: last_login,
        wallets: Vec::new(),
    };

    vec![ember, ash, root]
}

/// One note by ember on ash, in Fire.
pub(crate) fn seed_notes() -> Vec<MemberNote> {
    let Some(written) = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).single() else {
        return Vec::new();
    };
    vec![MemberNote {
        id: "note-1".to_string(),
        target_user_id: "2".to_string(),
        author_id: "1".to_string(),
        tribe: TribeName::new("Fire"),
        content: "Asked about voice access".to_string(),
        created_at: written,
        updated_at: written,
        author_username: "ember".to_string(),
        author_discriminator: "0".to_string(),
    }]
}
