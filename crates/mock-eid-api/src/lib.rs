//! # Mock EID API
//!
//! In-process stand-in for the EID portal backend. It speaks the same REST
//! contract as the real service, keeps everything in memory, and exposes
//! knobs that integration tests use to steer it (fixed nonces, rejected
//! signatures, an unavailable liveness endpoint).
//!
//! ```rust,no_run
//! use mock_eid_api::MockApi;
//!
//! # async fn run() -> std::io::Result<()> {
//! let api = MockApi::seeded();
//! let addr = api.spawn().await?;
//! println!("stub listening on http://{addr}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Routes
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /docs` | liveness (503 while unavailable) |
//! | `GET /api/auth/discord/login` | hint text, there is no provider |
//! | `GET /api/auth/stub-login?user_id=` | redirect to the frontend callback with a code |
//! | `POST /api/auth/exchange` | code → token |
//! | `GET /api/me` | identity |
//! | `POST /api/wallets/link-nonce` | nonce |
//! | `POST /api/wallets/link-verify` | verify + link |
//! | `DELETE /api/wallets/{id}` | unlink |
//! | `GET /api/mumble/status` | voice account |
//! | `POST /api/mumble/account` | create / reset voice account |
//! | `GET /api/roster` | tribe roster |
//! | `GET /api/roster/{discord_id}` | member detail with audit page |
//! | `GET /api/roster/{discord_id}/notes` | admin notes on a member |

mod auth;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use eid_models::{ApiRoutes, Identity, TribeName, VerifyRequest};
use tracing::{error, info};
use uuid::Uuid;

pub use auth::{verify_token, Claims};
pub use error::ApiError;

use crate::state::{seed_notes, seed_users, Shared, SharedState};

/// Secret used when none is configured.
pub const DEFAULT_JWT_SECRET: &str = "stub-jwt-secret";
/// Frontend that stub logins redirect to by default.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
/// Tribe required for a voice account.
pub const VOICE_TRIBE: &str = "Fire";

/// Handle on a stub backend. Clones share the same data.
#[derive(Clone)]
pub struct MockApi {
    shared: SharedState,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(DEFAULT_JWT_SECRET)
    }
}

impl MockApi {
    /// An empty backend signing tokens with `jwt_secret`.
    pub fn new(jwt_secret: &str) -> Self {
        Self::with_frontend(jwt_secret, DEFAULT_FRONTEND_URL)
    }

    /// An empty backend whose stub logins redirect to `frontend_url`.
    pub fn with_frontend(jwt_secret: &str, frontend_url: &str) -> Self {
        Self {
            shared: Arc::new(Shared::new(
                jwt_secret.to_string(),
                frontend_url.trim_end_matches('/').to_string(),
                TribeName::new(VOICE_TRIBE),
            )),
        }
    }

    /// A backend pre-loaded with three users:
    ///
    /// * `1` ember: tribes Fire and Water, admin of Fire, one wallet.
    /// * `2` ash: tribes Fire and Water, no admin rights.
    /// * `3` root: no tribes, global and super admin.
    ///
    /// Ember has left one Fire note on ash.
    pub fn seeded() -> Self {
        let api = Self::default();
        api.seed();
        api
    }

    /// Add the seed users and notes to this backend.
    pub fn seed(&self) {
        for user in seed_users() {
            self.add_user(user);
        }
        self.shared.data().notes.extend(seed_notes());
    }

    /// The axum router serving this backend.
    pub fn router(&self) -> Router {
        Router::new()
            .route(ApiRoutes::DEFAULT_LIVENESS, get(handlers::docs))
            .route(ApiRoutes::DISCORD_LOGIN, get(handlers::discord_login))
            .route("/api/auth/stub-login", get(handlers::stub_login))
            .route(ApiRoutes::EXCHANGE, post(handlers::exchange))
            .route(ApiRoutes::ME, get(handlers::me))
            .route(ApiRoutes::LINK_NONCE, post(handlers::link_nonce))
            .route(ApiRoutes::LINK_VERIFY, post(handlers::link_verify))
            .route(ApiRoutes::WALLET_TEMPLATE, delete(handlers::unlink_wallet))
            .route(ApiRoutes::MUMBLE_STATUS, get(handlers::mumble_status))
            .route(ApiRoutes::MUMBLE_ACCOUNT, post(handlers::mumble_account))
            .route(ApiRoutes::ROSTER, get(handlers::roster))
            .route(ApiRoutes::ROSTER_MEMBER_TEMPLATE, get(handlers::roster_member))
            .route(ApiRoutes::ROSTER_NOTES_TEMPLATE, get(handlers::member_notes))
            .fallback(handlers::not_found)
            .with_state(self.shared.clone())
    }

    /// Serve on an ephemeral loopback port in a background task.
    pub async fn spawn(&self) -> std::io::Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "mock API stopped");
            }
        });

        info!(address = %addr, "mock API listening");
        Ok(addr)
    }

    // ------------------------------------------------------------------
    // Users and tokens
    // ------------------------------------------------------------------

    /// Insert or replace a user.
    pub fn add_user(&self, user: Identity) {
        self.shared.data().users.insert(user.id.clone(), user);
    }

    /// Delete a user; their tokens stop working on `/api/me`.
    pub fn remove_user(&self, user_id: &str) -> Option<Identity> {
        self.shared.data().users.remove(user_id)
    }

    /// Snapshot of a user.
    pub fn user(&self, user_id: &str) -> Option<Identity> {
        self.shared.data().users.get(user_id).cloned()
    }

    /// A valid bearer token for `user_id`.
    pub fn issue_token(&self, user_id: &str) -> Result<String, ApiError> {
        let username = self
            .user(user_id)
            .map(|u| u.username)
            .ok_or_else(|| ApiError::NotFound(format!("unknown user {user_id}")))?;
        auth::issue_token(&self.shared.jwt_secret, user_id, &username)
    }

    /// A one-time authorization code for `user_id`.
    pub fn issue_auth_code(&self, user_id: &str) -> String {
        let code = Uuid::new_v4().to_string();
        self.shared
            .data()
            .auth_codes
            .insert(code.clone(), user_id.to_string());
        code
    }

    // ------------------------------------------------------------------
    // Test knobs
    // ------------------------------------------------------------------

    /// Make the next nonce request return `nonce`.
    pub fn set_next_nonce(&self, nonce: &str) {
        self.shared.data().next_nonce = Some(nonce.to_string());
    }

    /// Reject every signature from now on (or stop rejecting).
    pub fn reject_signatures(&self, reject: bool) {
        self.shared.data().reject_signatures = reject;
    }

    /// Toggle the liveness endpoint between 200 and 503.
    pub fn set_available(&self, available: bool) {
        self.shared.data().unavailable = !available;
    }

    /// How many nonces have been requested.
    pub fn nonce_request_count(&self) -> usize {
        self.shared.data().nonce_requests
    }

    /// Every verify body received, in order.
    pub fn verify_requests(&self) -> Vec<VerifyRequest> {
        self.shared.data().verify_requests.clone()
    }

    /// Audit actions recorded so far, oldest first.
    pub fn audit_actions(&self) -> Vec<String> {
        self.shared.data().audits.iter().map(|a| a.action.clone()).collect()
    }

    /// Voice username of `user_id`, if an account exists.
    pub fn voice_account(&self, user_id: &str) -> Option<String> {
        self.shared.data().voice_accounts.get(user_id).cloned()
    }
}

impl std::fmt::Debug for MockApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApi")
            .field("users", &self.shared.data().users.len())
            .finish_non_exhaustive()
    }
}
