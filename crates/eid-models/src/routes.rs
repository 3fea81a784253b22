//! Canonical REST path definitions for the portal API.
//!
//! Every path used by the SDK and by the stub backend is built through
//! [`ApiRoutes`], so client and server agree on a single layout.
//!
//! # Path layout
//!
//! ```text
//! /api/auth/discord/login        ← browser navigation, starts OAuth
//! /api/auth/exchange             ← POST {code} → {token}
//! /api/me                        ← GET identity (bearer)
//! /api/wallets/link-nonce        ← POST {address} → {nonce} (bearer)
//! /api/wallets/link-verify       ← POST {address, signature} (bearer)
//! /api/wallets/{id}              ← DELETE (bearer)
//! /api/mumble/status             ← GET voice account (bearer)
//! /api/mumble/account            ← POST create/reset voice account (bearer)
//! /api/roster                    ← GET tribe roster (bearer)
//! /api/roster/{discord_id}       ← GET member detail + audit page (bearer)
//! /api/roster/{discord_id}/notes ← GET admin notes on a member (bearer)
//! ```
//!
//! Paths that carry an identifier are listed as prefixes; the client
//! appends the identifier as a percent-encoded path segment so ids with
//! `/` or `?` cannot address another route.

/// Central authority for portal API paths.
///
/// # Examples
///
/// ```
/// use eid_models::ApiRoutes;
///
/// assert_eq!(ApiRoutes::ME, "/api/me");
/// assert_eq!(ApiRoutes::WALLETS, "/api/wallets");
/// ```
pub struct ApiRoutes;

impl ApiRoutes {
    /// OAuth entry point the user agent is sent to.
    pub const DISCORD_LOGIN: &'static str = "/api/auth/discord/login";
    /// Authorization-code exchange.
    pub const EXCHANGE: &'static str = "/api/auth/exchange";
    /// Authenticated identity.
    pub const ME: &'static str = "/api/me";
    /// Nonce issuance for wallet linking.
    pub const LINK_NONCE: &'static str = "/api/wallets/link-nonce";
    /// Signature verification for wallet linking.
    pub const LINK_VERIFY: &'static str = "/api/wallets/link-verify";
    /// Prefix of single-wallet paths; the wallet id is the next segment.
    pub const WALLETS: &'static str = "/api/wallets";
    /// Route template for a single wallet (axum path syntax).
    pub const WALLET_TEMPLATE: &'static str = "/api/wallets/{id}";
    /// Voice account status.
    pub const MUMBLE_STATUS: &'static str = "/api/mumble/status";
    /// Voice account creation / password reset.
    pub const MUMBLE_ACCOUNT: &'static str = "/api/mumble/account";
    /// Tribe roster, and prefix of member paths.
    pub const ROSTER: &'static str = "/api/roster";
    /// Route template for a member's detail (axum path syntax).
    pub const ROSTER_MEMBER_TEMPLATE: &'static str = "/api/roster/{discord_id}";
    /// Route template for the notes on a member (axum path syntax).
    pub const ROSTER_NOTES_TEMPLATE: &'static str = "/api/roster/{discord_id}/notes";
    /// Last segment of the notes path.
    pub const NOTES_SEGMENT: &'static str = "notes";
    /// Default unauthenticated liveness path.
    pub const DEFAULT_LIVENESS: &'static str = "/docs";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_extend_their_prefixes() {
        assert!(ApiRoutes::WALLET_TEMPLATE.starts_with(ApiRoutes::WALLETS));
        assert!(ApiRoutes::ROSTER_MEMBER_TEMPLATE.starts_with(ApiRoutes::ROSTER));
        assert_eq!(
            ApiRoutes::ROSTER_NOTES_TEMPLATE,
            format!("{}/{}", ApiRoutes::ROSTER_MEMBER_TEMPLATE, ApiRoutes::NOTES_SEGMENT)
        );
    }

    #[test]
    fn wallet_routes_share_prefix() {
        for path in [ApiRoutes::LINK_NONCE, ApiRoutes::LINK_VERIFY] {
            assert!(path.starts_with("/api/wallets/"));
        }
    }
}
