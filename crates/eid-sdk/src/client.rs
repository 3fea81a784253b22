//! Typed HTTP client for the portal REST API.
//!
//! [`PortalClient`] is stateless: every authenticated call takes the
//! [`Credential`] to send. Session bookkeeping (which credential is
//! current, what to do when it is rejected) lives in
//! [`Portal`](crate::Portal).
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use eid_sdk::{Credential, PortalClient, PortalConfig};
//!
//! # async fn run() -> Result<(), eid_sdk::SdkError> {
//! let client = PortalClient::new(&PortalConfig::new("http://localhost:5038"))?;
//! let credential = client.exchange_code("oauth-code").await?;
//! let me = client.fetch_identity(&credential).await?;
//! println!("signed in as {}", me.username);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use eid_models::{
    ApiMessage, ApiRoutes, ExchangeRequest, ExchangeResponse, Identity, MemberNote, MemberQuery,
    NonceRequest, NonceResponse, RosterMember, RosterQuery, TribeName, VerifyRequest,
    VoiceAccountCredentials, VoiceAccountStatus, WalletAddress, WalletId,
};
use reqwest::{Response, StatusCode, Url};
use tracing::debug;

use crate::config::PortalConfig;
use crate::credentials::Credential;
use crate::error::SdkError;
use crate::reachability::LivenessProbe;

const ROSTER_FORBIDDEN: &str = "Access Denied: You must be an admin to view this page.";
const ROSTER_NEEDS_TRIBE: &str = "Please select a tribe from the dropdown above.";
const MEMBER_FORBIDDEN: &str = "Access Denied: You do not have permission to view this member.";
const MEMBER_NOT_FOUND: &str = "Member not found.";

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    liveness_path: String,
    probe_timeout: Duration,
}

impl PortalClient {
    /// Build a client from `config`. Fails if the API URL does not parse.
    pub fn new(config: &PortalConfig) -> Result<Self, SdkError> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| SdkError::Config(format!("invalid API URL {base_url:?}: {e}")))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SdkError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            liveness_path: config.liveness_path.clone(),
            probe_timeout: config.probe_timeout,
        })
    }

    /// API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `prefix` followed by `segments`, each percent-encoded as one path
    /// segment.
    fn endpoint(&self, prefix: &str, segments: &[&str]) -> Result<Url, SdkError> {
        let mut url = Url::parse(&self.url(prefix)).map_err(|e| SdkError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| SdkError::Config(format!("API URL {} cannot take a path", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Where to send the user agent to start the OAuth login.
    pub fn login_url(&self) -> String {
        self.url(ApiRoutes::DISCORD_LOGIN)
    }

    /// Trade a one-time authorization code for a credential.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential, SdkError> {
        let res = self
            .http
            .post(self.url(ApiRoutes::EXCHANGE))
            .json(&ExchangeRequest {
                code: code.to_string(),
            })
            .send()
            .await?;

        let res = ensure_success(res, "Failed to exchange authorization code").await?;
        let body: ExchangeResponse = res.json().await?;
        Ok(Credential::new(body.token))
    }

    /// Fetch the identity behind `credential`.
    ///
    /// Any 4xx answer means the credential is no good and maps to
    /// [`SdkError::Unauthorized`]; 5xx answers are [`SdkError::Protocol`].
    pub async fn fetch_identity(&self, credential: &Credential) -> Result<Identity, SdkError> {
        let res = self
            .http
            .get(self.url(ApiRoutes::ME))
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        let status = res.status();
        if status.is_client_error() {
            let message = error_message(res, "Unauthorized").await;
            debug!(status = status.as_u16(), %message, "identity fetch rejected");
            return Err(SdkError::Unauthorized(message));
        }

        let res = ensure_success(res, "Failed to fetch user").await?;
        Ok(res.json().await?)
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    /// Ask the server for a single-use nonce bound to `address`.
    pub async fn request_link_nonce(
        &self,
        credential: &Credential,
        address: &WalletAddress,
    ) -> Result<String, SdkError> {
        let res = self
            .http
            .post(self.url(ApiRoutes::LINK_NONCE))
            .bearer_auth(credential.as_str())
            .json(&NonceRequest {
                address: address.clone(),
            })
            .send()
            .await?;

        let res = ensure_success(res, "Failed to get nonce").await?;
        let body: NonceResponse = res.json().await?;
        Ok(body.nonce)
    }

    /// Submit the signed nonce for verification.
    pub async fn verify_link(
        &self,
        credential: &Credential,
        address: &WalletAddress,
        signature: &str,
    ) -> Result<(), SdkError> {
        let res = self
            .http
            .post(self.url(ApiRoutes::LINK_VERIFY))
            .bearer_auth(credential.as_str())
            .json(&VerifyRequest {
                address: address.clone(),
                signature: signature.to_string(),
            })
            .send()
            .await?;

        ensure_success(res, "Verification failed").await?;
        Ok(())
    }

    /// Detach a linked wallet.
    pub async fn unlink_wallet(&self, credential: &Credential, id: &WalletId) -> Result<(), SdkError> {
        let res = self
            .http
            .delete(self.endpoint(ApiRoutes::WALLETS, &[id.as_str()])?)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        ensure_success(res, "Failed to unlink wallet").await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Voice
    // ------------------------------------------------------------------

    /// Whether the user already has a voice account.
    pub async fn voice_status(&self, credential: &Credential) -> Result<VoiceAccountStatus, SdkError> {
        let res = self
            .http
            .get(self.url(ApiRoutes::MUMBLE_STATUS))
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        let res = ensure_success(res, "Failed to load voice account").await?;
        Ok(res.json().await?)
    }

    /// Create the voice account, or reset its password if it exists.
    pub async fn create_voice_account(
        &self,
        credential: &Credential,
    ) -> Result<VoiceAccountCredentials, SdkError> {
        let res = self
            .http
            .post(self.url(ApiRoutes::MUMBLE_ACCOUNT))
            .bearer_auth(credential.as_str())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let res = ensure_success(res, "Failed to create account").await?;
        Ok(res.json().await?)
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    /// List tribe members.
    pub async fn roster(
        &self,
        credential: &Credential,
        query: &RosterQuery,
    ) -> Result<Vec<RosterMember>, SdkError> {
        let mut url = Url::parse(&self.url(ApiRoutes::ROSTER))
            .map_err(|e| SdkError::Config(e.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(query.to_pairs().iter().map(|(k, v)| (*k, v.as_str())));

        let res = self
            .http
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        match res.status() {
            StatusCode::FORBIDDEN => {
                return Err(SdkError::Protocol {
                    status: 403,
                    message: ROSTER_FORBIDDEN.to_string(),
                })
            }
            StatusCode::BAD_REQUEST => {
                return Err(SdkError::Protocol {
                    status: 400,
                    message: ROSTER_NEEDS_TRIBE.to_string(),
                })
            }
            _ => {}
        }

        let res = ensure_success(res, "Failed to fetch roster").await?;
        Ok(res.json().await?)
    }

    /// One member with a page of their audit trail.
    pub async fn roster_member(
        &self,
        credential: &Credential,
        discord_id: &str,
        query: &MemberQuery,
    ) -> Result<RosterMember, SdkError> {
        let mut url = self.endpoint(ApiRoutes::ROSTER, &[discord_id])?;
        url.query_pairs_mut()
            .extend_pairs(query.to_pairs().iter().map(|(k, v)| (*k, v.as_str())));

        let res = self
            .http
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        let fixed = match res.status() {
            StatusCode::FORBIDDEN => Some(MEMBER_FORBIDDEN),
            StatusCode::NOT_FOUND => Some(MEMBER_NOT_FOUND),
            StatusCode::BAD_REQUEST => Some(ROSTER_NEEDS_TRIBE),
            _ => None,
        };
        if let Some(message) = fixed {
            return Err(SdkError::Protocol {
                status: res.status().as_u16(),
                message: message.to_string(),
            });
        }

        let res = ensure_success(res, "Failed to fetch member details").await?;
        Ok(res.json().await?)
    }

    /// Notes tribe admins left on a member, newest first.
    pub async fn member_notes(
        &self,
        credential: &Credential,
        discord_id: &str,
        tribe: &TribeName,
    ) -> Result<Vec<MemberNote>, SdkError> {
        let mut url = self.endpoint(ApiRoutes::ROSTER, &[discord_id, ApiRoutes::NOTES_SEGMENT])?;
        url.query_pairs_mut().append_pair("tribe", tribe.as_str());

        let res = self
            .http
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        let res = ensure_success(res, "Failed to load notes").await?;
        Ok(res.json().await?)
    }
}

#[async_trait]
impl LivenessProbe for PortalClient {
    async fn probe(&self) -> Result<(), SdkError> {
        let res = self
            .http
            .get(self.url(&self.liveness_path))
            .timeout(self.probe_timeout)
            .send()
            .await?;

        ensure_success(res, "Liveness probe failed").await?;
        Ok(())
    }
}

/// Pass 2xx responses through; turn anything else into
/// [`SdkError::Protocol`] with the best message the body offers.
async fn ensure_success(res: Response, fallback: &str) -> Result<Response, SdkError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let message = error_message(res, fallback).await;
    Err(SdkError::Protocol {
        status: status.as_u16(),
        message,
    })
}

/// Error text of a failed response: a JSON `message` / `error` field, else
/// the plain-text body, else `fallback`.
async fn error_message(res: Response, fallback: &str) -> String {
    let body = res.text().await.unwrap_or_default();
    message_from_body(&body).unwrap_or_else(|| fallback.to_string())
}

fn message_from_body(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ApiMessage>(body) {
        return parsed.text().map(str::to_string);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use eid_models::TribeName;

    use super::*;

    #[test]
    fn message_prefers_json_fields() {
        assert_eq!(
            message_from_body(r#"{"error":"Invalid Token"}"#).as_deref(),
            Some("Invalid Token")
        );
        assert_eq!(
            message_from_body(r#"{"message":"Wallet already linked"}"#).as_deref(),
            Some("Wallet already linked")
        );
    }

    #[test]
    fn message_falls_back_to_plain_text() {
        assert_eq!(
            message_from_body("  Nonce invalid or expired\n").as_deref(),
            Some("Nonce invalid or expired")
        );
        assert_eq!(message_from_body(""), None);
        assert_eq!(message_from_body("{}"), None);
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = PortalClient::new(&PortalConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn login_url_is_absolute() {
        let client = PortalClient::new(&PortalConfig::new("http://localhost:5038/")).unwrap();
        assert_eq!(client.login_url(), "http://localhost:5038/api/auth/discord/login");
    }

    #[test]
    fn identifiers_are_single_path_segments() {
        let client = PortalClient::new(&PortalConfig::new("http://localhost:5038/")).unwrap();
        let url = client.endpoint(ApiRoutes::WALLETS, &["a/b?c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5038/api/wallets/a%2Fb%3Fc");

        let url = client
            .endpoint(ApiRoutes::ROSTER, &["42", ApiRoutes::NOTES_SEGMENT])
            .unwrap();
        assert_eq!(url.path(), "/api/roster/42/notes");
    }

    async fn against_stub() -> (mock_eid_api::MockApi, PortalClient) {
        let api = mock_eid_api::MockApi::seeded();
        let addr = api.spawn().await.unwrap();
        let client = PortalClient::new(&PortalConfig::new(&format!("http://{addr}"))).unwrap();
        (api, client)
    }

    #[tokio::test]
    async fn identity_fetch_classifies_rejection() {
        let (api, client) = against_stub().await;

        let me = client
            .fetch_identity(&Credential::new(api.issue_token("1").unwrap()))
            .await
            .unwrap();
        assert_eq!(me.username, "ember");

        let err = client.fetch_identity(&Credential::new("garbage")).await.unwrap_err();
        assert!(err.is_unauthorized(), "got {err:?}");
    }

    #[tokio::test]
    async fn exchange_returns_a_usable_credential() {
        let (api, client) = against_stub().await;
        let credential = client.exchange_code(&api.issue_auth_code("2")).await.unwrap();
        assert_eq!(client.fetch_identity(&credential).await.unwrap().username, "ash");

        // codes are single use
        let code = api.issue_auth_code("2");
        client.exchange_code(&code).await.unwrap();
        assert!(client.exchange_code(&code).await.is_err());
    }

    #[tokio::test]
    async fn roster_query_reaches_the_server() {
        let (api, client) = against_stub().await;
        let credential = Credential::new(api.issue_token("1").unwrap());
        let query = RosterQuery {
            tribe: Some(TribeName::new("Fire")),
            search: Some("EMB".to_string()),
            ..RosterQuery::default()
        };

        let members = client.roster(&credential, &query).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username, "ember");
    }

    #[tokio::test]
    async fn member_detail_and_notes() {
        let (api, client) = against_stub().await;
        let credential = Credential::new(api.issue_token("1").unwrap());
        let fire = TribeName::new("Fire");
        let query = MemberQuery {
            tribe: Some(fire.clone()),
            ..MemberQuery::default()
        };

        let ash = client
            .roster_member(&credential, "100000000000000002", &query)
            .await
            .unwrap();
        assert_eq!(ash.username, "ash");
        assert_eq!(ash.audits.unwrap().page, 1);

        let notes = client
            .member_notes(&credential, "100000000000000002", &fire)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);

        match client.roster_member(&credential, "999", &query).await {
            Err(SdkError::Protocol { status: 404, message }) => assert_eq!(message, "Member not found."),
            other => panic!("expected 404, got {other:?}"),
        }
        match client.roster_member(&credential, "100000000000000003", &query).await {
            Err(SdkError::Protocol { status: 403, message }) => {
                assert_eq!(message, "Access Denied: You do not have permission to view this member.");
            }
            other => panic!("expected 403, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_follows_availability() {
        let (api, client) = against_stub().await;
        client.probe().await.unwrap();

        api.set_available(false);
        match client.probe().await {
            Err(SdkError::Protocol { status: 503, .. }) => {}
            other => panic!("expected 503, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PortalClient::new(&PortalConfig::new(&format!("http://{addr}"))).unwrap();
        assert!(client.probe().await.unwrap_err().is_unreachable());
    }
}
