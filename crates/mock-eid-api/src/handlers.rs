//! Route handlers.

use axum::extract::{Json, Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use chrono::Utc;
use eid_models::{
    ApiMessage, AuditPage, ExchangeRequest, ExchangeResponse, Identity, LinkedWallet, MemberNote,
    NonceRequest, NonceResponse, RosterMember, RosterSort, RosterWallet, SortOrder, TribeName,
    VerifyRequest, VoiceAccountCredentials, VoiceAccountStatus, WalletId, DEFAULT_AUDIT_PER_PAGE,
    MAX_AUDIT_PER_PAGE,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{issue_token, AuthUser};
use crate::error::ApiError;
use crate::state::{MockData, PendingNonce, RemovedWallet, SharedState};

/// Network label recorded on wallets the stub links.
const LINK_NETWORK: &str = "testnet";

// ---------------------------------------------------------------------------
// Liveness and login
// ---------------------------------------------------------------------------

/// `GET /docs`: liveness target.
pub(crate) async fn docs(State(state): State<SharedState>) -> Result<&'static str, ApiError> {
    if state.data().unavailable {
        return Err(ApiError::Unavailable);
    }
    Ok("Stub API OK")
}

/// `GET /api/auth/discord/login`: there is no provider behind the stub.
pub(crate) async fn discord_login() -> &'static str {
    "Use /api/auth/stub-login?user_id=1 for testing"
}

#[derive(Deserialize)]
pub(crate) struct StubLoginParams {
    user_id: String,
}

/// `GET /api/auth/stub-login?user_id=…`: log in as any seeded user.
pub(crate) async fn stub_login(
    State(state): State<SharedState>,
    Query(params): Query<StubLoginParams>,
) -> Result<Redirect, ApiError> {
    let code = {
        let mut data = state.data();
        if !data.users.contains_key(&params.user_id) {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        let code = Uuid::new_v4().to_string();
        data.auth_codes.insert(code.clone(), params.user_id.clone());
        code
    };

    info!(user_id = %params.user_id, "stub login");
    Ok(Redirect::to(&format!(
        "{}/auth/callback?code={code}",
        state.frontend_url
    )))
}

/// `POST /api/auth/exchange`: trade a one-time code for a token.
pub(crate) async fn exchange(
    State(state): State<SharedState>,
    Json(req): Json<ExchangeRequest>,
) -> Result<Json<ExchangeResponse>, ApiError> {
    let user = {
        let mut data = state.data();
        let user_id = data
            .auth_codes
            .remove(&req.code)
            .ok_or_else(|| ApiError::BadRequestText("Invalid or expired code".to_string()))?;
        data.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ApiError::BadRequestText("Invalid or expired code".to_string()))?
    };

    let token = issue_token(&state.jwt_secret, &user.id, &user.username)?;
    Ok(Json(ExchangeResponse { token }))
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

fn current_user(state: &SharedState, auth: &AuthUser) -> Result<Identity, ApiError> {
    state
        .data()
        .users
        .get(&auth.user_id)
        .cloned()
        .ok_or(ApiError::Unauthorized("User not found"))
}

/// `GET /api/me`.
pub(crate) async fn me(State(state): State<SharedState>, auth: AuthUser) -> Result<Json<Identity>, ApiError> {
    current_user(&state, &auth).map(Json)
}

// ---------------------------------------------------------------------------
// Wallets
// ---------------------------------------------------------------------------

/// `POST /api/wallets/link-nonce`.
pub(crate) async fn link_nonce(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<NonceRequest>,
) -> Json<NonceResponse> {
    let mut data = state.data();
    data.nonce_requests += 1;
    let nonce = data
        .next_nonce
        .take()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    data.nonces.insert(
        req.address.as_str().to_lowercase(),
        PendingNonce {
            user_id: auth.user_id,
            nonce: nonce.clone(),
        },
    );
    Json(NonceResponse { nonce })
}

/// `POST /api/wallets/link-verify`.
///
/// Any non-empty signature is accepted unless signatures are switched to
/// rejecting. Errors are plain text, like the real backend's.
pub(crate) async fn link_verify(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let mut data = state.data();
    data.verify_requests.push(req.clone());

    let key = req.address.as_str().to_lowercase();
    match data.nonces.remove(&key) {
        Some(pending) if pending.user_id == auth.user_id && !pending.nonce.is_empty() => {}
        _ => return Err(ApiError::BadRequestText("Nonce invalid or expired".to_string())),
    }

    if data.reject_signatures || req.signature.trim().is_empty() {
        return Err(ApiError::BadRequestText(
            "Signature verification failed".to_string(),
        ));
    }

    if data.address_linked(req.address.as_str()) {
        return Err(ApiError::BadRequestText("Wallet already linked".to_string()));
    }

    let restored = data.removed_wallets.iter().position(|r| {
        r.user_id == auth.user_id && r.wallet.address.as_str().eq_ignore_ascii_case(req.address.as_str())
    });
    let (wallet, message) = match restored {
        Some(index) => {
            let mut wallet = data.removed_wallets.remove(index).wallet;
            wallet.verified_at = Utc::now();
            (wallet, "Wallet re-linked successfully")
        }
        None => (
            LinkedWallet {
                id: WalletId::new(&Uuid::new_v4().to_string()),
                address: req.address.clone(),
                verified_at: Utc::now(),
                network: Some(LINK_NETWORK.to_string()),
                tribes: Vec::new(),
            },
            "Wallet linked successfully",
        ),
    };

    let user = data
        .users
        .get_mut(&auth.user_id)
        .ok_or(ApiError::Unauthorized("User not found"))?;
    info!(user_id = %auth.user_id, address = %wallet.address, "wallet linked");
    let details = format!("Linked wallet {}", wallet.address);
    user.wallets.push(wallet);
    data.record_audit("WALLET_LINK", &auth.user_id, None, details);

    Ok(Json(ApiMessage::message(message)))
}

/// `DELETE /api/wallets/{id}`.
pub(crate) async fn unlink_wallet(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiMessage>, ApiError> {
    let id = WalletId::new(&id);
    let mut data = state.data();
    let user = data
        .users
        .get_mut(&auth.user_id)
        .ok_or(ApiError::Unauthorized("User not found"))?;

    let index = user
        .wallets
        .iter()
        .position(|w| w.id == id)
        .ok_or_else(|| ApiError::NotFound("Wallet not found or not owned by user".to_string()))?;
    let wallet = user.wallets.remove(index);

    info!(user_id = %auth.user_id, wallet = %id, "wallet unlinked");
    data.record_audit(
        "WALLET_UNLINK",
        &auth.user_id,
        None,
        format!("Unlinked wallet {}", wallet.address),
    );
    data.removed_wallets.push(RemovedWallet {
        user_id: auth.user_id,
        wallet,
        deleted_at: Utc::now(),
    });
    Ok(Json(ApiMessage::message("Unlinked")))
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// `GET /api/mumble/status`.
pub(crate) async fn mumble_status(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Json<VoiceAccountStatus> {
    let username = state.data().voice_accounts.get(&auth.user_id).cloned();
    Json(VoiceAccountStatus { username })
}

/// `POST /api/mumble/account`: create the account or reset its password.
pub(crate) async fn mumble_account(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<VoiceAccountCredentials>, ApiError> {
    let user = current_user(&state, &auth)?;
    if !user.tribes.contains(&state.voice_tribe) {
        return Err(ApiError::Forbidden("User not in required tribe".to_string()));
    }

    let username = state
        .data()
        .voice_accounts
        .entry(auth.user_id)
        .or_insert(user.username)
        .clone();
    let password = Uuid::new_v4().simple().to_string()[..16].to_string();

    Ok(Json(VoiceAccountCredentials { username, password }))
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct RosterParams {
    tribe: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

/// The tribe an admin request is scoped to. A caller who administers a
/// single tribe may leave it out.
fn admin_tribe(caller: &Identity, requested: Option<&str>) -> Result<TribeName, ApiError> {
    if !caller.can_view_roster() {
        return Err(ApiError::Forbidden(
            "Access denied: Admin privileges required".to_string(),
        ));
    }

    let tribe = match requested.filter(|t| !t.is_empty()) {
        Some(t) => TribeName::new(t),
        None => match caller.admin_tribes.as_slice() {
            [only] => only.clone(),
            _ => return Err(ApiError::BadRequest("Tribe parameter required".to_string())),
        },
    };
    if !caller.is_admin && !caller.admin_tribes.contains(&tribe) {
        return Err(ApiError::Forbidden(
            "Access denied: Not an admin of this tribe".to_string(),
        ));
    }
    Ok(tribe)
}

/// Active wallets followed by the ones the user unlinked.
fn roster_wallets(data: &MockData, user: &Identity) -> Vec<RosterWallet> {
    let active = user.wallets.iter().map(|w| RosterWallet {
        id: w.id.clone(),
        address: w.address.clone(),
        deleted_at: None,
        tribes: w.tribes.clone(),
    });
    let removed = data
        .removed_wallets
        .iter()
        .filter(|r| r.user_id == user.id)
        .map(|r| RosterWallet {
            id: r.wallet.id.clone(),
            address: r.wallet.address.clone(),
            deleted_at: Some(r.deleted_at),
            tribes: r.wallet.tribes.clone(),
        });
    active.chain(removed).collect()
}

/// `GET /api/roster`: members of one tribe, for admins of that tribe.
pub(crate) async fn roster(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(params): Query<RosterParams>,
) -> Result<Json<Vec<RosterMember>>, ApiError> {
    let caller = current_user(&state, &auth)?;
    let tribe = admin_tribe(&caller, params.tribe.as_deref())?;

    let sort = params
        .sort
        .as_deref()
        .map(RosterSort::parse_keyword)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .unwrap_or_default();
    let order = params
        .order
        .as_deref()
        .map(SortOrder::parse_keyword)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
        .unwrap_or_default();
    let search = params
        .search
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty());

    let data = state.data();
    let mut members: Vec<RosterMember> = data
        .users
        .values()
        .filter(|u| u.tribes.contains(&tribe))
        .filter(|u| {
            search.as_deref().is_none_or(|s| {
                u.username.to_lowercase().contains(s) || u.discord_id.contains(s)
            })
        })
        .map(|u| RosterMember {
            discord_id: u.discord_id.clone(),
            username: u.username.clone(),
            avatar: u.avatar.clone(),
            last_login_at: u.last_login_at,
            wallets: roster_wallets(&data, u),
            audits: None,
        })
        .collect();

    members.sort_by(|a, b| {
        let ordering = match sort {
            RosterSort::Username => a.username.to_lowercase().cmp(&b.username.to_lowercase()),
            RosterSort::WalletCount => a.active_wallets().count().cmp(&b.active_wallets().count()),
            RosterSort::LastLogin => a.last_login_at.cmp(&b.last_login_at),
        };
        let ordering = ordering.then_with(|| a.discord_id.cmp(&b.discord_id));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    Ok(Json(members))
}

#[derive(Deserialize)]
pub(crate) struct MemberParams {
    tribe: Option<String>,
    audit_page: Option<u32>,
    audit_per_page: Option<u32>,
}

/// `GET /api/roster/{discord_id}`: one member of the caller's tribe, with a
/// page of their audit trail. Viewing someone else is itself audited.
pub(crate) async fn roster_member(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(discord_id): Path<String>,
    Query(params): Query<MemberParams>,
) -> Result<Json<RosterMember>, ApiError> {
    let caller = current_user(&state, &auth)?;
    let tribe = admin_tribe(&caller, params.tribe.as_deref())?;

    let mut data = state.data();
    let member = data
        .user_by_discord_id(&discord_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;
    if !member.tribes.contains(&tribe) {
        return Err(ApiError::Forbidden(
            "Access denied: Member is not in the specified tribe".to_string(),
        ));
    }

    let page = params.audit_page.unwrap_or(1).max(1);
    let per_page = params
        .audit_per_page
        .unwrap_or(DEFAULT_AUDIT_PER_PAGE)
        .clamp(1, MAX_AUDIT_PER_PAGE);

    // Targeted at the member, or things the member did to themselves.
    let mut trail: Vec<_> = data
        .audits
        .iter()
        .rev()
        .filter(|a| match &a.target_id {
            Some(target) => *target == member.id,
            None => a.actor_id == member.id,
        })
        .cloned()
        .collect();
    trail.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = trail.len() as u64;
    let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
    let take = usize::try_from(per_page).unwrap_or(usize::MAX);
    let items = trail.into_iter().skip(skip).take(take).collect();
    let total_pages = u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);

    let view = RosterMember {
        discord_id: member.discord_id.clone(),
        username: member.username.clone(),
        avatar: member.avatar.clone(),
        last_login_at: member.last_login_at,
        wallets: roster_wallets(&data, &member),
        audits: Some(AuditPage {
            items,
            total,
            page,
            per_page,
            total_pages,
        }),
    };

    if caller.id != member.id {
        data.record_audit(
            "VIEW_MEMBER",
            &caller.id,
            Some(&member.id),
            format!("Viewed member {} ({})", member.username, member.discord_id),
        );
    }
    Ok(Json(view))
}

#[derive(Deserialize)]
pub(crate) struct NotesParams {
    tribe: Option<String>,
}

/// `GET /api/roster/{discord_id}/notes`: notes on a member within the
/// caller's tribe, newest first.
pub(crate) async fn member_notes(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(discord_id): Path<String>,
    Query(params): Query<NotesParams>,
) -> Result<Json<Vec<MemberNote>>, ApiError> {
    let caller = current_user(&state, &auth)?;
    let tribe = admin_tribe(&caller, params.tribe.as_deref())?;

    let data = state.data();
    let target = data
        .user_by_discord_id(&discord_id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut notes: Vec<MemberNote> = data
        .notes
        .iter()
        .filter(|n| n.target_user_id == target.id && n.tribe == tribe)
        .cloned()
        .collect();
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(notes))
}

/// Fallback for unknown routes.
pub(crate) async fn not_found() -> impl IntoResponse {
    ApiError::NotFound("Not found".to_string())
}
