//! `akari serve` command implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use akari_core::audit::SettlementLog;
use akari_core::config::AkariConfig;
use akari_core::engine::Engine;
use akari_core::{AkariError, PredictionId, RewardId, RewardStatus, Tier, UserId};
use akari_store::{LocalStore, ProfileDirectory};

use crate::auth::{self, ApiKeyConfig};


#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine<LocalStore>>,
    profiles: Arc<ProfileDirectory>,
}

pub async fn run(
    addr: SocketAddr,
    store_dir: PathBuf,
    insecure_demo: bool,
    config: AkariConfig,
) -> Result<()> {
    let admin = auth::admin_key_from_env();
    if admin.api_key.is_none() && !insecure_demo {
        anyhow::bail!(
            "admin endpoints need AKARI_ADMIN_API_KEY; pass --insecure-demo to run without one"
        );
    }
    if admin.api_key.is_none() {
        tracing::warn!("running with admin auth disabled (--insecure-demo)");
    }

    let store = LocalStore::open(store_dir.join("ledger.json"))?;
    let log = SettlementLog::open(store_dir.join("settlements.jsonl"))?;
    let engine = Engine::new(store, config)?.with_settlement_log(log);
    let profiles = ProfileDirectory::load(&store_dir.join("profiles.json"))?;

    let state = AppState {
        engine: Arc::new(engine),
        profiles: Arc::new(profiles),
    };
    let app = build_app(state, admin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "akari listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_app(state: AppState, admin: ApiKeyConfig) -> Router {
    let admin_routes = Router::new()
        .route("/api/v1/predictions/:id/resolve", post(resolve_prediction))
        .route("/api/v1/points", post(apply_points))
        .layer(middleware::from_fn_with_state(admin, auth::require_api_key));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/rewards/claim", post(claim_reward))
        .route("/api/v1/rewards", get(list_rewards))
        .route("/api/v1/leaderboard/:scope", get(leaderboard))
        .merge(admin_routes)
        .with_state(state)
}

/// Map a domain error onto a status code and a `{reason}` body. Callers
/// never see partial success; any error means nothing was written.
fn error_response(err: AkariError) -> Response {
    let status = match &err {
        AkariError::NotFound(_) => StatusCode::NOT_FOUND,
        AkariError::InvalidState(_) => StatusCode::CONFLICT,
        AkariError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        AkariError::Unauthorized => StatusCode::UNAUTHORIZED,
        AkariError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Json(serde_json::json!({ "reason": err.to_string() }));
    (status, body).into_response()
}

async fn blocking<R, F>(op: F) -> Result<R, AkariError>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R, AkariError> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| AkariError::Internal(format!("task failure: {e}")))?
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// Rewards
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ClaimRequest {
    reward_id: u64,
    #[serde(default)]
    ton_wallet: Option<String>,
}

/// All amounts on the wire are raw fixed-point units (1000 = 1).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimResponse {
    burned_myst: u64,
    new_balance: u64,
    required_myst: u64,
    status: RewardStatus,
}

async fn claim_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ClaimRequest>,
) -> Response {
    let user = match auth::caller(&headers) {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let engine = state.engine.clone();
    let result = blocking(move || {
        engine.claim_reward_with_burn(user, RewardId(req.reward_id), req.ton_wallet)
    })
    .await;

    match result {
        Ok(receipt) => Json(ClaimResponse {
            burned_myst: receipt.burned_myst.raw(),
            new_balance: receipt.new_balance.raw(),
            required_myst: receipt.required_myst.raw(),
            status: receipt.status,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentRewardDto {
    reward_id: u64,
    status: RewardStatus,
    required_myst: u64,
    burned_myst: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PastRewardDto {
    reward_id: u64,
    prize_usd_cents: u64,
    burned_myst: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RewardsResponse {
    balance: u64,
    current: Vec<CurrentRewardDto>,
    past: Vec<PastRewardDto>,
}

async fn list_rewards(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match auth::caller(&headers) {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let engine = state.engine.clone();
    let result = blocking(move || engine.rewards_overview(user)).await;

    match result {
        Ok(overview) => Json(RewardsResponse {
            balance: overview.balance.raw(),
            current: overview
                .current
                .into_iter()
                .map(|r| CurrentRewardDto {
                    reward_id: r.id.0,
                    status: r.status,
                    required_myst: r.required_myst.raw(),
                    burned_myst: r.burned_myst.raw(),
                })
                .collect(),
            past: overview
                .past
                .into_iter()
                .map(|r| PastRewardDto {
                    reward_id: r.id.0,
                    prize_usd_cents: r.prize_usd_cents,
                    burned_myst: r.burned_myst.raw(),
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

// =============================================================================
// Predictions (admin)
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ResolveRequest {
    winning_option: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WinnerDto {
    user_id: u64,
    stake: u64,
    payout: u64,
    new_balance: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    winning_option: String,
    pot: u64,
    house_fee: u64,
    payout_pool: u64,
    winners: Vec<WinnerDto>,
}

async fn resolve_prediction(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<ResolveRequest>,
) -> Response {
    let engine = state.engine.clone();
    let result =
        blocking(move || engine.resolve_prediction(PredictionId(id), &req.winning_option)).await;

    match result {
        Ok(report) => Json(ResolveResponse {
            winning_option: report.winning_option,
            pot: report.pot,
            house_fee: report.house_fee,
            payout_pool: report.payout_pool,
            winners: report
                .winners
                .into_iter()
                .map(|w| WinnerDto {
                    user_id: w.user.0,
                    stake: w.stake,
                    payout: w.payout,
                    new_balance: w.new_balance.raw(),
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

// =============================================================================
// Points ledger (admin)
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PointsRequest {
    user_id: u64,
    /// Signed raw points units.
    delta: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PointsResponse {
    new_balance: u64,
    tier: Tier,
}

async fn apply_points(State(state): State<AppState>, Json(req): Json<PointsRequest>) -> Response {
    let engine = state.engine.clone();
    let result = blocking(move || engine.apply_points_delta(UserId(req.user_id), req.delta)).await;

    match result {
        Ok(receipt) => Json(PointsResponse {
            new_balance: receipt.balance.raw(),
            tier: receipt.tier,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

// =============================================================================
// Leaderboards
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardQuery {
    #[serde(default)]
    top: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardRowDto {
    rank: u32,
    user_id: u64,
    completions: u64,
    score: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<String>,
}

async fn leaderboard(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Query(query): Query<BoardQuery>,
) -> Response {
    let engine = state.engine.clone();
    let rows = match blocking(move || engine.compute_leaderboard(&scope, query.top)).await {
        Ok(rows) => rows,
        Err(e) => return error_response(e),
    };

    let participants: Vec<UserId> = rows.iter().map(|r| r.participant).collect();
    let profiles = match state.profiles.batch(&participants) {
        Ok(profiles) => profiles,
        Err(e) => return error_response(e),
    };

    let body: Vec<BoardRowDto> = rows
        .into_iter()
        .map(|row| {
            let profile = profiles.get(&row.participant);
            BoardRowDto {
                rank: row.rank,
                user_id: row.participant.0,
                completions: row.completions,
                score: row.score.raw(),
                display_name: profile.map(|p| p.display_name.clone()),
                handle: profile.and_then(|p| p.handle.clone()),
            }
        })
        .collect();

    Json(body).into_response()
}
