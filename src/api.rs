// HTTP layer: application state, handlers and routing.
//
// Handlers are thin glue translating requests into service calls; errors
// bubble up as `ApiError` and map to status codes in one place.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::accounts::{
    AmountPayload, BankAccount, BankAccountService, CreateBankAccount, UpdateBankAccount,
};
use crate::auth;
use crate::error::ApiError;
use crate::holders::{
    AccountHolder, AccountHolderService, CreateAccountHolder, UpdateAccountHolder,
};
use crate::store::KvStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub holders: AccountHolderService,
    pub accounts: BankAccountService,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn KvStore>, api_token: Option<String>) -> Self {
        AppState {
            holders: AccountHolderService::new(store.clone()),
            accounts: BankAccountService::new(store),
            api_token,
        }
    }
}

// ============================================================================
// Account holder handlers
// ============================================================================

async fn create_holder(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountHolder>,
) -> Result<(StatusCode, Json<AccountHolder>), ApiError> {
    let holder = state.holders.create(payload)?;
    Ok((StatusCode::CREATED, Json(holder)))
}

async fn list_holders(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountHolder>>, ApiError> {
    Ok(Json(state.holders.list()?))
}

async fn get_holder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountHolder>, ApiError> {
    Ok(Json(state.holders.get(&id)?))
}

async fn update_holder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAccountHolder>,
) -> Result<Json<AccountHolder>, ApiError> {
    Ok(Json(state.holders.update(&id, payload)?))
}

async fn delete_holder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.holders.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Bank account handlers
// ============================================================================

async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateBankAccount>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    let account = state.accounts.create(payload)?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    Ok(Json(state.accounts.list()?))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.get(&id)?))
}

async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBankAccount>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.update(&id, payload)?))
}

/// DELETE maps to close: accounts are never hard-deleted.
async fn close_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.close(&id)?))
}

async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AmountPayload>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.deposit(&id, payload.amount)?))
}

async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AmountPayload>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.withdraw(&id, payload.amount)?))
}

async fn block_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.block(&id)?))
}

async fn unblock_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BankAccount>, ApiError> {
    Ok(Json(state.accounts.unblock(&id)?))
}

// ============================================================================
// Unauthenticated endpoints
// ============================================================================

/// GET /health - Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /docs - Static API reference
async fn serve_docs() -> Html<&'static str> {
    Html(include_str!("../web/docs.html"))
}

// ============================================================================
// Router
// ============================================================================

/// Build the full application router. Everything except `/health` and
/// `/docs` sits behind the bearer-token middleware.
pub fn router(state: AppState) -> Router {
    let holder_routes = Router::new()
        .route("/", post(create_holder).get(list_holders))
        .route(
            "/:id",
            get(get_holder).put(update_holder).delete(delete_holder),
        );

    let account_routes = Router::new()
        .route("/", post(create_account).get(list_accounts))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(close_account),
        )
        .route("/:id/deposit", post(deposit))
        .route("/:id/withdraw", post(withdraw))
        .route("/:id/block", post(block_account))
        .route("/:id/unblock", post(unblock_account));

    let protected = Router::new()
        .nest("/accountHolders", holder_routes)
        .nest("/bankAccounts", account_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/docs", get(serve_docs))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
