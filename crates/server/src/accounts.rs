//! Accounts API endpoints

use api_types::account::{
    AccountKind as ApiKind, AccountNew, AccountView, AccountsResponse, BalanceResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_kind(kind: engine::AccountKind) -> ApiKind {
    match kind {
        engine::AccountKind::Checking => ApiKind::Checking,
        engine::AccountKind::Savings => ApiKind::Savings,
        engine::AccountKind::Business => ApiKind::Business,
    }
}

fn map_account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        account_number: account.account_number,
        kind: map_kind(account.kind),
        balance_cents: account.balance.cents(),
        available_balance_cents: account.available_balance.cents(),
        status: account.status.as_str().to_string(),
        is_primary: account.is_primary,
        created_at: account.created_at,
    }
}

/// Handle requests for opening a new account.
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let kind = match payload.kind.unwrap_or_default() {
        ApiKind::Checking => engine::AccountKind::Checking,
        ApiKind::Savings => engine::AccountKind::Savings,
        ApiKind::Business => engine::AccountKind::Business,
    };

    let account = state
        .engine
        .new_account(&user.username, kind, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(map_account(account))))
}

/// Handle requests for listing the caller's accounts.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state.engine.accounts(&user.username).await?;

    Ok(Json(AccountsResponse {
        accounts: accounts.into_iter().map(map_account).collect(),
    }))
}

/// Handle requests for one account's balances.
pub async fn balance(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let account = state.engine.account(&user.username, account_id).await?;

    Ok(Json(BalanceResponse {
        account_id: account.id,
        balance_cents: account.balance.cents(),
        available_balance_cents: account.available_balance.cents(),
    }))
}
