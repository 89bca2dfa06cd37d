//! Transactions API endpoints

use api_types::transaction::{
    TransactionCancel, TransactionCancelled, TransactionList, TransactionListResponse,
    TransactionLogView, TransactionLogsResponse, TransactionNew, TransactionNewKind,
    TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{MoneyCents, TransactionCategory, TransactionStatus, TransferNew};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

/// Per-transaction hard cap: $100,000.00.
const MAX_AMOUNT: MoneyCents = MoneyCents::new(10_000_000);

pub(crate) fn validate_amount(cents: i64) -> Result<MoneyCents, ServerError> {
    if cents <= 0 {
        return Err(ServerError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    if cents > MAX_AMOUNT.cents() {
        return Err(ServerError::Validation(format!(
            "amount exceeds the {MAX_AMOUNT} limit"
        )));
    }
    Ok(MoneyCents::new(cents))
}

pub(crate) fn validate_recipient(number: Option<&str>) -> Result<(), ServerError> {
    if let Some(number) = number {
        if !engine::validate_account_number(number) {
            return Err(ServerError::Validation(
                "recipient account number must be ACC followed by 8 digits".to_string(),
            ));
        }
    }
    Ok(())
}

pub(crate) fn parse_category(
    category: Option<&str>,
    default: TransactionCategory,
) -> Result<TransactionCategory, ServerError> {
    match category {
        Some(raw) => Ok(TransactionCategory::try_from(raw)?),
        None => Ok(default),
    }
}

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        reference: tx.reference,
        account_id: tx.account_id,
        amount_cents: tx.amount.cents(),
        fee_cents: tx.fee_amount.cents(),
        kind: tx.kind.as_str().to_string(),
        status: tx.status.as_str().to_string(),
        category: tx.category.as_str().to_string(),
        description: tx.description,
        recipient_account_number: tx.recipient_account_number,
        recipient_name: tx.recipient_name,
        processed_at: tx.processed_at,
        failure_reason: tx.failure_reason,
        external_reference: tx.external_reference,
        created_at: tx.created_at,
    }
}

/// Handle requests for creating a transaction.
///
/// The transaction is created and run through the processor in one request;
/// the response carries its final state (`completed` or `failed`). A failed
/// transaction is still a 201: the resource exists, its status tells the
/// story.
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let amount = validate_amount(payload.amount_cents)?;
    validate_recipient(payload.recipient_account_number.as_deref())?;
    let now = Utc::now();

    let engine = &state.engine;
    let tx = match payload.kind {
        TransactionNewKind::Transfer => {
            let category = parse_category(
                payload.category.as_deref(),
                TransactionCategory::Transfer,
            )?;
            engine
                .create_transfer(
                    &user.username,
                    TransferNew {
                        account_id: payload.account_id,
                        amount,
                        description: payload.description,
                        category,
                        recipient_account_number: payload.recipient_account_number,
                        recipient_name: payload.recipient_name,
                    },
                    now,
                )
                .await?
        }
        TransactionNewKind::Deposit => {
            engine
                .create_deposit(
                    &user.username,
                    payload.account_id,
                    amount,
                    &payload.description,
                    payload.external_reference.as_deref(),
                    now,
                )
                .await?
        }
        TransactionNewKind::Withdrawal => {
            engine
                .create_withdrawal(
                    &user.username,
                    payload.account_id,
                    amount,
                    &payload.description,
                    now,
                )
                .await?
        }
    };

    let processed = engine.process_transaction(tx.id, now).await?;
    Ok((StatusCode::CREATED, Json(map_transaction(processed))))
}

/// Handle requests for listing an account's transactions.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let status = payload
        .status
        .as_deref()
        .map(TransactionStatus::try_from)
        .transpose()?;
    let limit = payload.limit.unwrap_or(50);

    let transactions = state
        .engine
        .transactions(&user.username, payload.account_id, status, limit)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(map_transaction).collect(),
    }))
}

/// Handle requests for one transaction.
pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .transaction(&user.username, transaction_id)
        .await?;
    Ok(Json(map_transaction(tx)))
}

/// Handle requests for cancelling a transaction.
pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    payload: Option<Json<TransactionCancel>>,
) -> Result<Json<TransactionCancelled>, ServerError> {
    let reason = payload.and_then(|Json(p)| p.reason);

    let cancelled = state
        .engine
        .cancel_transaction(
            &user.username,
            transaction_id,
            reason.as_deref(),
            Utc::now(),
        )
        .await?;
    let tx = state
        .engine
        .transaction(&user.username, transaction_id)
        .await?;

    Ok(Json(TransactionCancelled {
        cancelled,
        transaction: map_transaction(tx),
    }))
}

/// Handle requests for a transaction's audit trail.
pub async fn logs(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionLogsResponse>, ServerError> {
    let logs = state
        .engine
        .transaction_logs(&user.username, transaction_id)
        .await?;

    Ok(Json(TransactionLogsResponse {
        logs: logs
            .into_iter()
            .map(|log| TransactionLogView {
                previous_status: log.previous_status,
                new_status: log.new_status.as_str().to_string(),
                message: log.message,
                processed_by: log.processed_by,
                created_at: log.created_at,
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_bounds() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(10_000_000).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-500).is_err());
        assert!(validate_amount(10_000_001).is_err());
    }

    #[test]
    fn recipient_format() {
        assert!(validate_recipient(None).is_ok());
        assert!(validate_recipient(Some("ACC12345678")).is_ok());
        assert!(validate_recipient(Some("12345678")).is_err());
        assert!(validate_recipient(Some("ACC1234")).is_err());
    }
}
