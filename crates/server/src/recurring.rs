//! Recurring transactions API endpoints

use api_types::recurring::{
    Frequency as ApiFrequency, RecurringListResponse, RecurringNew, RecurringView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::TransactionCategory;
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    transactions::{validate_amount, validate_recipient},
    user,
};

fn map_frequency(frequency: engine::Frequency) -> ApiFrequency {
    match frequency {
        engine::Frequency::Daily => ApiFrequency::Daily,
        engine::Frequency::Weekly => ApiFrequency::Weekly,
        engine::Frequency::Monthly => ApiFrequency::Monthly,
        engine::Frequency::Quarterly => ApiFrequency::Quarterly,
        engine::Frequency::Yearly => ApiFrequency::Yearly,
    }
}

fn map_recurring(def: engine::RecurringTransaction) -> RecurringView {
    RecurringView {
        id: def.id,
        account_id: def.account_id,
        amount_cents: def.amount.cents(),
        description: def.description,
        category: def.category.as_str().to_string(),
        frequency: map_frequency(def.frequency),
        start_date: def.start_date,
        end_date: def.end_date,
        next_execution_date: def.next_execution_date,
        status: def.status.as_str().to_string(),
        execution_count: def.execution_count,
        max_executions: def.max_executions,
    }
}

/// Handle requests for creating a recurring definition.
pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RecurringNew>,
) -> Result<(StatusCode, Json<RecurringView>), ServerError> {
    let amount = validate_amount(payload.amount_cents)?;
    validate_recipient(payload.recipient_account_number.as_deref())?;
    let category = match payload.category.as_deref() {
        Some(raw) => TransactionCategory::try_from(raw)?,
        None => TransactionCategory::Transfer,
    };
    let frequency = engine::Frequency::try_from(payload.frequency.as_str())?;

    let def = state
        .engine
        .new_recurring(
            &user.username,
            engine::RecurringNew {
                account_id: payload.account_id,
                amount,
                description: payload.description,
                category,
                recipient_account_number: payload.recipient_account_number,
                recipient_name: payload.recipient_name,
                frequency,
                start_date: payload.start_date,
                end_date: payload.end_date,
                max_executions: payload.max_executions,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_recurring(def))))
}

/// Handle requests for listing the caller's recurring definitions.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<RecurringListResponse>, ServerError> {
    let defs = state.engine.recurring_transactions(&user.username).await?;

    Ok(Json(RecurringListResponse {
        recurring: defs.into_iter().map(map_recurring).collect(),
    }))
}

/// Handle requests for pausing a recurring definition.
pub async fn pause(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(recurring_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.pause_recurring(&user.username, recurring_id).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Handle requests for resuming a paused recurring definition.
pub async fn resume(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(recurring_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.resume_recurring(&user.username, recurring_id).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Handle requests for cancelling a recurring definition.
pub async fn cancel(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(recurring_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.cancel_recurring(&user.username, recurring_id).await?;
    Ok(StatusCode::ACCEPTED)
}
