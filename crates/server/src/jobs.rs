//! Manual job triggers

use api_types::jobs::RunReport;
use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

/// Handle requests for running the recurring due-scan right now.
pub async fn run_due(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<RunReport>, ServerError> {
    let now = Utc::now();
    let report = state.engine.process_due_recurring(now.date_naive(), now).await?;

    Ok(Json(RunReport {
        processed: report.processed,
        failed: report.failed,
        total: report.total,
    }))
}
