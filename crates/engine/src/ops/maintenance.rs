//! Housekeeping operations, driven by the periodic job runner.

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{
    ResultEngine, Transaction, TransactionStatus, transaction_logs, transactions,
};

use super::{Engine, with_tx};

/// Counters for one failed-transaction retry run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RetryReport {
    pub retried: u64,
    pub total: u64,
}

impl Engine {
    /// Deletes log entries older than `cutoff`.
    ///
    /// The trail is append-only while it lives; pruning is the only delete
    /// the engine ever performs. Returns the number of deleted entries.
    pub async fn prune_logs(&self, cutoff: DateTime<Utc>) -> ResultEngine<u64> {
        let result = transaction_logs::Entity::delete_many()
            .filter(transaction_logs::Column::CreatedAt.lt(cutoff))
            .exec(&self.database)
            .await?;
        tracing::info!(deleted = result.rows_affected, "pruned transaction logs");
        Ok(result.rows_affected)
    }

    /// Re-runs transactions that failed since `since` for a temporary reason.
    ///
    /// Each candidate is reset to `pending` (with a log entry) and pushed
    /// through the processor again. Counts how many completed on retry.
    pub async fn retry_failed_transactions(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ResultEngine<RetryReport> {
        let candidates = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Failed.as_str()))
            .filter(transactions::Column::CreatedAt.gte(since))
            .filter(transactions::Column::FailureReason.contains("temporary"))
            .all(&self.database)
            .await?;

        let mut report = RetryReport {
            total: candidates.len() as u64,
            ..Default::default()
        };

        for model in candidates {
            let row_id = model.id.clone();
            let tx = match Transaction::try_from(model) {
                Ok(tx) => tx,
                Err(err) => {
                    tracing::warn!(transaction_id = %row_id, "skipping undecodable row: {err}");
                    continue;
                }
            };
            if let Err(err) = self.requeue_transaction(&tx, now).await {
                tracing::warn!(transaction_id = %tx.id, "could not requeue transaction: {err}");
                continue;
            }
            match self.process_transaction(tx.id, now).await {
                Ok(processed) if processed.status == TransactionStatus::Completed => {
                    report.retried += 1;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(transaction_id = %tx.id, "retry errored: {err}");
                }
            }
        }

        Ok(report)
    }

    /// Resolves transactions stranded in `processing` before `cutoff`.
    ///
    /// A crash between the `processing` write and the terminal write leaves a
    /// transaction the due-scan will never revisit; this marks such rows
    /// `failed` ("Processing timed out") so the ledger carries no ambiguous
    /// in-flight state. Returns the number of recovered transactions.
    pub async fn recover_stuck_transactions(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ResultEngine<u64> {
        let stuck = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Processing.as_str()))
            .filter(transactions::Column::CreatedAt.lt(cutoff))
            .all(&self.database)
            .await?;

        let mut recovered = 0u64;
        for model in stuck {
            let row_id = model.id.clone();
            let mut tx = match Transaction::try_from(model) {
                Ok(tx) => tx,
                Err(err) => {
                    tracing::warn!(transaction_id = %row_id, "skipping undecodable row: {err}");
                    continue;
                }
            };
            let result: ResultEngine<()> = with_tx!(self, |db_tx| {
                tx.failure_reason = Some("Processing timed out".to_string());
                self.record_transition(
                    &db_tx,
                    &mut tx,
                    TransactionStatus::Failed,
                    "Transaction failed: Processing timed out",
                    now,
                )
                .await
            });
            match result {
                Ok(()) => recovered += 1,
                Err(err) => {
                    tracing::warn!(transaction_id = %tx.id, "could not recover transaction: {err}");
                }
            }
        }

        if recovered > 0 {
            tracing::info!(recovered, "recovered stuck transactions");
        }
        Ok(recovered)
    }

    /// Moves a failed transaction back to `pending` with a log entry.
    async fn requeue_transaction(&self, tx: &Transaction, now: DateTime<Utc>) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut tx = tx.clone();
            tx.failure_reason = None;
            self.record_transition(
                &db_tx,
                &mut tx,
                TransactionStatus::Pending,
                "Transaction requeued for retry",
                now,
            )
            .await
        })
    }
}
