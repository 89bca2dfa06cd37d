//! The transaction processor: drives the status state machine and mutates
//! account balances.
//!
//! State machine: `pending -> processing -> {completed | failed}`, with
//! `pending | processing -> cancelled` via an explicit cancel request.
//!
//! All writes for one processing attempt (balance mutation, status updates,
//! log entries) commit in a single database transaction. Debits serialize on
//! the account row through a guarded `UPDATE ... WHERE available_balance >= ?`
//! compare-and-update, so two concurrent debits can never both spend the same
//! available balance.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, Statement, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, Movement, ResultEngine, Transaction, TransactionLog,
    TransactionStatus, transaction_logs, transaction_logs::SYSTEM_ACTOR, transactions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Processes a pending transaction to a terminal state.
    ///
    /// Returns the transaction with its final status: `completed` on success,
    /// `failed` (with `failure_reason`) on a business-rule failure such as
    /// insufficient funds. Only `pending` transactions are accepted; anything
    /// else is rejected with [`EngineError::InvalidStatus`], which makes
    /// processing the same transaction twice a no-op instead of a double
    /// debit.
    ///
    /// On a database failure the unit rolls back, a best-effort second write
    /// marks the transaction `failed` with the error text, and the error
    /// propagates to the caller.
    pub async fn process_transaction(
        &self,
        transaction_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let result = with_tx!(self, |db_tx| {
            self.process_in_tx(&db_tx, transaction_id, now).await
        });

        match result {
            Err(EngineError::Database(err)) => {
                tracing::error!(%transaction_id, "transaction processing aborted: {err}");
                self.mark_failed_after_abort(transaction_id, &err.to_string(), now)
                    .await;
                Err(EngineError::Database(err))
            }
            other => other,
        }
    }

    async fn process_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let mut tx = self.require_transaction(db_tx, transaction_id).await?;
        if tx.status != TransactionStatus::Pending {
            return Err(EngineError::InvalidStatus(format!(
                "cannot process a {} transaction",
                tx.status.as_str()
            )));
        }

        self.record_transition(
            db_tx,
            &mut tx,
            TransactionStatus::Processing,
            "Transaction processing started",
            now,
        )
        .await?;

        match Movement::from(&tx) {
            Movement::Debit(total) => {
                if !self.try_debit_account(db_tx, tx.account_id, total).await? {
                    tx.failure_reason = Some("Insufficient funds".to_string());
                    self.record_transition(
                        db_tx,
                        &mut tx,
                        TransactionStatus::Failed,
                        "Transaction failed: Insufficient funds",
                        now,
                    )
                    .await?;
                    // The failed status still commits; only the debit is
                    // withheld.
                    return Ok(tx);
                }
            }
            Movement::Credit(net) => {
                self.credit_account(db_tx, tx.account_id, net).await?;
            }
        }

        tx.processed_at = Some(now);
        self.record_transition(
            db_tx,
            &mut tx,
            TransactionStatus::Completed,
            "Transaction completed successfully",
            now,
        )
        .await?;

        Ok(tx)
    }

    /// Sets a new status and writes the matching log entry in one step.
    ///
    /// Every status assignment in the engine goes through here (or the
    /// creation path), so the audit trail can never miss a transition.
    pub(super) async fn record_transition(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &mut Transaction,
        new_status: TransactionStatus,
        message: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let log = TransactionLog::new(
            tx.id,
            Some(tx.status),
            new_status,
            message.to_string(),
            SYSTEM_ACTOR.to_string(),
            now,
        );
        transaction_logs::ActiveModel::from(&log).insert(db_tx).await?;

        tx.status = new_status;
        let update = transactions::ActiveModel {
            id: ActiveValue::Set(tx.id.to_string()),
            status: ActiveValue::Set(new_status.as_str().to_string()),
            processed_at: ActiveValue::Set(tx.processed_at),
            failure_reason: ActiveValue::Set(tx.failure_reason.clone()),
            ..Default::default()
        };
        update.update(db_tx).await?;
        Ok(())
    }

    /// Debits `total` from the account iff it is active and has enough
    /// available balance.
    ///
    /// The check and the mutation are a single conditional `UPDATE`, so
    /// concurrent debits against the same account serialize at the database
    /// row and lost updates are impossible.
    async fn try_debit_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        total: MoneyCents,
    ) -> ResultEngine<bool> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "UPDATE accounts \
             SET balance = balance - ?, available_balance = available_balance - ? \
             WHERE id = ? AND status = 'active' AND available_balance >= ?",
            [
                total.cents().into(),
                total.cents().into(),
                account_id.to_string().into(),
                total.cents().into(),
            ],
        );
        let result = db_tx.execute(stmt).await?;
        Ok(result.rows_affected() == 1)
    }

    /// Credits `net` to the account. Credits have no upper bound.
    async fn credit_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        net: MoneyCents,
    ) -> ResultEngine<()> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "UPDATE accounts \
             SET balance = balance + ?, available_balance = available_balance + ? \
             WHERE id = ?",
            [
                net.cents().into(),
                net.cents().into(),
                account_id.to_string().into(),
            ],
        );
        let result = db_tx.execute(stmt).await?;
        if result.rows_affected() != 1 {
            return Err(EngineError::KeyNotFound("account not exists".to_string()));
        }
        Ok(())
    }

    /// Best-effort terminal write after a rolled-back processing attempt.
    ///
    /// Leaves the transaction `failed` instead of stranded in `processing`;
    /// if even this write fails the transaction is still `pending` and safely
    /// retryable.
    async fn mark_failed_after_abort(
        &self,
        transaction_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        // The unit rolled back, so the row's status is whatever was last
        // committed (normally `pending`). Read it so the log entry records
        // the real prior status.
        let prior = match self.require_transaction(&self.database, transaction_id).await {
            Ok(tx) => tx.status,
            Err(err) => {
                tracing::warn!(%transaction_id, "could not reload aborted transaction: {err}");
                return;
            }
        };

        let update = transactions::ActiveModel {
            id: ActiveValue::Set(transaction_id.to_string()),
            status: ActiveValue::Set(TransactionStatus::Failed.as_str().to_string()),
            failure_reason: ActiveValue::Set(Some(reason.to_string())),
            ..Default::default()
        };
        if let Err(err) = update.update(&self.database).await {
            tracing::warn!(%transaction_id, "could not record failure status: {err}");
            return;
        }

        let log = TransactionLog::new(
            transaction_id,
            Some(prior),
            TransactionStatus::Failed,
            format!("Transaction failed: {reason}"),
            SYSTEM_ACTOR.to_string(),
            now,
        );
        if let Err(err) = transaction_logs::ActiveModel::from(&log)
            .insert(&self.database)
            .await
        {
            tracing::warn!(%transaction_id, "could not record failure log: {err}");
        }
    }
}
