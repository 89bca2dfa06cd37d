//! The recurring transaction scheduler.
//!
//! Definitions are turned into concrete transactions through the same
//! processor path as ad-hoc transfers. A definition only advances
//! (`execution_count`, `next_execution_date`) after a successful execution;
//! a failed run leaves it untouched so the next scan retries it.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    AccountStatus, EngineError, Frequency, MoneyCents, RecurringStatus, RecurringTransaction,
    ResultEngine, Transaction, TransactionCategory, TransactionStatus, accounts, recurring,
    recurring::advance_date,
};

use super::{
    Engine, normalize_optional_text, normalize_required_text, transactions_ops::TransferNew,
    with_tx,
};

/// Result of executing one recurring definition.
#[derive(Clone, Debug)]
pub enum RecurringOutcome {
    /// The spawned transaction completed and the schedule advanced.
    Executed { transaction: Transaction },
    /// The spawned transaction ended `failed`; the schedule did not advance.
    Failed { transaction: Transaction },
    /// The definition was not due (or not executable); nothing was created.
    NotDue,
}

/// Counters for one due-scan run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
}

/// Parameters for creating a recurring definition.
#[derive(Clone, Debug)]
pub struct RecurringNew {
    pub account_id: Uuid,
    pub amount: MoneyCents,
    pub description: String,
    pub category: TransactionCategory,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_executions: Option<u32>,
}

impl Engine {
    /// Creates a recurring definition; first execution is due at `start_date`.
    pub async fn new_recurring(
        &self,
        owner: &str,
        recurring: RecurringNew,
        now: DateTime<Utc>,
    ) -> ResultEngine<RecurringTransaction> {
        let description = normalize_required_text(&recurring.description, "description")?;

        with_tx!(self, |db_tx| {
            let account = self
                .require_account(&db_tx, owner, recurring.account_id)
                .await?;
            if account.status == AccountStatus::Closed {
                return Err(EngineError::InvalidStatus(
                    "account is closed".to_string(),
                ));
            }

            let mut def = RecurringTransaction::new(
                account.id,
                recurring.amount,
                description,
                recurring.category,
                recurring.frequency,
                recurring.start_date,
                recurring.end_date,
                recurring.max_executions,
                now,
            )?;
            def.recipient_account_number =
                normalize_optional_text(recurring.recipient_account_number.as_deref());
            def.recipient_name = normalize_optional_text(recurring.recipient_name.as_deref());

            recurring::ActiveModel::from(&def).insert(&db_tx).await?;
            Ok(def)
        })
    }

    /// Lists all recurring definitions across the owner's accounts.
    pub async fn recurring_transactions(
        &self,
        owner: &str,
    ) -> ResultEngine<Vec<RecurringTransaction>> {
        let models = recurring::Entity::find()
            .join(JoinType::InnerJoin, recurring::Relation::Accounts.def())
            .filter(accounts::Column::Owner.eq(owner))
            .order_by_desc(recurring::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(RecurringTransaction::try_from)
            .collect()
    }

    /// Pauses an active definition.
    pub async fn pause_recurring(&self, owner: &str, recurring_id: Uuid) -> ResultEngine<()> {
        self.set_recurring_status(
            owner,
            recurring_id,
            &[RecurringStatus::Active],
            RecurringStatus::Paused,
        )
        .await
    }

    /// Resumes a paused definition.
    pub async fn resume_recurring(&self, owner: &str, recurring_id: Uuid) -> ResultEngine<()> {
        self.set_recurring_status(
            owner,
            recurring_id,
            &[RecurringStatus::Paused],
            RecurringStatus::Active,
        )
        .await
    }

    /// Cancels a definition for good.
    pub async fn cancel_recurring(&self, owner: &str, recurring_id: Uuid) -> ResultEngine<()> {
        self.set_recurring_status(
            owner,
            recurring_id,
            &[RecurringStatus::Active, RecurringStatus::Paused],
            RecurringStatus::Cancelled,
        )
        .await
    }

    async fn set_recurring_status(
        &self,
        owner: &str,
        recurring_id: Uuid,
        allowed_from: &[RecurringStatus],
        to: RecurringStatus,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let def = self.require_recurring(&db_tx, recurring_id).await?;
            self.require_account(&db_tx, owner, def.account_id).await?;

            if !allowed_from.contains(&def.status) {
                return Err(EngineError::InvalidStatus(format!(
                    "cannot move a {} definition to {}",
                    def.status.as_str(),
                    to.as_str()
                )));
            }

            let update = recurring::ActiveModel {
                id: ActiveValue::Set(def.id.to_string()),
                status: ActiveValue::Set(to.as_str().to_string()),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Executes one recurring definition if it is due on `today`.
    ///
    /// Spawns a debit transfer carrying the definition's category and
    /// recipient, runs it through the processor, and only on success
    /// increments `execution_count` and advances `next_execution_date`
    /// (moving to `completed` when `max_executions` is reached). Failure
    /// leaves the definition untouched.
    pub async fn execute_recurring(
        &self,
        recurring_id: Uuid,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultEngine<RecurringOutcome> {
        let def = self
            .require_recurring(&self.database, recurring_id)
            .await?;
        if !def.can_execute(today) {
            return Ok(RecurringOutcome::NotDue);
        }

        let tx = self
            .create_transfer(
                // The scheduler acts on behalf of the account owner.
                &self.account_owner(def.account_id).await?,
                TransferNew {
                    account_id: def.account_id,
                    amount: def.amount,
                    description: format!("Recurring: {}", def.description),
                    category: def.category,
                    recipient_account_number: def.recipient_account_number.clone(),
                    recipient_name: def.recipient_name.clone(),
                },
                now,
            )
            .await?;

        let processed = self.process_transaction(tx.id, now).await?;
        if processed.status != TransactionStatus::Completed {
            return Ok(RecurringOutcome::Failed {
                transaction: processed,
            });
        }

        let execution_count = def.execution_count + 1;
        let next_date = advance_date(def.next_execution_date, def.frequency);
        let status = match def.max_executions {
            Some(max) if execution_count >= max => RecurringStatus::Completed,
            _ => def.status,
        };

        let update = recurring::ActiveModel {
            id: ActiveValue::Set(def.id.to_string()),
            execution_count: ActiveValue::Set(execution_count as i32),
            next_execution_date: ActiveValue::Set(next_date),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        update.update(&self.database).await?;

        Ok(RecurringOutcome::Executed {
            transaction: processed,
        })
    }

    /// Scans all active definitions due on `today` and executes each one
    /// independently: a failing definition is counted and skipped, never
    /// aborting the batch.
    pub async fn process_due_recurring(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultEngine<RunReport> {
        let due = recurring::Entity::find()
            .filter(recurring::Column::Status.eq(RecurringStatus::Active.as_str()))
            .filter(recurring::Column::NextExecutionDate.lte(today))
            .order_by_asc(recurring::Column::NextExecutionDate)
            .all(&self.database)
            .await?;

        let mut report = RunReport {
            total: due.len() as u64,
            ..Default::default()
        };

        for model in due {
            let row_id = model.id.clone();
            let def = match RecurringTransaction::try_from(model) {
                Ok(def) => def,
                Err(err) => {
                    tracing::warn!(recurring_id = %row_id, "skipping undecodable row: {err}");
                    report.failed += 1;
                    continue;
                }
            };
            match self.execute_recurring(def.id, today, now).await {
                Ok(RecurringOutcome::Executed { .. }) => report.processed += 1,
                Ok(RecurringOutcome::Failed { .. } | RecurringOutcome::NotDue) => {
                    report.failed += 1;
                }
                Err(err) => {
                    tracing::warn!(recurring_id = %def.id, "recurring execution errored: {err}");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failed,
            total = report.total,
            "recurring due-scan finished"
        );
        Ok(report)
    }

    pub(super) async fn require_recurring<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        recurring_id: Uuid,
    ) -> ResultEngine<RecurringTransaction> {
        let model = recurring::Entity::find_by_id(recurring_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("recurring not exists".to_string()))?;
        RecurringTransaction::try_from(model)
    }

    async fn account_owner(&self, account_id: Uuid) -> ResultEngine<String> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Ok(model.owner)
    }
}
