//! Transaction creation, cancellation and read operations.

use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    AccountStatus, EngineError, MoneyCents, ResultEngine, Transaction, TransactionCategory,
    TransactionKind, TransactionLog, TransactionStatus, fees::transaction_fee, transaction_logs,
    transaction_logs::SYSTEM_ACTOR, transactions, util::generate_transaction_reference,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

/// Parameters for creating an outgoing transfer.
#[derive(Clone, Debug)]
pub struct TransferNew {
    pub account_id: Uuid,
    pub amount: MoneyCents,
    pub description: String,
    pub category: TransactionCategory,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
}

impl Engine {
    /// Creates a pending debit transaction with the transfer fee applied.
    ///
    /// The row is inserted in `pending` together with its creation log entry;
    /// balances are not touched until [`Engine::process_transaction`] runs.
    pub async fn create_transfer(
        &self,
        owner: &str,
        transfer: TransferNew,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let description = normalize_required_text(&transfer.description, "description")?;
        let fee = transaction_fee(transfer.amount, TransactionCategory::Transfer);

        with_tx!(self, |db_tx| {
            let account = self
                .require_account(&db_tx, owner, transfer.account_id)
                .await?;
            if account.status == AccountStatus::Closed {
                return Err(EngineError::InvalidStatus(
                    "account is closed".to_string(),
                ));
            }

            let mut tx = Transaction::new(
                generate_transaction_reference(),
                account.id,
                transfer.amount,
                fee,
                TransactionKind::Debit,
                transfer.category,
                description,
                now,
            )?;
            tx.recipient_account_number =
                normalize_optional_text(transfer.recipient_account_number.as_deref());
            tx.recipient_name = normalize_optional_text(transfer.recipient_name.as_deref());

            self.insert_transaction(&db_tx, &tx, now).await?;
            Ok(tx)
        })
    }

    /// Creates a pending fee-free credit transaction (incoming deposit).
    pub async fn create_deposit(
        &self,
        owner: &str,
        account_id: Uuid,
        amount: MoneyCents,
        description: &str,
        external_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let description = normalize_required_text(description, "description")?;

        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, owner, account_id).await?;
            if account.status == AccountStatus::Closed {
                return Err(EngineError::InvalidStatus(
                    "account is closed".to_string(),
                ));
            }

            let mut tx = Transaction::new(
                generate_transaction_reference(),
                account.id,
                amount,
                MoneyCents::ZERO,
                TransactionKind::Credit,
                TransactionCategory::Deposit,
                description,
                now,
            )?;
            tx.external_reference = normalize_optional_text(external_reference);

            self.insert_transaction(&db_tx, &tx, now).await?;
            Ok(tx)
        })
    }

    /// Creates a pending debit transaction with the withdrawal fee applied.
    pub async fn create_withdrawal(
        &self,
        owner: &str,
        account_id: Uuid,
        amount: MoneyCents,
        description: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let description = normalize_required_text(description, "description")?;
        let fee = transaction_fee(amount, TransactionCategory::Withdrawal);

        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, owner, account_id).await?;
            if account.status == AccountStatus::Closed {
                return Err(EngineError::InvalidStatus(
                    "account is closed".to_string(),
                ));
            }

            let tx = Transaction::new(
                generate_transaction_reference(),
                account.id,
                amount,
                fee,
                TransactionKind::Debit,
                TransactionCategory::Withdrawal,
                description,
                now,
            )?;

            self.insert_transaction(&db_tx, &tx, now).await?;
            Ok(tx)
        })
    }

    /// Inserts the row and its creation log entry in the same unit.
    ///
    /// The creation entry has an empty `previous_status`, so the audit trail
    /// covers the whole lifecycle from the very first state.
    pub(super) async fn insert_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(tx).insert(db_tx).await?;

        let log = TransactionLog::new(
            tx.id,
            None,
            tx.status,
            "Transaction created".to_string(),
            SYSTEM_ACTOR.to_string(),
            now,
        );
        transaction_logs::ActiveModel::from(&log).insert(db_tx).await?;
        Ok(())
    }

    /// Cancels a transaction.
    ///
    /// Permitted only while the status is `pending` or `processing`; returns
    /// `false` without mutating anything otherwise, so cancelling an already
    /// terminal transaction is an idempotent no-op.
    pub async fn cancel_transaction(
        &self,
        owner: &str,
        transaction_id: Uuid,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultEngine<bool> {
        let reason = normalize_optional_text(reason)
            .unwrap_or_else(|| "Cancelled by user".to_string());

        with_tx!(self, |db_tx| {
            let mut tx = self
                .require_owned_transaction(&db_tx, owner, transaction_id)
                .await?;
            if !tx.can_cancel() {
                return Ok(false);
            }

            tx.failure_reason = Some(reason.clone());
            self.record_transition(
                &db_tx,
                &mut tx,
                TransactionStatus::Cancelled,
                &format!("Transaction cancelled: {reason}"),
                now,
            )
            .await?;
            Ok(true)
        })
    }

    /// Returns one transaction, verifying ownership.
    pub async fn transaction(
        &self,
        owner: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        self.require_owned_transaction(&self.database, owner, transaction_id)
            .await
    }

    /// Lists transactions for one account, newest first.
    pub async fn transactions(
        &self,
        owner: &str,
        account_id: Uuid,
        status: Option<TransactionStatus>,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        self.require_account(&self.database, owner, account_id)
            .await?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit);
        if let Some(status) = status {
            query = query.filter(transactions::Column::Status.eq(status.as_str()));
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Returns the append-only log trail of one transaction, newest first.
    pub async fn transaction_logs(
        &self,
        owner: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<TransactionLog>> {
        self.require_owned_transaction(&self.database, owner, transaction_id)
            .await?;

        let models = transaction_logs::Entity::find()
            .filter(transaction_logs::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_desc(transaction_logs::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(TransactionLog::try_from).collect()
    }
}
