use sea_orm::{ConnectionTrait, DatabaseConnection, prelude::*};
use uuid::Uuid;

use crate::{Account, EngineError, ResultEngine, Transaction, accounts, transactions};

mod accounts_ops;
mod maintenance;
mod processor;
mod recurring_ops;
mod transactions_ops;

pub use maintenance::RetryReport;
pub use recurring_ops::{RecurringNew, RecurringOutcome, RunReport};
pub use transactions_ops::TransferNew;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point for every ledger operation.
///
/// The engine owns nothing but the database handle: all state lives in the
/// `accounts`, `transactions`, `transaction_logs` and `recurring_transactions`
/// tables, and every mutation runs inside a database transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Loads an account, verifying `owner` actually owns it.
    ///
    /// Foreign accounts are reported as not-found so ownership is not leaked.
    pub(crate) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        owner: &str,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        if model.owner != owner {
            return Err(EngineError::KeyNotFound("account not exists".to_string()));
        }
        Account::try_from(model)
    }

    /// Loads a transaction by id.
    pub(crate) async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    /// Loads a transaction and verifies `owner` owns its account.
    pub(crate) async fn require_owned_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        owner: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let tx = self.require_transaction(db, transaction_id).await?;
        self.require_account(db, owner, tx.account_id).await?;
        Ok(tx)
    }
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`, verifying the database is reachable.
    pub async fn build(self) -> ResultEngine<Engine> {
        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
        })
    }
}
