//! Account management operations.
//!
//! Balances are never written here: only the processor mutates them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountKind, AccountStatus, EngineError, ResultEngine, accounts, users,
    util::generate_account_number,
};

use super::{Engine, with_tx};

impl Engine {
    /// Opens a new account for `owner`.
    ///
    /// The owner's first account becomes the primary one. The generated
    /// account number is unique; generation retries on the (unlikely)
    /// collision.
    pub async fn new_account(
        &self,
        owner: &str,
        kind: AccountKind,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(owner)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;

            let has_accounts = accounts::Entity::find()
                .filter(accounts::Column::Owner.eq(owner))
                .one(&db_tx)
                .await?
                .is_some();

            let account_number = loop {
                let candidate = generate_account_number();
                let taken = accounts::Entity::find()
                    .filter(accounts::Column::AccountNumber.eq(candidate.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if !taken {
                    break candidate;
                }
            };

            let account = Account::new(
                owner.to_string(),
                account_number,
                kind,
                !has_accounts,
                now,
            );
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }

    /// Returns one account, verifying ownership.
    pub async fn account(&self, owner: &str, account_id: Uuid) -> ResultEngine<Account> {
        self.require_account(&self.database, owner, account_id).await
    }

    /// Lists the owner's accounts, primary first.
    pub async fn accounts(&self, owner: &str) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(owner))
            .order_by_desc(accounts::Column::IsPrimary)
            .order_by_desc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }

    /// Closes an account.
    ///
    /// Accounts are never hard-deleted: the status moves to `closed`, which
    /// blocks any further debit or new transaction.
    pub async fn close_account(&self, owner: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let mut account = self.require_account(&db_tx, owner, account_id).await?;
            if account.status == AccountStatus::Closed {
                return Ok(account);
            }

            account.status = AccountStatus::Closed;
            let update = accounts::ActiveModel {
                id: ActiveValue::Set(account.id.to_string()),
                status: ActiveValue::Set(AccountStatus::Closed.as_str().to_string()),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(account)
        })
    }
}
