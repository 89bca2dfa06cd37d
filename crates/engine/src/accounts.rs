//! The module contains the `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    #[default]
    Checking,
    Savings,
    Business,
}

impl AccountKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Business => "business",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "business" => Ok(Self::Business),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Closed,
}

impl AccountStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for AccountStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            "closed" => Ok(Self::Closed),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid account status: {other}"
            ))),
        }
    }
}

/// A financial account owned by a user.
///
/// Balances are mutated only through [`Account::debit`] and
/// [`Account::credit`]; both keep the invariant
/// `available_balance <= balance`. Accounts are never hard-deleted: closing
/// an account moves its status to [`AccountStatus::Closed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    /// Username of the owner.
    pub owner: String,
    /// Unique human-facing number (`ACC` + 8 digits). Immutable once set.
    pub account_number: String,
    pub kind: AccountKind,
    pub balance: MoneyCents,
    /// Spendable part of `balance`; never exceeds it.
    pub available_balance: MoneyCents,
    pub status: AccountStatus,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        owner: String,
        account_number: String,
        kind: AccountKind,
        is_primary: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            account_number,
            kind,
            balance: MoneyCents::ZERO,
            available_balance: MoneyCents::ZERO,
            status: AccountStatus::Active,
            is_primary,
            created_at,
        }
    }

    /// Returns `true` iff the account is active and has at least `amount`
    /// available.
    #[must_use]
    pub fn can_debit(&self, amount: MoneyCents) -> bool {
        self.status == AccountStatus::Active && self.available_balance >= amount
    }

    /// Debits `amount` from both balances.
    ///
    /// Returns `false` without mutating anything when the debit is not
    /// permitted; insufficient funds are a normal outcome, not an error.
    pub fn debit(&mut self, amount: MoneyCents) -> bool {
        if !self.can_debit(amount) {
            return false;
        }
        self.balance -= amount;
        self.available_balance -= amount;
        true
    }

    /// Credits `amount` to both balances. No upper bound is enforced here.
    pub fn credit(&mut self, amount: MoneyCents) {
        self.balance += amount;
        self.available_balance += amount;
    }

    /// Masked number for display (`****1234`).
    #[must_use]
    pub fn masked_account_number(&self) -> String {
        if self.account_number.len() > 4 {
            let tail = &self.account_number[self.account_number.len() - 4..];
            format!("****{tail}")
        } else {
            self.account_number.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner: String,
    pub account_number: String,
    pub kind: String,
    pub balance: i64,
    pub available_balance: i64,
    pub status: String,
    pub is_primary: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::recurring::Entity")]
    RecurringTransactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::recurring::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            owner: ActiveValue::Set(account.owner.clone()),
            account_number: ActiveValue::Set(account.account_number.clone()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            balance: ActiveValue::Set(account.balance.cents()),
            available_balance: ActiveValue::Set(account.available_balance.cents()),
            status: ActiveValue::Set(account.status.as_str().to_string()),
            is_primary: ActiveValue::Set(account.is_primary),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            owner: model.owner,
            account_number: model.account_number,
            kind: AccountKind::try_from(model.kind.as_str())?,
            balance: MoneyCents::new(model.balance),
            available_balance: MoneyCents::new(model.available_balance),
            status: AccountStatus::try_from(model.status.as_str())?,
            is_primary: model.is_primary,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn account() -> Account {
        let mut account = Account::new(
            "alice".to_string(),
            "ACC12345678".to_string(),
            AccountKind::Checking,
            true,
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        account.credit(MoneyCents::new(10_000));
        account
    }

    #[test]
    fn credit_raises_both_balances() {
        let account = account();
        assert_eq!(account.balance, MoneyCents::new(10_000));
        assert_eq!(account.available_balance, MoneyCents::new(10_000));
    }

    #[test]
    fn debit_within_available_succeeds() {
        let mut account = account();
        assert!(account.debit(MoneyCents::new(2_500)));
        assert_eq!(account.balance, MoneyCents::new(7_500));
        assert_eq!(account.available_balance, MoneyCents::new(7_500));
    }

    #[test]
    fn debit_over_available_is_rejected_and_leaves_state() {
        let mut account = account();
        assert!(!account.debit(MoneyCents::new(10_001)));
        assert_eq!(account.balance, MoneyCents::new(10_000));
        assert_eq!(account.available_balance, MoneyCents::new(10_000));
    }

    #[test]
    fn debit_on_non_active_account_is_rejected() {
        let mut account = account();
        account.status = AccountStatus::Suspended;
        assert!(!account.debit(MoneyCents::new(1)));
        assert_eq!(account.balance, MoneyCents::new(10_000));
    }

    #[test]
    fn balance_never_below_available() {
        let mut account = account();
        account.debit(MoneyCents::new(4_000));
        account.credit(MoneyCents::new(123));
        assert!(account.balance >= account.available_balance);
    }

    #[test]
    fn masked_number_keeps_last_four() {
        let account = account();
        assert_eq!(account.masked_account_number(), "****5678");
    }
}
