//! Transaction primitives.
//!
//! A `Transaction` is an immutable record of a single monetary movement with
//! a status lifecycle driven exclusively by the processor in
//! [`ops`](crate::ops). Terminal states are final; rows are never deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Completed, failed and cancelled transactions never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    Transfer,
    Payment,
    Deposit,
    Withdrawal,
    Shopping,
    Bills,
    Income,
    Investment,
    #[default]
    Other,
}

impl TransactionCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Payment => "payment",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Shopping => "shopping",
            Self::Bills => "bills",
            Self::Income => "income",
            Self::Investment => "investment",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for TransactionCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "payment" => Ok(Self::Payment),
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "shopping" => Ok(Self::Shopping),
            "bills" => Ok(Self::Bills),
            "income" => Ok(Self::Income),
            "investment" => Ok(Self::Investment),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid transaction category: {other}"
            ))),
        }
    }
}

/// The balance effect of a transaction, resolved once before processing.
///
/// - `Debit` carries the **total** taken from the account (amount + fee).
/// - `Credit` carries the **net** added to the account (amount - fee).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Credit(MoneyCents),
    Debit(MoneyCents),
}

impl From<&Transaction> for Movement {
    fn from(tx: &Transaction) -> Self {
        match tx.kind {
            TransactionKind::Debit => Movement::Debit(tx.amount + tx.fee_amount),
            TransactionKind::Credit => Movement::Credit(tx.amount - tx.fee_amount),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Unique human-readable code (`TXN` + 10 chars). Immutable once set.
    pub reference: String,
    pub account_id: Uuid,
    pub amount: MoneyCents,
    pub fee_amount: MoneyCents,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub category: TransactionCategory,
    pub description: String,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference: String,
        account_id: Uuid,
        amount: MoneyCents,
        fee_amount: MoneyCents,
        kind: TransactionKind,
        category: TransactionCategory,
        description: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if fee_amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "fee_amount must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            reference,
            account_id,
            amount,
            fee_amount,
            kind,
            status: TransactionStatus::Pending,
            category,
            description,
            recipient_account_number: None,
            recipient_name: None,
            processed_at: None,
            failure_reason: None,
            external_reference: None,
            created_at,
        })
    }

    /// Net effect on the account: amount + fee for debits, amount - fee for
    /// credits.
    #[must_use]
    pub fn net_amount(&self) -> MoneyCents {
        match self.kind {
            TransactionKind::Debit => self.amount + self.fee_amount,
            TransactionKind::Credit => self.amount - self.fee_amount,
        }
    }

    /// Cancellation is only permitted before a terminal state is reached.
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Pending | TransactionStatus::Processing
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub reference: String,
    pub account_id: String,
    pub amount: i64,
    pub fee_amount: i64,
    pub kind: String,
    pub status: String,
    pub category: String,
    pub description: String,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
    pub processed_at: Option<DateTimeUtc>,
    pub failure_reason: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
    #[sea_orm(has_many = "super::transaction_logs::Entity")]
    Logs,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::transaction_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            reference: ActiveValue::Set(tx.reference.clone()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            amount: ActiveValue::Set(tx.amount.cents()),
            fee_amount: ActiveValue::Set(tx.fee_amount.cents()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            category: ActiveValue::Set(tx.category.as_str().to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            recipient_account_number: ActiveValue::Set(tx.recipient_account_number.clone()),
            recipient_name: ActiveValue::Set(tx.recipient_name.clone()),
            processed_at: ActiveValue::Set(tx.processed_at),
            failure_reason: ActiveValue::Set(tx.failure_reason.clone()),
            external_reference: ActiveValue::Set(tx.external_reference.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            reference: model.reference,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            amount: MoneyCents::new(model.amount),
            fee_amount: MoneyCents::new(model.fee_amount),
            kind: TransactionKind::try_from(model.kind.as_str())?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            category: TransactionCategory::try_from(model.category.as_str())?,
            description: model.description,
            recipient_account_number: model.recipient_account_number,
            recipient_name: model.recipient_name,
            processed_at: model.processed_at,
            failure_reason: model.failure_reason,
            external_reference: model.external_reference,
            created_at: model.created_at,
        })
    }
}
