//! Append-only audit trail of transaction status transitions.
//!
//! One entry is written for every status change, including the initial
//! creation (`previous_status = ""`). Entries are only ever inserted by the
//! operations in [`ops`](crate::ops) and pruned by the housekeeping job.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TransactionStatus};

/// Actor recorded for transitions driven by the engine itself.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLog {
    pub id: Uuid,
    pub transaction_id: Uuid,
    /// Empty on the creation entry.
    pub previous_status: String,
    pub new_status: TransactionStatus,
    pub message: String,
    pub processed_by: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionLog {
    pub fn new(
        transaction_id: Uuid,
        previous_status: Option<TransactionStatus>,
        new_status: TransactionStatus,
        message: String,
        processed_by: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            previous_status: previous_status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            new_status,
            message,
            processed_by,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub previous_status: String,
    pub new_status: String,
    pub message: String,
    pub processed_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&TransactionLog> for ActiveModel {
    fn from(log: &TransactionLog) -> Self {
        Self {
            id: ActiveValue::Set(log.id.to_string()),
            transaction_id: ActiveValue::Set(log.transaction_id.to_string()),
            previous_status: ActiveValue::Set(log.previous_status.clone()),
            new_status: ActiveValue::Set(log.new_status.as_str().to_string()),
            message: ActiveValue::Set(log.message.clone()),
            processed_by: ActiveValue::Set(log.processed_by.clone()),
            created_at: ActiveValue::Set(log.created_at),
        }
    }
}

impl TryFrom<Model> for TransactionLog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("log not exists".to_string()))?,
            transaction_id: Uuid::parse_str(&model.transaction_id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            previous_status: model.previous_status,
            new_status: TransactionStatus::try_from(model.new_status.as_str())?,
            message: model.message,
            processed_by: model.processed_by,
            created_at: model.created_at,
        })
    }
}
