//! Recurring transaction schedule definitions.
//!
//! A `RecurringTransaction` describes a scheduled debit that the scheduler in
//! [`ops`](crate::ops) turns into concrete transactions every time it comes
//! due. The definition itself only advances after a successful execution, so
//! a failed run is retried on the next scan.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, TransactionCategory};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
    Completed,
}

impl RecurringStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for RecurringStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid recurring status: {other}"
            ))),
        }
    }
}

/// Advances `date` by one period of `frequency`.
///
/// Daily/weekly use fixed day counts; monthly/quarterly/yearly use calendar
/// arithmetic that clamps to the end of a shorter month (Jan 31 + 1 month =
/// Feb 28/29).
#[must_use]
pub fn advance_date(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    let advanced = match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Quarterly => date.checked_add_months(Months::new(3)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
    };
    // Only fails at the far edge of the supported calendar range.
    advanced.unwrap_or(date)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: MoneyCents,
    pub description: String,
    pub category: TransactionCategory,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Only ever advances forward, and only after a successful execution.
    pub next_execution_date: NaiveDate,
    pub status: RecurringStatus,
    pub execution_count: u32,
    pub max_executions: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl RecurringTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: Uuid,
        amount: MoneyCents,
        description: String,
        category: TransactionCategory,
        frequency: Frequency,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        max_executions: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if let Some(end) = end_date {
            if end < start_date {
                return Err(EngineError::InvalidAmount(
                    "end_date must not precede start_date".to_string(),
                ));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            description,
            category,
            recipient_account_number: None,
            recipient_name: None,
            frequency,
            start_date,
            end_date,
            next_execution_date: start_date,
            status: RecurringStatus::Active,
            execution_count: 0,
            max_executions,
            created_at,
        })
    }

    /// Returns `true` iff the definition is due on `today`.
    ///
    /// Due means: active, `next_execution_date <= today`, execution budget
    /// not exhausted and `today` not past `end_date`.
    #[must_use]
    pub fn can_execute(&self, today: NaiveDate) -> bool {
        if self.status != RecurringStatus::Active {
            return false;
        }
        if self.next_execution_date > today {
            return false;
        }
        if let Some(max) = self.max_executions {
            if self.execution_count >= max {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if today > end {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub amount: i64,
    pub description: String,
    pub category: String,
    pub recipient_account_number: Option<String>,
    pub recipient_name: Option<String>,
    pub frequency: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub next_execution_date: Date,
    pub status: String,
    pub execution_count: i32,
    pub max_executions: Option<i32>,
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
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurringTransaction> for ActiveModel {
    fn from(def: &RecurringTransaction) -> Self {
        Self {
            id: ActiveValue::Set(def.id.to_string()),
            account_id: ActiveValue::Set(def.account_id.to_string()),
            amount: ActiveValue::Set(def.amount.cents()),
            description: ActiveValue::Set(def.description.clone()),
            category: ActiveValue::Set(def.category.as_str().to_string()),
            recipient_account_number: ActiveValue::Set(def.recipient_account_number.clone()),
            recipient_name: ActiveValue::Set(def.recipient_name.clone()),
            frequency: ActiveValue::Set(def.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(def.start_date),
            end_date: ActiveValue::Set(def.end_date),
            next_execution_date: ActiveValue::Set(def.next_execution_date),
            status: ActiveValue::Set(def.status.as_str().to_string()),
            execution_count: ActiveValue::Set(def.execution_count as i32),
            max_executions: ActiveValue::Set(def.max_executions.map(|m| m as i32)),
            created_at: ActiveValue::Set(def.created_at),
        }
    }
}

impl TryFrom<Model> for RecurringTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("recurring not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            amount: MoneyCents::new(model.amount),
            description: model.description,
            category: TransactionCategory::try_from(model.category.as_str())?,
            recipient_account_number: model.recipient_account_number,
            recipient_name: model.recipient_name,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            next_execution_date: model.next_execution_date,
            status: RecurringStatus::try_from(model.status.as_str())?,
            execution_count: model.execution_count.max(0) as u32,
            max_executions: model.max_executions.map(|m| m.max(0) as u32),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn definition() -> RecurringTransaction {
        RecurringTransaction::new(
            Uuid::new_v4(),
            MoneyCents::new(2_000),
            "Gym".to_string(),
            TransactionCategory::Payment,
            Frequency::Monthly,
            date(2024, 1, 15),
            None,
            None,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn advance_daily_and_weekly_use_fixed_day_counts() {
        assert_eq!(advance_date(date(2024, 3, 1), Frequency::Daily), date(2024, 3, 2));
        assert_eq!(advance_date(date(2024, 3, 1), Frequency::Weekly), date(2024, 3, 8));
    }

    #[test]
    fn advance_monthly_clamps_to_month_end() {
        // 2024 is a leap year.
        assert_eq!(
            advance_date(date(2024, 1, 31), Frequency::Monthly),
            date(2024, 2, 29)
        );
        assert_eq!(
            advance_date(date(2023, 1, 31), Frequency::Monthly),
            date(2023, 2, 28)
        );
        assert_eq!(
            advance_date(date(2024, 2, 29), Frequency::Monthly),
            date(2024, 3, 29)
        );
    }

    #[test]
    fn advance_quarterly_and_yearly() {
        assert_eq!(
            advance_date(date(2024, 11, 30), Frequency::Quarterly),
            date(2025, 2, 28)
        );
        assert_eq!(
            advance_date(date(2024, 2, 29), Frequency::Yearly),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn can_execute_requires_due_date() {
        let def = definition();
        assert!(!def.can_execute(date(2024, 1, 14)));
        assert!(def.can_execute(date(2024, 1, 15)));
        assert!(def.can_execute(date(2024, 2, 1)));
    }

    #[test]
    fn can_execute_respects_status() {
        let mut def = definition();
        def.status = RecurringStatus::Paused;
        assert!(!def.can_execute(date(2024, 2, 1)));
    }

    #[test]
    fn can_execute_respects_max_executions() {
        let mut def = definition();
        def.max_executions = Some(2);
        def.execution_count = 2;
        assert!(!def.can_execute(date(2024, 2, 1)));
    }

    #[test]
    fn can_execute_respects_end_date() {
        let mut def = definition();
        def.end_date = Some(date(2024, 1, 31));
        assert!(def.can_execute(date(2024, 1, 31)));
        assert!(!def.can_execute(date(2024, 2, 1)));
    }
}
