use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        #[default]
        Checking,
        Savings,
        Business,
    }

    impl AccountKind {
        /// Returns the canonical kind string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Checking => "checking",
                Self::Savings => "savings",
                Self::Business => "business",
            }
        }
    }

    /// Request body for opening an account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub kind: Option<AccountKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        /// Account id (UUID).
        ///
        /// This is serialized as a string in JSON.
        pub id: Uuid,
        pub account_number: String,
        pub kind: AccountKind,
        pub balance_cents: i64,
        pub available_balance_cents: i64,
        pub status: String,
        pub is_primary: bool,
        pub created_at: DateTime<Utc>,
    }

    /// Response body for the balance endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub account_id: Uuid,
        pub balance_cents: i64,
        pub available_balance_cents: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod transaction {
    use super::*;

    /// What the caller wants to do with their money.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionNewKind {
        Transfer,
        Deposit,
        Withdrawal,
    }

    /// Request body for creating (and immediately processing) a transaction.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        pub kind: TransactionNewKind,
        pub amount_cents: i64,
        pub description: String,
        /// Spending category; defaults per kind when omitted.
        pub category: Option<String>,
        pub recipient_account_number: Option<String>,
        pub recipient_name: Option<String>,
        pub external_reference: Option<String>,
    }

    /// Query parameters for listing transactions.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub account_id: Uuid,
        pub status: Option<String>,
        pub limit: Option<u64>,
    }

    /// Request body for cancelling a transaction.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionCancel {
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub reference: String,
        pub account_id: Uuid,
        pub amount_cents: i64,
        pub fee_cents: i64,
        pub kind: String,
        pub status: String,
        pub category: String,
        pub description: String,
        pub recipient_account_number: Option<String>,
        pub recipient_name: Option<String>,
        pub processed_at: Option<DateTime<Utc>>,
        pub failure_reason: Option<String>,
        pub external_reference: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }

    /// Response body for cancelling: whether the cancel took effect.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCancelled {
        pub cancelled: bool,
        pub transaction: TransactionView,
    }

    /// One entry of a transaction's audit trail.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionLogView {
        pub previous_status: String,
        pub new_status: String,
        pub message: String,
        pub processed_by: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionLogsResponse {
        pub logs: Vec<TransactionLogView>,
    }
}

pub mod recurring {
    use super::*;

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
        /// Returns the canonical frequency string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Daily => "daily",
                Self::Weekly => "weekly",
                Self::Monthly => "monthly",
                Self::Quarterly => "quarterly",
                Self::Yearly => "yearly",
            }
        }
    }

    /// Request body for creating a recurring definition.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringNew {
        pub account_id: Uuid,
        pub amount_cents: i64,
        pub description: String,
        pub category: Option<String>,
        pub recipient_account_number: Option<String>,
        pub recipient_name: Option<String>,
        pub frequency: Frequency,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub max_executions: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub amount_cents: i64,
        pub description: String,
        pub category: String,
        pub frequency: Frequency,
        pub start_date: NaiveDate,
        pub end_date: Option<NaiveDate>,
        pub next_execution_date: NaiveDate,
        pub status: String,
        pub execution_count: u32,
        pub max_executions: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringListResponse {
        pub recurring: Vec<RecurringView>,
    }
}

pub mod jobs {
    use super::*;

    /// Outcome of one due-scan over recurring definitions.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RunReport {
        pub processed: u64,
        pub failed: u64,
        pub total: u64,
    }
}
