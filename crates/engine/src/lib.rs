pub use accounts::{Account, AccountKind, AccountStatus};
pub use error::EngineError;
pub use fees::{MINIMUM_FEE, transaction_fee};
pub use money::MoneyCents;
pub use ops::{
    Engine, EngineBuilder, RecurringNew, RecurringOutcome, RetryReport, RunReport, TransferNew,
};
pub use recurring::{Frequency, RecurringStatus, RecurringTransaction, advance_date};
pub use transaction_logs::{SYSTEM_ACTOR, TransactionLog};
pub use transactions::{
    Movement, Transaction, TransactionCategory, TransactionKind, TransactionStatus,
};
pub use util::validate_account_number;

mod accounts;
mod error;
mod fees;
mod money;
mod ops;
mod recurring;
mod transaction_logs;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
