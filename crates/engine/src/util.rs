//! Internal helpers for identifier generation and parsing.
//!
//! These utilities are **not** part of the public API.

use uuid::Uuid;

/// Generates a transaction reference: `TXN` + 10 uppercase hex characters.
///
/// Derived from a fresh UUID; the unique index on `transactions.reference`
/// backs up the (already negligible) collision odds.
pub(crate) fn generate_transaction_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TXN{}", &hex[..10])
}

/// Generates an account number: `ACC` + 8 digits.
pub(crate) fn generate_account_number() -> String {
    let digits = Uuid::new_v4().as_u128() % 100_000_000;
    format!("ACC{digits:08}")
}

/// Returns `true` iff `value` is `ACC` followed by exactly 8 digits.
#[must_use]
pub fn validate_account_number(value: &str) -> bool {
    let Some(suffix) = value.strip_prefix("ACC") else {
        return false;
    };
    suffix.len() == 8 && suffix.chars().all(|c| c.is_ascii_digit())
}
