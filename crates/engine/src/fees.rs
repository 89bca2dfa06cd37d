//! Transaction fee table.

use crate::{MoneyCents, TransactionCategory};

/// Minimum fee charged on any fee-bearing transaction.
pub const MINIMUM_FEE: MoneyCents = MoneyCents::new(100);

const fn rate_bps(category: TransactionCategory) -> i64 {
    match category {
        TransactionCategory::Transfer => 100,
        TransactionCategory::Payment => 50,
        TransactionCategory::Withdrawal => 200,
        _ => 100,
    }
}

/// Computes the fee for `amount` in `category`.
///
/// `fee = max(MINIMUM_FEE, amount * rate)` with the percentage rounded to the
/// nearest cent. Pure and deterministic.
#[must_use]
pub fn transaction_fee(amount: MoneyCents, category: TransactionCategory) -> MoneyCents {
    let bps = rate_bps(category);
    let raw = (amount.cents() * bps + 5_000) / 10_000;
    MoneyCents::new(raw.max(MINIMUM_FEE.cents()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_fee_floors_small_amounts() {
        // 1% of $50.00 is $0.50, floored to $1.00.
        assert_eq!(
            transaction_fee(MoneyCents::new(5_000), TransactionCategory::Transfer),
            MoneyCents::new(100)
        );
    }

    #[test]
    fn transfer_is_one_percent() {
        assert_eq!(
            transaction_fee(MoneyCents::new(50_000), TransactionCategory::Transfer),
            MoneyCents::new(500)
        );
    }

    #[test]
    fn payment_is_half_percent() {
        assert_eq!(
            transaction_fee(MoneyCents::new(100_000), TransactionCategory::Payment),
            MoneyCents::new(500)
        );
    }

    #[test]
    fn withdrawal_is_two_percent() {
        assert_eq!(
            transaction_fee(MoneyCents::new(10_000), TransactionCategory::Withdrawal),
            MoneyCents::new(200)
        );
    }

    #[test]
    fn unknown_categories_use_default_rate() {
        assert_eq!(
            transaction_fee(MoneyCents::new(30_000), TransactionCategory::Shopping),
            MoneyCents::new(300)
        );
    }

    #[test]
    fn percentage_rounds_to_nearest_cent() {
        // 0.5% of $123.45 = $0.61725 -> $0.62, still under the minimum.
        assert_eq!(
            transaction_fee(MoneyCents::new(12_345), TransactionCategory::Payment),
            MoneyCents::new(100)
        );
        // 1% of $123.45 = $1.2345 -> $1.23.
        assert_eq!(
            transaction_fee(MoneyCents::new(12_345), TransactionCategory::Transfer),
            MoneyCents::new(123)
        );
    }
}
