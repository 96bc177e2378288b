use rust_decimal::Decimal;

use crate::models::{Currency, Expense, ExpenseValidation};

/// BRL amount an expense adds to the footer total.
///
/// `value_brl` wins when it is numeric. Otherwise `value` is converted: BRL as
/// is, USD through the stored exchange rate, with a rate of 1 when the rate is
/// missing or not positive. Anything else contributes nothing.
pub fn expense_value_brl(expense: &Expense) -> Option<Decimal> {
    if let Some(value_brl) = expense.value_brl {
        return Some(value_brl);
    }

    let value = expense.value?;
    match expense.currency.as_ref()? {
        Currency::Brl => Some(value),
        Currency::Usd => {
            let rate = expense
                .exchange_rate
                .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
                .unwrap_or(Decimal::ONE);
            value.checked_mul(rate)
        }
        Currency::Other(_) => None,
    }
}

/// Sum of the BRL value of every row. A row whose amount cannot be computed,
/// or whose addition would overflow, counts as zero.
pub fn total_brl(validations: &[ExpenseValidation]) -> Decimal {
    validations
        .iter()
        .filter_map(|validation| validation.expense.as_ref())
        .filter_map(expense_value_brl)
        .fold(Decimal::ZERO, |total, amount| {
            total.checked_add(amount).unwrap_or(total)
        })
}
