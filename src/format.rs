use chrono::NaiveDate;
use num_format::{CustomFormat, Grouping, Locale, ToFormattedString as _};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Currency;
use crate::validations::month::Month;

/// Placeholder for missing relations in rendered pages.
pub const MISSING: &str = "—";

const MONTH_NAMES: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

/// Formats an amount the way the browser's currency formatter does: pt-BR
/// for BRL (`R$ 1.234,56`), en-US for everything else (`$1,234.56`).
pub fn format_money(amount: Decimal, currency: &Currency) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let magnitude = rounded.abs();
    let integer = magnitude.trunc().to_u128().unwrap_or_default();
    let cents = ((magnitude - magnitude.trunc()) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();

    match currency {
        Currency::Brl => format!("{sign}R$\u{a0}{},{cents:02}", group_brazilian(integer)),
        Currency::Usd => format!(
            "{sign}${}.{cents:02}",
            integer.to_formatted_string(&Locale::en)
        ),
        Currency::Other(code) => format!(
            "{sign}{code}\u{a0}{}.{cents:02}",
            integer.to_formatted_string(&Locale::en)
        ),
    }
}

fn group_brazilian(integer: u128) -> String {
    CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator(".")
        .build()
        .map(|format| integer.to_formatted_string(&format))
        .unwrap_or_else(|_| integer.to_string())
}

pub fn format_brl(amount: Decimal) -> String {
    format_money(amount, &Currency::Brl)
}

/// `dd/mm/yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `junho de 2024`
pub fn month_label(month: Month) -> String {
    let index = usize::try_from(month.number().saturating_sub(1)).unwrap_or_default();
    let name = MONTH_NAMES.get(index).copied().unwrap_or_default();
    format!("{} de {}", name, month.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> Decimal {
        text.parse().expect("valid decimal literal")
    }

    #[test]
    fn brl_uses_brazilian_separators() {
        assert_eq!(format_money(dec("1234.5"), &Currency::Brl), "R$\u{a0}1.234,50");
        assert_eq!(format_money(dec("0"), &Currency::Brl), "R$\u{a0}0,00");
        assert_eq!(format_money(dec("1234567.891"), &Currency::Brl), "R$\u{a0}1.234.567,89");
    }

    #[test]
    fn usd_uses_us_separators() {
        assert_eq!(format_money(dec("1234.5"), &Currency::Usd), "$1,234.50");
        assert_eq!(format_money(dec("-12.345"), &Currency::Usd), "-$12.35");
    }

    #[test]
    fn dates_and_months_are_portuguese() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).expect("valid date");
        assert_eq!(format_date(date), "07/03/2024");
        let month: Month = "2024-06".parse().expect("valid month");
        assert_eq!(month_label(month), "junho de 2024");
        let march: Month = "2025-03".parse().expect("valid month");
        assert_eq!(month_label(march), "março de 2025");
    }
}
