use csv::{QuoteStyle, Terminator, WriterBuilder};
use rust_decimal::Decimal;

use crate::format::{format_date, format_money, month_label};
use crate::models::{Currency, ExpenseValidation};

use super::month::Month;
use super::plan::StatusTab;

pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";
pub const UTF8_BOM: &str = "\u{feff}";

pub const CSV_HEADER: [&str; 11] = [
    "Código",
    "Serviço",
    "Empresa",
    "Setor",
    "Responsável",
    "Valor",
    "Status",
    "Mês",
    "Data de renovação",
    "Validado por",
    "Data",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output is not valid utf-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub fn csv_filename(month: Month, tab: StatusTab) -> String {
    format!("validacoes-{month}-{tab}.csv")
}

/// Semicolon-delimited, CRLF-terminated CSV of the given rows, prefixed with a
/// UTF-8 byte order mark. Cells holding `;` or `"` are quoted.
pub fn build_csv(validations: &[ExpenseValidation]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for validation in validations {
        writer.write_record(csv_row(validation))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    let body = String::from_utf8(bytes)?;
    Ok(format!("{UTF8_BOM}{body}"))
}

fn csv_row(validation: &ExpenseValidation) -> [String; 11] {
    let expense = validation.expense.as_ref();
    let text = |value: Option<&str>| value.unwrap_or_default().to_string();

    let value = expense
        .map(|e| {
            let currency = e.currency.clone().unwrap_or(Currency::Brl);
            format_money(e.value.unwrap_or(Decimal::ZERO), &currency)
        })
        .unwrap_or_default();

    [
        text(expense.map(|e| e.code.as_str())),
        text(expense.map(|e| e.service_name.as_str())),
        text(expense.and_then(|e| e.company.as_ref()).map(|c| c.name.as_str())),
        text(expense.and_then(|e| e.department.as_ref()).map(|d| d.name.as_str())),
        text(expense.and_then(|e| e.owner.as_ref()).map(|o| o.name.as_str())),
        value,
        validation.status.label().to_string(),
        month_label(Month::containing(validation.validation_month)),
        expense
            .and_then(|e| e.renewal_date)
            .map(format_date)
            .unwrap_or_default(),
        text(validation.validator.as_ref().map(|v| v.name.as_str())),
        validation.validated_on.map(format_date).unwrap_or_default(),
    ]
}
