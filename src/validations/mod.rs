//! Validation board pipeline: month classification, fetch planning, client-side
//! filtering, totals, approve/reject decisions and CSV export.

pub mod actions;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod month;
pub mod plan;
pub mod totals;

pub use actions::{ActionDispatcher, ActionError, InFlightActions, RejectFlow};
pub use export::{build_csv, csv_filename, ExportError, CSV_CONTENT_TYPE};
pub use fetch::{fetch_validations, RequestSequencer, ValidationFetcher};
pub use filter::ValidationFilters;
pub use month::{month_options, Month, MonthOption};
pub use plan::{FetchPlan, StatusTab};
pub use totals::{expense_value_brl, total_brl};
