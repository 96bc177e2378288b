pub mod client;
pub mod dashboard;
pub mod directory;
pub mod validations;

pub use client::{ApiClient, ApiError};
pub use dashboard::ExpenseQuery;
pub use validations::HistoryQuery;
