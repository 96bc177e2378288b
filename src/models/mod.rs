pub mod dashboard;
pub mod expense;
pub mod lenient;
pub mod user;
pub mod validation;

pub use dashboard::DashboardStats;
pub use expense::{
    Category, Company, Currency, Department,
    Expense, ExpenseStatus, ExpenseType, Periodicity,
};
pub use user::{AuthResponse, LoginRequest, User, UserRole};
pub use validation::{
    ExpenseValidation, RejectRequest, ValidationStatus,
    OVERDUE_GRACE_DAYS,
};
