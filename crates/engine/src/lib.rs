pub use aggregation::{
    BudgetStatus, CategoryDetail, CategoryExpense, Dashboard, MonthlySummary, RecentTransaction,
    TrendPoint,
};
pub use budgets::Budget;
pub use categories::Category;
pub use error::EngineError;
pub use money::Money;
pub use ops::{
    CategoryChanges, DEFAULT_TREND_MONTHS, Engine, EngineBuilder, MonthlyReport, TransactionInput,
    TransactionListFilter,
};
pub use period::Period;
pub use transactions::{Transaction, TransactionKind};
pub use util::parse_timestamp;

pub mod aggregation;
mod budgets;
mod categories;
mod error;
mod money;
mod ops;
mod period;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
