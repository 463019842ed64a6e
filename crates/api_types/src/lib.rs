//! JSON bodies exchanged with the HTTP API.
//!
//! Field names are camelCase on the wire. Amounts are integer minor units
//! (cents); dates are RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wrapper around every response body.
///
/// Successful calls carry `data`, failed ones carry `error`; the other field
/// is omitted.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// `month`/`year` selector; missing fields default to the current month.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Registered {
        pub username: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryListQuery {
        /// Only categories of this kind.
        pub kind: Option<TransactionKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub kind: TransactionKind,
        /// `#RRGGBB`.
        pub color: String,
    }

    /// Partial update: absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub kind: Option<TransactionKind>,
        pub color: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: TransactionKind,
        pub color: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionListQuery {
        /// Inclusive lower bound, RFC 3339 or `YYYY-MM-DD`.
        pub from: Option<String>,
        /// Exclusive upper bound, RFC 3339 or `YYYY-MM-DD`.
        pub to: Option<String>,
        pub kind: Option<TransactionKind>,
        pub category_id: Option<Uuid>,
        pub limit: Option<u64>,
    }

    /// Body of both create and update: updates replace the whole record.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionWrite {
        pub kind: TransactionKind,
        pub amount: i64,
        pub category_id: Uuid,
        /// RFC 3339, or `YYYY-MM-DD` read as local midnight.
        pub occurred_at: String,
        pub description: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount: i64,
        pub category_id: Uuid,
        pub occurred_at: DateTime<Utc>,
        pub description: Option<String>,
    }
}

pub mod budget {
    use super::*;

    /// Body of both create and update.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetWrite {
        pub category_id: Uuid,
        pub month: u32,
        pub year: i32,
        /// Spending cap, > 0.
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub month: u32,
        pub year: i32,
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetStatusView {
        pub budget_id: Uuid,
        pub category_id: Uuid,
        pub category_name: String,
        pub color: String,
        pub cap: i64,
        pub spent: i64,
        /// Negative when overspent.
        pub remaining: i64,
        /// Raw usage, may exceed 100.
        pub percentage: f64,
        /// Usage clamped to 0..=100.
        pub progress: f64,
    }
}

pub mod report {
    use super::*;
    use crate::{budget::BudgetStatusView, transaction::TransactionView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryView {
        pub income: i64,
        pub expense: i64,
        pub balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryExpenseView {
        pub category_id: Uuid,
        pub name: String,
        pub color: String,
        pub amount: i64,
        pub percentage: f64,
    }

    /// A transaction with the name and color of its category.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RecentTransactionView {
        #[serde(flatten)]
        pub transaction: TransactionView,
        pub category_name: String,
        pub category_color: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DashboardView {
        pub summary: SummaryView,
        pub recent_transactions: Vec<RecentTransactionView>,
        pub expense_by_category: Vec<CategoryExpenseView>,
        pub budgets: Vec<BudgetStatusView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MonthlyReportView {
        pub month: u32,
        pub year: i32,
        pub summary: SummaryView,
        pub expense_by_category: Vec<CategoryExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryReportEntry {
        #[serde(flatten)]
        pub expense: CategoryExpenseView,
        pub transactions: Vec<TransactionView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TrendQuery {
        pub months: Option<usize>,
        pub anchor_month: Option<u32>,
        pub anchor_year: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrendPointView {
        pub month: u32,
        pub year: i32,
        pub income: i64,
        pub expense: i64,
        pub balance: i64,
    }

    /// A transaction handed to the stateless aggregation.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AggregateTransaction {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount: i64,
        pub category_id: Uuid,
        /// Free-form; rows whose date cannot be parsed are skipped.
        pub date: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AggregateBudget {
        pub id: Uuid,
        pub category_id: Uuid,
        pub month: u32,
        pub year: i32,
        pub amount: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AggregateRequest {
        #[serde(default)]
        pub transactions: Vec<AggregateTransaction>,
        #[serde(default)]
        pub categories: Vec<crate::category::CategoryView>,
        #[serde(default)]
        pub budgets: Vec<AggregateBudget>,
        pub month: u32,
        pub year: i32,
    }
}

pub mod receipt {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ScanRequest {
        /// Image bytes, base64 encoded (optionally as a `data:` URL).
        pub image_base64: String,
    }

    /// Fields guessed from the receipt; any of them may be missing.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ScanResult {
        pub amount: Option<i64>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub raw_text: String,
    }
}
