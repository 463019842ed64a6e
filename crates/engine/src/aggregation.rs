//! Reductions from raw transactions to the views the dashboard and reports
//! show.
//!
//! Everything here is pure: the same inputs always give the same outputs and
//! nothing is cached between calls. Lookups that fail (a transaction pointing
//! at a deleted category, a budget for a category that is gone) degrade to an
//! "unknown category" placeholder instead of failing the whole reduction.
//!
//! Division by zero policies:
//! - category share of an empty expense total: the denominator becomes 1,
//!   so every group reports 0%.
//! - budget usage with a zero cap: 0% when nothing was spent, 100% otherwise.

use std::collections::HashMap;

use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    Budget, Category, Money, Period, Transaction, TransactionKind,
    categories::{UNKNOWN_CATEGORY_COLOR, UNKNOWN_CATEGORY_NAME},
};

/// How many transactions the dashboard lists.
pub const RECENT_TRANSACTIONS: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonthlySummary {
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryExpense {
    pub category_id: Uuid,
    pub name: String,
    pub color: String,
    pub amount: Money,
    /// Share of the total expense, 0..=100.
    pub percentage: f64,
}

/// A breakdown entry together with the transactions it sums.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryDetail {
    pub expense: CategoryExpense,
    pub transactions: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub color: String,
    pub cap: Money,
    pub spent: Money,
    /// Raw usage; above 100 when overspent.
    pub percentage: f64,
    /// Negative when overspent.
    pub remaining: Money,
}

impl BudgetStatus {
    /// Usage clamped to `0..=100`, for progress bars.
    pub fn progress(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }

    pub fn is_overspent(&self) -> bool {
        self.remaining.minor() < 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrendPoint {
    pub period: Period,
    pub income: Money,
    pub expense: Money,
    pub balance: Money,
}

/// A dashboard row, labelled with its category.
#[derive(Clone, Debug, PartialEq)]
pub struct RecentTransaction {
    pub transaction: Transaction,
    pub category_name: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub summary: MonthlySummary,
    pub recent_transactions: Vec<RecentTransaction>,
    pub expense_by_category: Vec<CategoryExpense>,
    pub budgets: Vec<BudgetStatus>,
}

struct CategoryLabel<'a> {
    name: &'a str,
    color: &'a str,
}

fn index_categories(categories: &[Category]) -> HashMap<Uuid, CategoryLabel<'_>> {
    categories
        .iter()
        .map(|category| {
            (
                category.id,
                CategoryLabel {
                    name: category.name.as_str(),
                    color: category.color.as_str(),
                },
            )
        })
        .collect()
}

fn label_for<'a>(index: &HashMap<Uuid, CategoryLabel<'a>>, id: Uuid) -> (String, String) {
    match index.get(&id) {
        Some(label) => (label.name.to_string(), label.color.to_string()),
        None => {
            tracing::warn!("category {id} not found, using placeholder");
            (
                UNKNOWN_CATEGORY_NAME.to_string(),
                UNKNOWN_CATEGORY_COLOR.to_string(),
            )
        }
    }
}

fn total_of(transactions: &[Transaction], kind: TransactionKind) -> Money {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

fn share(part: Money, total: Money) -> f64 {
    let denominator = if total.is_zero() { 1.0 } else { total.as_f64() };
    part.as_f64() / denominator * 100.0
}

/// Income, expense and their difference.
pub fn monthly_summary(transactions: &[Transaction]) -> MonthlySummary {
    let income = total_of(transactions, TransactionKind::Income);
    let expense = total_of(transactions, TransactionKind::Expense);
    MonthlySummary {
        income,
        expense,
        balance: income - expense,
    }
}

/// Expenses grouped by category, in order of first appearance.
pub fn category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryExpense> {
    category_details(transactions, categories)
        .into_iter()
        .map(|detail| detail.expense)
        .collect()
}

/// Like [`category_breakdown`], keeping the transactions of each group.
pub fn category_details(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryDetail> {
    let index = index_categories(categories);
    let total = total_of(transactions, TransactionKind::Expense);

    let mut positions: HashMap<Uuid, usize> = HashMap::new();
    let mut details: Vec<CategoryDetail> = Vec::new();

    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
    {
        let position = *positions.entry(tx.category_id).or_insert_with(|| {
            let (name, color) = label_for(&index, tx.category_id);
            details.push(CategoryDetail {
                expense: CategoryExpense {
                    category_id: tx.category_id,
                    name,
                    color,
                    amount: Money::ZERO,
                    percentage: 0.0,
                },
                transactions: Vec::new(),
            });
            details.len() - 1
        });
        let detail = &mut details[position];
        detail.expense.amount += tx.amount;
        detail.transactions.push(tx.clone());
    }

    for detail in &mut details {
        detail.expense.percentage = share(detail.expense.amount, total);
    }
    details
}

/// Sort a breakdown by amount, largest first. Ties keep their order.
pub fn sort_by_amount_desc(breakdown: &mut [CategoryExpense]) {
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount));
}

/// Usage of `cap` after spending `spent`, in percent.
pub fn budget_percentage(spent: Money, cap: Money) -> f64 {
    if cap.minor() <= 0 {
        return if spent.is_positive() { 100.0 } else { 0.0 };
    }
    spent.as_f64() / cap.as_f64() * 100.0
}

/// Spent/remaining for each budget.
///
/// `budgets` must already be restricted to the period and `transactions` to
/// the same period.
pub fn budget_status(
    budgets: &[Budget],
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<BudgetStatus> {
    let index = index_categories(categories);

    let mut spent_by_category: HashMap<Uuid, Money> = HashMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
    {
        *spent_by_category.entry(tx.category_id).or_default() += tx.amount;
    }

    budgets
        .iter()
        .map(|budget| {
            let spent = spent_by_category
                .get(&budget.category_id)
                .copied()
                .unwrap_or_default();
            let (category_name, color) = label_for(&index, budget.category_id);
            BudgetStatus {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name,
                color,
                cap: budget.cap,
                spent,
                percentage: budget_percentage(spent, budget.cap),
                remaining: budget.cap - spent,
            }
        })
        .collect()
}

/// `window_months` monthly totals ending at `anchor`, oldest first.
///
/// Month membership is decided in `tz`; transactions outside the window are
/// ignored.
pub fn trend_series(
    transactions: &[Transaction],
    window_months: usize,
    anchor: Period,
    tz: Tz,
) -> Vec<TrendPoint> {
    let mut totals: HashMap<Period, (Money, Money)> = HashMap::new();
    for tx in transactions {
        let entry = totals
            .entry(Period::containing(tx.occurred_at, tz))
            .or_default();
        match tx.kind {
            TransactionKind::Income => entry.0 += tx.amount,
            TransactionKind::Expense => entry.1 += tx.amount,
        }
    }

    anchor
        .window(window_months)
        .into_iter()
        .map(|period| {
            let (income, expense) = totals.get(&period).copied().unwrap_or_default();
            TrendPoint {
                period,
                income,
                expense,
                balance: income - expense,
            }
        })
        .collect()
}

/// The `limit` newest transactions, newest first.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Everything the dashboard shows for one month.
///
/// `month_transactions` and `budgets` belong to the month; `recent` is the
/// pool the recent list is drawn from (the dashboard uses all of the user's
/// transactions, not only the month's).
pub fn dashboard(
    month_transactions: &[Transaction],
    recent: &[Transaction],
    categories: &[Category],
    budgets: &[Budget],
) -> Dashboard {
    let index = index_categories(categories);
    let recent_transactions = recent_transactions(recent, RECENT_TRANSACTIONS)
        .into_iter()
        .map(|transaction| {
            let (category_name, color) = label_for(&index, transaction.category_id);
            RecentTransaction {
                transaction,
                category_name,
                color,
            }
        })
        .collect();

    Dashboard {
        summary: monthly_summary(month_transactions),
        recent_transactions,
        expense_by_category: category_breakdown(month_transactions, categories),
        budgets: budget_status(budgets, month_transactions, categories),
    }
}
