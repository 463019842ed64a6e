//! Conversions from engine values to wire types.

use api_types::{
    TransactionKind as WireKind,
    budget::{BudgetStatusView, BudgetView},
    category::CategoryView,
    report::{CategoryExpenseView, RecentTransactionView, SummaryView, TrendPointView},
    transaction::TransactionView,
};
use engine::{
    Budget, BudgetStatus, Category, CategoryExpense, MonthlySummary, RecentTransaction,
    Transaction, TransactionKind, TrendPoint,
};

pub(crate) fn kind_from_wire(kind: WireKind) -> TransactionKind {
    match kind {
        WireKind::Income => TransactionKind::Income,
        WireKind::Expense => TransactionKind::Expense,
    }
}

pub(crate) fn kind_to_wire(kind: TransactionKind) -> WireKind {
    match kind {
        TransactionKind::Income => WireKind::Income,
        TransactionKind::Expense => WireKind::Expense,
    }
}

pub(crate) fn category_view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: kind_to_wire(category.kind),
        color: category.color,
    }
}

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: kind_to_wire(tx.kind),
        amount: tx.amount.minor(),
        category_id: tx.category_id,
        occurred_at: tx.occurred_at,
        description: tx.description,
    }
}

pub(crate) fn recent_transaction_view(recent: RecentTransaction) -> RecentTransactionView {
    RecentTransactionView {
        transaction: transaction_view(recent.transaction),
        category_name: recent.category_name,
        category_color: recent.color,
    }
}

pub(crate) fn budget_view(budget: Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        category_id: budget.category_id,
        month: budget.period.month(),
        year: budget.period.year(),
        amount: budget.cap.minor(),
    }
}

pub(crate) fn budget_status_view(status: BudgetStatus) -> BudgetStatusView {
    BudgetStatusView {
        progress: status.progress(),
        budget_id: status.budget_id,
        category_id: status.category_id,
        category_name: status.category_name,
        color: status.color,
        cap: status.cap.minor(),
        spent: status.spent.minor(),
        remaining: status.remaining.minor(),
        percentage: status.percentage,
    }
}

pub(crate) fn summary_view(summary: MonthlySummary) -> SummaryView {
    SummaryView {
        income: summary.income.minor(),
        expense: summary.expense.minor(),
        balance: summary.balance.minor(),
    }
}

pub(crate) fn category_expense_view(expense: CategoryExpense) -> CategoryExpenseView {
    CategoryExpenseView {
        category_id: expense.category_id,
        name: expense.name,
        color: expense.color,
        amount: expense.amount.minor(),
        percentage: expense.percentage,
    }
}

pub(crate) fn trend_point_view(point: TrendPoint) -> TrendPointView {
    TrendPointView {
        month: point.period.month(),
        year: point.period.year(),
        income: point.income.minor(),
        expense: point.expense.minor(),
        balance: point.balance.minor(),
    }
}
