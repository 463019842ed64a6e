//! Dashboard and report endpoints.

use api_types::{
    Envelope, PeriodQuery,
    report::{
        AggregateRequest, CategoryReportEntry, DashboardView, MonthlyReportView, TrendPointView,
        TrendQuery,
    },
};
use axum::{Extension, Json, extract::State};
use engine::{
    Budget, Category, Dashboard, EngineError, Money, Period, Transaction, aggregation,
    parse_timestamp,
};

use crate::{
    ServerError,
    extract::{AppJson, AppQuery},
    server::ServerState,
    user,
    views::{
        budget_status_view, category_expense_view, kind_from_wire, recent_transaction_view,
        summary_view, transaction_view, trend_point_view,
    },
};

/// The requested month, falling back to the current one for missing parts.
pub(crate) fn resolve_period(
    state: &ServerState,
    month: Option<u32>,
    year: Option<i32>,
) -> Result<Period, ServerError> {
    let current = state.engine.current_period();
    Ok(Period::new(
        year.unwrap_or(current.year()),
        month.unwrap_or(current.month()),
    )?)
}

fn dashboard_view(dashboard: Dashboard) -> DashboardView {
    DashboardView {
        summary: summary_view(dashboard.summary),
        recent_transactions: dashboard
            .recent_transactions
            .into_iter()
            .map(recent_transaction_view)
            .collect(),
        expense_by_category: dashboard
            .expense_by_category
            .into_iter()
            .map(category_expense_view)
            .collect(),
        budgets: dashboard
            .budgets
            .into_iter()
            .map(budget_status_view)
            .collect(),
    }
}

pub async fn dashboard(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> Result<Json<Envelope<DashboardView>>, ServerError> {
    let period = resolve_period(&state, query.month, query.year)?;
    let dashboard = state.engine.dashboard(&user.username, period).await?;
    Ok(Json(Envelope::ok(dashboard_view(dashboard))))
}

pub async fn monthly(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> Result<Json<Envelope<MonthlyReportView>>, ServerError> {
    let period = resolve_period(&state, query.month, query.year)?;
    let report = state.engine.monthly_report(&user.username, period).await?;
    Ok(Json(Envelope::ok(MonthlyReportView {
        month: report.period.month(),
        year: report.period.year(),
        summary: summary_view(report.summary),
        expense_by_category: report
            .expense_by_category
            .into_iter()
            .map(category_expense_view)
            .collect(),
    })))
}

pub async fn categories(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> Result<Json<Envelope<Vec<CategoryReportEntry>>>, ServerError> {
    let period = resolve_period(&state, query.month, query.year)?;
    let entries = state
        .engine
        .category_report(&user.username, period)
        .await?
        .into_iter()
        .map(|detail| {
            let mut transactions = detail.transactions;
            transactions.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            CategoryReportEntry {
                expense: category_expense_view(detail.expense),
                transactions: transactions.into_iter().map(transaction_view).collect(),
            }
        })
        .collect();
    Ok(Json(Envelope::ok(entries)))
}

pub async fn trends(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<TrendQuery>,
) -> Result<Json<Envelope<Vec<TrendPointView>>>, ServerError> {
    let anchor = resolve_period(&state, query.anchor_month, query.anchor_year)?;
    let points = state
        .engine
        .trend(&user.username, anchor, query.months)
        .await?
        .into_iter()
        .map(trend_point_view)
        .collect();
    Ok(Json(Envelope::ok(points)))
}

/// Dashboard over caller supplied rows; nothing is read from storage.
pub async fn aggregate(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppJson(payload): AppJson<AggregateRequest>,
) -> Result<Json<Envelope<DashboardView>>, ServerError> {
    let period = Period::new(payload.year, payload.month)?;
    let tz = state.engine.timezone();

    let mut transactions: Vec<Transaction> = Vec::with_capacity(payload.transactions.len());
    for tx in payload.transactions {
        let amount = Money::new(tx.amount).validate_amount("amount")?;
        let Some(occurred_at) = parse_timestamp(&tx.date, tz) else {
            tracing::warn!("skipping transaction {} with unparseable date '{}'", tx.id, tx.date);
            continue;
        };
        transactions.push(Transaction {
            id: tx.id,
            user_id: user.username.clone(),
            kind: kind_from_wire(tx.kind),
            amount,
            category_id: tx.category_id,
            occurred_at,
            description: tx.description,
        });
    }
    let in_month: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| period.contains(tx.occurred_at, tz))
        .cloned()
        .collect();

    let categories: Vec<Category> = payload
        .categories
        .into_iter()
        .map(|category| Category {
            id: category.id,
            user_id: user.username.clone(),
            name: category.name,
            kind: kind_from_wire(category.kind),
            color: category.color,
        })
        .collect();

    let budgets: Vec<Budget> = payload
        .budgets
        .into_iter()
        .filter(|budget| budget.month == period.month() && budget.year == period.year())
        .map(|budget| {
            Ok(Budget {
                id: budget.id,
                user_id: user.username.clone(),
                category_id: budget.category_id,
                period,
                cap: stateless_cap(budget.amount)?,
            })
        })
        .collect::<Result<_, EngineError>>()?;

    let dashboard = aggregation::dashboard(&in_month, &transactions, &categories, &budgets);
    Ok(Json(Envelope::ok(dashboard_view(dashboard))))
}

/// Caps sent to the stateless endpoint may be zero, unlike stored ones.
fn stateless_cap(amount: i64) -> Result<Money, EngineError> {
    let cap = Money::new(amount);
    if cap.is_zero() {
        return Ok(cap);
    }
    cap.validate_amount("budget cap")
}
