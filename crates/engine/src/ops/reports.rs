//! Loading side of the reports: fetch the rows a period needs, then hand
//! them to the pure reductions in [`crate::aggregation`].

use chrono::Utc;

use crate::{
    BudgetStatus, Category, EngineError, Period, ResultEngine, TrendPoint,
    aggregation::{self, CategoryDetail, CategoryExpense, Dashboard, MonthlySummary},
};

use super::Engine;

/// Months shown by the trend chart unless configured otherwise.
pub const DEFAULT_TREND_MONTHS: usize = 6;
const MAX_TREND_MONTHS: usize = 120;

/// Summary plus the breakdown sorted by amount.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyReport {
    pub period: Period,
    pub summary: MonthlySummary,
    pub expense_by_category: Vec<CategoryExpense>,
}

impl Engine {
    /// The month `now` falls in, in the configured timezone.
    pub fn current_period(&self) -> Period {
        Period::containing(Utc::now(), self.timezone)
    }

    async fn month_transactions(
        &self,
        user_id: &str,
        period: Period,
    ) -> ResultEngine<Vec<crate::Transaction>> {
        let (from, to) = period.utc_bounds(self.timezone);
        self.transactions_between(user_id, from, to).await
    }

    async fn all_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        self.list_categories(user_id, None).await
    }

    pub async fn dashboard(&self, user_id: &str, period: Period) -> ResultEngine<Dashboard> {
        let month = self.month_transactions(user_id, period).await?;
        let recent = self
            .latest_transactions(user_id, aggregation::RECENT_TRANSACTIONS as u64)
            .await?;
        let categories = self.all_categories(user_id).await?;
        let budgets = self.list_budgets(user_id, period).await?;

        tracing::debug!(
            "dashboard for {user_id} {}/{}: {} transactions, {} budgets",
            period.month(),
            period.year(),
            month.len(),
            budgets.len()
        );
        Ok(aggregation::dashboard(&month, &recent, &categories, &budgets))
    }

    pub async fn monthly_report(&self, user_id: &str, period: Period) -> ResultEngine<MonthlyReport> {
        let month = self.month_transactions(user_id, period).await?;
        let categories = self.all_categories(user_id).await?;

        let mut expense_by_category = aggregation::category_breakdown(&month, &categories);
        aggregation::sort_by_amount_desc(&mut expense_by_category);
        Ok(MonthlyReport {
            period,
            summary: aggregation::monthly_summary(&month),
            expense_by_category,
        })
    }

    /// Breakdown of the month, largest category first, with its transactions.
    pub async fn category_report(
        &self,
        user_id: &str,
        period: Period,
    ) -> ResultEngine<Vec<CategoryDetail>> {
        let month = self.month_transactions(user_id, period).await?;
        let categories = self.all_categories(user_id).await?;

        let mut details = aggregation::category_details(&month, &categories);
        details.sort_by(|a, b| b.expense.amount.cmp(&a.expense.amount));
        Ok(details)
    }

    pub async fn budget_statuses(
        &self,
        user_id: &str,
        period: Period,
    ) -> ResultEngine<Vec<BudgetStatus>> {
        let month = self.month_transactions(user_id, period).await?;
        let categories = self.all_categories(user_id).await?;
        let budgets = self.list_budgets(user_id, period).await?;
        Ok(aggregation::budget_status(&budgets, &month, &categories))
    }

    /// Monthly totals for the `months` months ending at `anchor`.
    pub async fn trend(
        &self,
        user_id: &str,
        anchor: Period,
        months: Option<usize>,
    ) -> ResultEngine<Vec<TrendPoint>> {
        let months = months.unwrap_or(self.trend_months);
        if months == 0 || months > MAX_TREND_MONTHS {
            return Err(EngineError::InvalidPeriod(format!(
                "trend window must be between 1 and {MAX_TREND_MONTHS} months"
            )));
        }

        let window = anchor.window(months);
        let first = window.first().copied().unwrap_or(anchor);
        let from = first.start_utc(self.timezone);
        let to = anchor.next().start_utc(self.timezone);
        let transactions = self.transactions_between(user_id, from, to).await?;

        Ok(aggregation::trend_series(
            &transactions,
            months,
            anchor,
            self.timezone,
        ))
    }
}
