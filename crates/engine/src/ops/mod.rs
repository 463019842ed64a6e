use chrono_tz::Tz;
use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod budgets;
mod categories;
mod reports;
mod transactions;

pub use categories::CategoryChanges;
pub use reports::{DEFAULT_TREND_MONTHS, MonthlyReport};
pub use transactions::{TransactionInput, TransactionListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Stores and reports for every user.
///
/// Cheap to share behind an `Arc`: it only holds the connection pool and
/// immutable configuration.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    timezone: Tz,
    trend_months: usize,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Timezone used to decide which month a timestamp belongs to.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn trend_months(&self) -> usize {
        self.trend_months
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    timezone: Tz,
    trend_months: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            timezone: Tz::UTC,
            trend_months: DEFAULT_TREND_MONTHS,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.timezone = timezone;
        self
    }

    /// Default window of the trend report.
    pub fn trend_months(mut self, months: usize) -> EngineBuilder {
        self.trend_months = months.max(1);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            timezone: self.timezone,
            trend_months: self.trend_months,
        })
    }
}
