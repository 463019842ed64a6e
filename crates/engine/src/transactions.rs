//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense event. Amounts are always
//! positive; the kind tells which side of the monthly summary it lands on.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{format_timestamp, parse_timestamp},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::KindMismatch(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub category_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(
        user_id: &str,
        kind: TransactionKind,
        amount: Money,
        category_id: Uuid,
        occurred_at: DateTime<Utc>,
        description: Option<String>,
    ) -> ResultEngine<Self> {
        amount.validate_amount("amount")?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            kind,
            amount,
            category_id,
            occurred_at,
            description,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub category_id: Uuid,
    /// RFC 3339 UTC text, see `util::format_timestamp`.
    pub occurred_at: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            category_id: ActiveValue::Set(tx.category_id),
            occurred_at: ActiveValue::Set(format_timestamp(tx.occurred_at)),
            description: ActiveValue::Set(tx.description.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let occurred_at = parse_timestamp(&model.occurred_at, Tz::UTC).ok_or_else(|| {
            EngineError::InvalidDate(format!(
                "transaction {} has unparseable date '{}'",
                model.id, model.occurred_at
            ))
        })?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            category_id: model.category_id,
            occurred_at,
            description: model.description,
        })
    }
}

/// Convert stored rows, dropping the ones that cannot be decoded.
///
/// A single corrupt row must not hide the rest of a report, so failures are
/// logged and skipped instead of propagated.
pub(crate) fn decode_rows(models: Vec<Model>) -> Vec<Transaction> {
    models
        .into_iter()
        .filter_map(|model| match Transaction::try_from(model) {
            Ok(tx) => Some(tx),
            Err(err) => {
                tracing::warn!("skipping transaction row: {err}");
                None
            }
        })
        .collect()
}
