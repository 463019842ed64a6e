use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Transaction, TransactionKind,
    transactions::{self, decode_rows},
    util::{format_timestamp, normalize_optional_text},
};

use super::{Engine, categories::require_category, with_tx};

const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 500;

/// Everything a caller supplies for a transaction. Updates replace the whole
/// record with a new input.
#[derive(Clone, Debug)]
pub struct TransactionInput {
    pub kind: TransactionKind,
    pub amount: Money,
    pub category_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Uuid>,
    /// Defaults to 50, capped at 500.
    pub limit: Option<u64>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidPeriod(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.limit == Some(0) {
        return Err(EngineError::InvalidAmount("limit must be > 0".to_string()));
    }
    Ok(())
}

/// The category must belong to the user and have the transaction's kind.
async fn validate_input<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    input: &TransactionInput,
) -> ResultEngine<()> {
    input.amount.validate_amount("amount")?;
    let category = require_category(db, user_id, input.category_id).await?;
    let category_kind = TransactionKind::try_from(category.kind.as_str())?;
    if category_kind != input.kind {
        return Err(EngineError::KindMismatch(format!(
            "category '{}' is for {} transactions, got {}",
            category.name,
            category_kind.as_str(),
            input.kind.as_str()
        )));
    }
    Ok(())
}

impl Engine {
    pub async fn create_transaction(
        &self,
        user_id: &str,
        input: TransactionInput,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            validate_input(&db_tx, user_id, &input).await?;
            let tx = Transaction::new(
                user_id,
                input.kind,
                input.amount,
                input.category_id,
                input.occurred_at.trunc_subsecs(0),
                normalize_optional_text(input.description.as_deref()),
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok(tx)
        })
    }

    /// Fetch one transaction. Other users' transactions are reported as
    /// missing.
    pub async fn transaction(&self, user_id: &str, id: Uuid) -> ResultEngine<Transaction> {
        let model = require_transaction(&self.database, user_id, id).await?;
        Transaction::try_from(model)
    }

    /// Replace every field of an existing transaction.
    pub async fn update_transaction(
        &self,
        user_id: &str,
        id: Uuid,
        input: TransactionInput,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            require_transaction(&db_tx, user_id, id).await?;
            validate_input(&db_tx, user_id, &input).await?;
            let tx = Transaction {
                id,
                user_id: user_id.to_string(),
                kind: input.kind,
                amount: input.amount,
                category_id: input.category_id,
                occurred_at: input.occurred_at.trunc_subsecs(0),
                description: normalize_optional_text(input.description.as_deref()),
            };
            transactions::ActiveModel::from(&tx).update(&db_tx).await?;
            Ok(tx)
        })
    }

    pub async fn delete_transaction(&self, user_id: &str, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_transaction(&db_tx, user_id, id).await?;
            transactions::Entity::delete_by_id(id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// List transactions newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT));
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredAt.gte(format_timestamp(from)));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredAt.lt(format_timestamp(to)));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }

        Ok(decode_rows(query.all(&self.database).await?))
    }

    /// Every transaction of the user in `[from, to)`, oldest first.
    pub(super) async fn transactions_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::OccurredAt.gte(format_timestamp(from)))
            .filter(transactions::Column::OccurredAt.lt(format_timestamp(to)))
            .order_by_asc(transactions::Column::OccurredAt)
            .all(&self.database)
            .await?;
        Ok(decode_rows(models))
    }

    /// The user's newest transactions, regardless of period.
    pub(super) async fn latest_transactions(
        &self,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?;
        Ok(decode_rows(models))
    }
}

async fn require_transaction<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    id: Uuid,
) -> ResultEngine<transactions::Model> {
    transactions::Entity::find_by_id(id)
        .filter(transactions::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
}
