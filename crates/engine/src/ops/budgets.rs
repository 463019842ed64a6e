use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, EngineError, Money, Period, ResultEngine, TransactionKind, budgets,
};

use super::{Engine, categories::require_category, with_tx};

fn budget_conflict(err: DbErr, period: Period) -> EngineError {
    EngineError::on_write(
        err,
        format!("budget for {}/{}", period.month(), period.year()),
    )
}

/// Checks shared by create and update: positive cap, an expense category
/// owned by the user, and no other budget for the same category and month.
async fn validate_budget<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    category_id: Uuid,
    period: Period,
    cap: Money,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    cap.validate_amount("budget cap")?;

    let category = require_category(db, user_id, category_id).await?;
    if TransactionKind::try_from(category.kind.as_str())? != TransactionKind::Expense {
        return Err(EngineError::KindMismatch(format!(
            "budgets need an expense category, '{}' is for income",
            category.name
        )));
    }

    let mut query = budgets::Entity::find()
        .filter(budgets::Column::UserId.eq(user_id))
        .filter(budgets::Column::CategoryId.eq(category_id))
        .filter(budgets::Column::Month.eq(period.month() as i32))
        .filter(budgets::Column::Year.eq(period.year()));
    if let Some(id) = except {
        query = query.filter(budgets::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(format!(
            "budget for '{}' in {}/{}",
            category.name,
            period.month(),
            period.year()
        )));
    }
    Ok(())
}

impl Engine {
    /// Budgets of the user for one month.
    pub async fn list_budgets(&self, user_id: &str, period: Period) -> ResultEngine<Vec<Budget>> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::Month.eq(period.month() as i32))
            .filter(budgets::Column::Year.eq(period.year()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Budget::try_from)
            .collect()
    }

    pub async fn budget(&self, user_id: &str, id: Uuid) -> ResultEngine<Budget> {
        Budget::try_from(require_budget(&self.database, user_id, id).await?)
    }

    pub async fn create_budget(
        &self,
        user_id: &str,
        category_id: Uuid,
        period: Period,
        cap: Money,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            validate_budget(&db_tx, user_id, category_id, period, cap, None).await?;
            let budget = Budget {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                category_id,
                period,
                cap,
            };
            budgets::ActiveModel::from(&budget)
                .insert(&db_tx)
                .await
                .map_err(|err| budget_conflict(err, period))?;
            Ok(budget)
        })
    }

    /// Replace category, month and cap of an existing budget.
    pub async fn update_budget(
        &self,
        user_id: &str,
        id: Uuid,
        category_id: Uuid,
        period: Period,
        cap: Money,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            require_budget(&db_tx, user_id, id).await?;
            validate_budget(&db_tx, user_id, category_id, period, cap, Some(id)).await?;
            let budget = Budget {
                id,
                user_id: user_id.to_string(),
                category_id,
                period,
                cap,
            };
            budgets::ActiveModel::from(&budget)
                .update(&db_tx)
                .await
                .map_err(|err| budget_conflict(err, period))?;
            Ok(budget)
        })
    }

    pub async fn delete_budget(&self, user_id: &str, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_budget(&db_tx, user_id, id).await?;
            budgets::Entity::delete_by_id(id).exec(&db_tx).await?;
            Ok(())
        })
    }
}

async fn require_budget<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    id: Uuid,
) -> ResultEngine<budgets::Model> {
    budgets::Entity::find_by_id(id)
        .filter(budgets::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))
}
