//! Monthly spending caps, one per (user, category, month, year).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Period};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub period: Period,
    pub cap: Money,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub category_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub cap_minor: i64,
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

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let month = u32::try_from(model.month)
            .map_err(|_| EngineError::InvalidPeriod(format!("invalid month {}", model.month)))?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            period: Period::new(model.year, month)?,
            cap: Money::new(model.cap_minor),
        })
    }
}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id),
            user_id: ActiveValue::Set(budget.user_id.clone()),
            category_id: ActiveValue::Set(budget.category_id),
            month: ActiveValue::Set(budget.period.month() as i32),
            year: ActiveValue::Set(budget.period.year()),
            cap_minor: ActiveValue::Set(budget.cap.minor()),
        }
    }
}
