use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, TransactionKind, budgets, categories, transactions,
    util::{normalize_color, normalize_display_name, normalize_name_key},
};

use super::{Engine, with_tx};

/// Fields to change on a category; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub kind: Option<TransactionKind>,
    pub color: Option<String>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.color.is_none()
    }
}

impl Engine {
    /// List the user's categories sorted by name, optionally only one kind.
    pub async fn list_categories(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::NameNorm);
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        let model = require_category(&self.database, user_id, category_id).await?;
        Category::try_from(model)
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        name: &str,
        kind: TransactionKind,
        color: &str,
    ) -> ResultEngine<Category> {
        let name = normalize_display_name(name, "category")?;
        let color = normalize_color(color)?;
        let category = Category {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name,
            kind,
            color,
        };

        with_tx!(self, |db_tx| {
            ensure_name_free(&db_tx, user_id, &category.name, None).await?;
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await
                .map_err(|err| EngineError::on_write(err, category.name.as_str()))?;
            tracing::debug!("category {} created for {user_id}", category.id);
            Ok(category)
        })
    }

    /// Rename, recolor or change the kind of a category.
    ///
    /// The kind can only change while nothing references the category, since
    /// existing transactions must keep matching their category's kind.
    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        changes: CategoryChanges,
    ) -> ResultEngine<Category> {
        let name = changes
            .name
            .as_deref()
            .map(|name| normalize_display_name(name, "category"))
            .transpose()?;
        let color = changes.color.as_deref().map(normalize_color).transpose()?;

        with_tx!(self, |db_tx| {
            let model = require_category(&db_tx, user_id, category_id).await?;
            let mut category = Category::try_from(model)?;

            if let Some(name) = name {
                ensure_name_free(&db_tx, user_id, &name, Some(category_id)).await?;
                category.name = name;
            }
            if let Some(color) = color {
                category.color = color;
            }
            if let Some(kind) = changes.kind
                && kind != category.kind
            {
                if references(&db_tx, category_id).await? > 0 {
                    return Err(EngineError::InUse(format!(
                        "category '{}' has transactions or budgets; its kind cannot change",
                        category.name
                    )));
                }
                category.kind = kind;
            }

            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::on_write(err, category.name.as_str()))?;
            Ok(category)
        })
    }

    /// Delete a category nothing refers to.
    ///
    /// Categories with transactions or budgets are kept: deleting them would
    /// orphan history, so the caller must move or delete those rows first.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = require_category(&db_tx, user_id, category_id).await?;
            if references(&db_tx, category_id).await? > 0 {
                return Err(EngineError::InUse(format!(
                    "category '{}' still has transactions or budgets",
                    model.name
                )));
            }
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}

/// Load a category owned by `user_id`; someone else's category is reported
/// as missing.
pub(super) async fn require_category<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    category_id: Uuid,
) -> ResultEngine<categories::Model> {
    categories::Entity::find_by_id(category_id)
        .filter(categories::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    name: &str,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    let mut query = categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .filter(categories::Column::NameNorm.eq(normalize_name_key(name)));
    if let Some(id) = except {
        query = query.filter(categories::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(name.to_string()));
    }
    Ok(())
}

async fn references<C: ConnectionTrait>(db: &C, category_id: Uuid) -> ResultEngine<u64> {
    let txs = transactions::Entity::find()
        .filter(transactions::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    let budgets = budgets::Entity::find()
        .filter(budgets::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    Ok(txs + budgets)
}
