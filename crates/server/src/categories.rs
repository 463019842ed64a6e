//! Categories API endpoints.

use api_types::{
    Envelope,
    category::{CategoryListQuery, CategoryNew, CategoryUpdate, CategoryView},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::CategoryChanges;
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{AppJson, AppPath, AppQuery},
    server::ServerState,
    user,
    views::{category_view, kind_from_wire},
};

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<CategoryListQuery>,
) -> Result<Json<Envelope<Vec<CategoryView>>>, ServerError> {
    let categories = state
        .engine
        .list_categories(&user.username, query.kind.map(kind_from_wire))
        .await?
        .into_iter()
        .map(category_view)
        .collect();

    Ok(Json(Envelope::ok(categories)))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(category_id): AppPath<Uuid>,
) -> Result<Json<Envelope<CategoryView>>, ServerError> {
    let category = state.engine.category(&user.username, category_id).await?;
    Ok(Json(Envelope::ok(category_view(category))))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppJson(payload): AppJson<CategoryNew>,
) -> Result<(StatusCode, Json<Envelope<CategoryView>>), ServerError> {
    let category = state
        .engine
        .create_category(
            &user.username,
            &payload.name,
            kind_from_wire(payload.kind),
            &payload.color,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(category_view(category)))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(category_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CategoryUpdate>,
) -> Result<Json<Envelope<CategoryView>>, ServerError> {
    let changes = CategoryChanges {
        name: payload.name,
        kind: payload.kind.map(kind_from_wire),
        color: payload.color,
    };
    if changes.is_empty() {
        return Err(ServerError::Generic("nothing to update".to_string()));
    }

    let category = state
        .engine
        .update_category(&user.username, category_id, changes)
        .await?;
    Ok(Json(Envelope::ok(category_view(category))))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(category_id): AppPath<Uuid>,
) -> Result<Json<Envelope<()>>, ServerError> {
    state
        .engine
        .delete_category(&user.username, category_id)
        .await?;
    Ok(Json(Envelope::ok(())))
}
