use api_types::{
    Envelope, PeriodQuery,
    budget::{BudgetStatusView, BudgetView, BudgetWrite},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Money, Period};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{AppJson, AppPath, AppQuery},
    reports::resolve_period,
    server::ServerState,
    user,
    views::{budget_status_view, budget_view},
};

/// Budgets of the month with their spending.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> Result<Json<Envelope<Vec<BudgetStatusView>>>, ServerError> {
    let period = resolve_period(&state, query.month, query.year)?;
    let statuses = state
        .engine
        .budget_statuses(&user.username, period)
        .await?
        .into_iter()
        .map(budget_status_view)
        .collect();
    Ok(Json(Envelope::ok(statuses)))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Envelope<BudgetView>>, ServerError> {
    let budget = state.engine.budget(&user.username, id).await?;
    Ok(Json(Envelope::ok(budget_view(budget))))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppJson(payload): AppJson<BudgetWrite>,
) -> Result<(StatusCode, Json<Envelope<BudgetView>>), ServerError> {
    let period = Period::new(payload.year, payload.month)?;
    let budget = state
        .engine
        .create_budget(
            &user.username,
            payload.category_id,
            period,
            Money::new(payload.amount),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(budget_view(budget)))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<BudgetWrite>,
) -> Result<Json<Envelope<BudgetView>>, ServerError> {
    let period = Period::new(payload.year, payload.month)?;
    let budget = state
        .engine
        .update_budget(
            &user.username,
            id,
            payload.category_id,
            period,
            Money::new(payload.amount),
        )
        .await?;
    Ok(Json(Envelope::ok(budget_view(budget))))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Envelope<()>>, ServerError> {
    state.engine.delete_budget(&user.username, id).await?;
    Ok(Json(Envelope::ok(())))
}
