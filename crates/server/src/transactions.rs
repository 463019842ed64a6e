use api_types::{
    Envelope,
    transaction::{TransactionListQuery, TransactionView, TransactionWrite},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use engine::{EngineError, Money, TransactionInput, TransactionListFilter, parse_timestamp};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{AppJson, AppPath, AppQuery},
    server::ServerState,
    user,
    views::{kind_from_wire, transaction_view},
};

fn parse_date(state: &ServerState, raw: &str, field: &str) -> Result<DateTime<Utc>, ServerError> {
    parse_timestamp(raw, state.engine.timezone()).ok_or_else(|| {
        EngineError::InvalidDate(format!("{field}: expected RFC 3339 or YYYY-MM-DD, got '{raw}'"))
            .into()
    })
}

fn input_from_wire(
    state: &ServerState,
    payload: TransactionWrite,
) -> Result<TransactionInput, ServerError> {
    Ok(TransactionInput {
        kind: kind_from_wire(payload.kind),
        amount: Money::new(payload.amount),
        category_id: payload.category_id,
        occurred_at: parse_date(state, &payload.occurred_at, "occurredAt")?,
        description: payload.description,
    })
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<TransactionListQuery>,
) -> Result<Json<Envelope<Vec<TransactionView>>>, ServerError> {
    let filter = TransactionListFilter {
        from: query
            .from
            .as_deref()
            .map(|raw| parse_date(&state, raw, "from"))
            .transpose()?,
        to: query
            .to
            .as_deref()
            .map(|raw| parse_date(&state, raw, "to"))
            .transpose()?,
        kind: query.kind.map(kind_from_wire),
        category_id: query.category_id,
        limit: query.limit,
    };

    let transactions = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?
        .into_iter()
        .map(transaction_view)
        .collect();
    Ok(Json(Envelope::ok(transactions)))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Envelope<TransactionView>>, ServerError> {
    let tx = state.engine.transaction(&user.username, id).await?;
    Ok(Json(Envelope::ok(transaction_view(tx))))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppJson(payload): AppJson<TransactionWrite>,
) -> Result<(StatusCode, Json<Envelope<TransactionView>>), ServerError> {
    let input = input_from_wire(&state, payload)?;
    let tx = state
        .engine
        .create_transaction(&user.username, input)
        .await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(transaction_view(tx)))))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TransactionWrite>,
) -> Result<Json<Envelope<TransactionView>>, ServerError> {
    let input = input_from_wire(&state, payload)?;
    let tx = state
        .engine
        .update_transaction(&user.username, id, input)
        .await?;
    Ok(Json(Envelope::ok(transaction_view(tx))))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Envelope<()>>, ServerError> {
    state.engine.delete_transaction(&user.username, id).await?;
    Ok(Json(Envelope::ok(())))
}
