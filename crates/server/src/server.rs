use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use receipt::ReceiptScanner;
use sea_orm::DatabaseConnection;

use std::sync::Arc;

use crate::{ServerError, budgets, categories, receipts, reports, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    /// `None` when no OCR credentials are configured.
    pub receipts: Option<Arc<ReceiptScanner>>,
}

impl ServerState {
    pub fn new(engine: Engine, db: DatabaseConnection, receipts: Option<ReceiptScanner>) -> Self {
        Self {
            engine: Arc::new(engine),
            db,
            receipts: receipts.map(Arc::new),
        }
    }
}

/// HTTP Basic authentication against the users table.
///
/// The authenticated `user::Model` is stored in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(ServerError::Unauthorized);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(ServerError::Unauthorized);
    }

    let user = user::authenticate(&state.db, auth_header.username(), auth_header.password())
        .await?
        .ok_or(ServerError::Unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::get)
                .patch(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .patch(budgets::update)
                .delete(budgets::delete),
        )
        .route("/dashboard", get(reports::dashboard))
        .route("/reports/monthly", get(reports::monthly))
        .route("/reports/categories", get(reports::categories))
        .route("/reports/trends", get(reports::trends))
        .route("/reports/aggregate", post(reports::aggregate))
        .route("/receipts/scan", post(receipts::scan))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/auth/register", post(user::register))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
