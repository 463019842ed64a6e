use api_types::Envelope;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;
use receipt::ReceiptError;
use sea_orm::DbErr;

pub use server::{ServerState, router, run_with_listener};

mod budgets;
mod categories;
mod extract;
mod receipts;
mod reports;
mod server;
mod transactions;
mod user;
mod views;

pub enum ServerError {
    Engine(EngineError),
    Receipt(ReceiptError),
    Unauthorized,
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::InUse(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidPeriod(_)
        | EngineError::InvalidDate(_)
        | EngineError::KindMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn response_for_receipt_error(err: ReceiptError) -> (StatusCode, String) {
    match err {
        ReceiptError::MissingApiKey => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        ReceiptError::EmptyImage | ReceiptError::InvalidImage(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        ReceiptError::Network(_) | ReceiptError::Vision { .. } => {
            tracing::error!("receipt scan failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "receipt service unavailable".to_string(),
            )
        }
        ReceiptError::Pattern(_) => {
            tracing::error!("receipt extractor failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Receipt(err) => response_for_receipt_error(err),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Envelope::err(error))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<DbErr> for ServerError {
    fn from(value: DbErr) -> Self {
        Self::Engine(EngineError::Database(value))
    }
}

impl From<ReceiptError> for ServerError {
    fn from(value: ReceiptError) -> Self {
        Self::Receipt(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflicts_map_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(EngineError::InUse("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidPeriod("x".to_string()),
            EngineError::KindMismatch("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn database_errors_are_masked() {
        let err = ServerError::from(DbErr::Custom("disk on fire".to_string()));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unconfigured_scanner_maps_to_503() {
        let res = ServerError::from(ReceiptError::MissingApiKey).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
