use api_types::{
    Envelope,
    receipt::{ScanRequest, ScanResult},
};
use axum::{Extension, Json, extract::State};
use receipt::ReceiptError;

use crate::{ServerError, extract::AppJson, server::ServerState, user};

/// Read a receipt image and suggest amount, category and description.
pub async fn scan(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    AppJson(payload): AppJson<ScanRequest>,
) -> Result<Json<Envelope<ScanResult>>, ServerError> {
    let scanner = state.receipts.as_ref().ok_or(ReceiptError::MissingApiKey)?;
    let scan = scanner.scan(&payload.image_base64).await?;
    tracing::debug!(
        "receipt scanned for {}: amount {:?}",
        user.username,
        scan.fields.amount
    );

    Ok(Json(Envelope::ok(ScanResult {
        amount: scan.fields.amount.map(|amount| amount.minor()),
        category: scan.fields.category,
        description: scan.fields.description,
        raw_text: scan.raw_text,
    })))
}
