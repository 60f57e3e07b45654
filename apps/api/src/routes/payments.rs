//! Payment endpoints: KHQR generation and verification.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use bayon_khqr::{qr, PaymentGateway};

use crate::error::{success, ApiError, ApiResult};
use crate::extract::UserId;
use crate::state::AppState;

/// Mints the per-checkout bill number embedded in the QR (EMV 62-01).
///
/// The merchant identity and amount repeat across purchases; this is
/// the field that gives every QR, and therefore every MD5 transaction
/// reference, its own identity. 20 hex characters fit the EMV field
/// limit with collision odds that do not matter for one store.
fn new_bill_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..20].to_string()
}

/// POST /api/payments/checkout/qr — price the cart, mint a KHQR, and
/// record a pending order under the QR's md5 reference.
///
/// No stock moves here; the cart and stock are only committed when the
/// payment verifies.
pub async fn checkout_qr(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let totals = state.checkout.prepare_qr(&user_id).await?;

    let bill_number = new_bill_number();
    let payload = qr::generate(&state.merchant, totals.total_cents, &bill_number)?;

    let order = state
        .checkout
        .create_pending_qr_order(&user_id, &totals, &payload.md5)
        .await?;

    Ok((
        StatusCode::CREATED,
        success(
            "scan to pay",
            json!({
                "order": order,
                "qr": payload.qr,
                "md5": payload.md5,
            }),
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub md5: String,
}

/// The gate in front of fulfillment: asks the gateway about the
/// reference and turns anything other than a settled payment into an
/// error. The completion tail only ever runs after this returns `Ok`,
/// so a declined or unreachable gateway leaves the order pending and
/// stock untouched.
async fn confirm_settlement(gateway: &dyn PaymentGateway, md5: &str) -> ApiResult<()> {
    let response = gateway.check_transaction(md5).await?;
    if !response.is_success() {
        warn!(
            code = response.response_code,
            message = %response.response_message,
            "Gateway declined transaction"
        );
        return Err(ApiError::Gateway {
            code: response.response_code,
            message: response.response_message,
        });
    }
    Ok(())
}

/// POST /api/payments/verify — ask the gateway whether the reference
/// settled, and if so complete the pending order.
///
/// Safe to call repeatedly: a reference that already completed returns
/// the same order without touching stock again.
pub async fn verify(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<Value>> {
    if request.md5.is_empty() {
        return Err(ApiError::BadRequest("md5 is required".to_string()));
    }

    confirm_settlement(state.gateway.as_ref(), &request.md5).await?;

    let result = state
        .checkout
        .complete_qr_order(&user_id, &request.md5)
        .await?;

    info!(order_id = %result.order.id, "Payment verified");
    Ok(success("payment verified", json!(result)))
}

// =============================================================================
// Unit Tests
// =============================================================================
