//! Order endpoints: summary, history, and cash checkout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{success, ApiError, ApiResult};
use crate::extract::UserId;
use crate::state::AppState;

/// GET /api/orders/summary — priced preview of the caller's cart.
pub async fn summary(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Value>> {
    let summary = state.checkout.order_summary(&user_id).await?;
    Ok(success("order summary", json!(summary)))
}

/// GET /api/orders — the caller's completed orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Value>> {
    let orders = state.checkout.completed_orders(&user_id).await?;
    Ok(success("orders", json!(orders)))
}

#[derive(Debug, Deserialize)]
pub struct CashCheckoutRequest {
    pub payment_method: String,
}

/// POST /api/orders/checkout/cash — settle the cart immediately.
///
/// The body restates the payment method as a guard against a client
/// posting a QR intent at the cash endpoint.
pub async fn checkout_cash(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<CashCheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if request.payment_method != "cash" {
        return Err(ApiError::BadRequest(format!(
            "unsupported payment method for this endpoint: {}",
            request.payment_method
        )));
    }

    let result = state.checkout.checkout_cash(&user_id).await?;
    Ok((
        StatusCode::CREATED,
        success("order completed", json!(result)),
    ))
}
