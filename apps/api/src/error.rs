//! # API Error Responses
//!
//! Maps domain errors onto HTTP statuses and a uniform JSON envelope.
//!
//! ## Envelope
//! ```text
//! success:  { "status": "success", "message": ..., "data": ... }
//! error:    { "status": "error", "code": ..., "message": ..., "data": ... }
//! ```
//!
//! Business-rule violations carry structured `data` so clients can act
//! on them (e.g. show which product is short and by how much) instead
//! of parsing message strings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use bayon_db::{CheckoutError, DbError};
use bayon_khqr::GatewayError;

/// Errors a handler can surface to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated")]
    Unauthorized,

    #[error("there are no products in cart")]
    EmptyCart,

    #[error("not enough stock for {product_name}")]
    InsufficientStock {
        product_name: String,
        available_stock: i64,
    },

    #[error("order not found")]
    OrderNotFound,

    /// The payment gateway declined or could not find the transaction;
    /// code and message are the gateway's, verbatim.
    #[error("gateway error {code}: {message}")]
    Gateway { code: i64, message: String },

    /// The gateway was unreachable or unintelligible; the payment state
    /// is unknown and the caller should retry.
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal(String),
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => ApiError::EmptyCart,
            CheckoutError::InsufficientStock {
                product_name,
                available_stock,
            } => ApiError::InsufficientStock {
                product_name,
                available_stock,
            },
            CheckoutError::OrderNotFound => ApiError::OrderNotFound,
            CheckoutError::Storage(db) => ApiError::from(db),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(msg) | GatewayError::InvalidResponse(msg) => {
                ApiError::GatewayUnavailable(msg)
            }
            GatewayError::InvalidField(msg) => ApiError::Internal(msg),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::EmptyCart => StatusCode::NOT_FOUND,
            ApiError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            ApiError::OrderNotFound => StatusCode::NOT_FOUND,
            ApiError::Gateway { .. } => StatusCode::BAD_REQUEST,
            ApiError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::EmptyCart => "EMPTY_CART",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::OrderNotFound => "ORDER_NOT_FOUND",
            ApiError::Gateway { .. } => "GATEWAY_ERROR",
            ApiError::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn data(&self) -> Value {
        match self {
            ApiError::InsufficientStock {
                product_name,
                available_stock,
            } => json!({
                "product_name": product_name,
                // Zero stock reads better as a word than a number.
                "available_stock": if *available_stock == 0 {
                    json!("sold_out")
                } else {
                    json!(available_stock)
                },
            }),
            ApiError::Gateway { code, .. } => json!({ "gateway_code": code }),
            _ => Value::Null,
        }
    }

    /// The message shown to the client. Internal details never leak.
    fn public_message(&self) -> String {
        match self {
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Internal error");
                "internal server error".to_string()
            }
            ApiError::GatewayUnavailable(detail) => {
                error!(detail = %detail, "Gateway unavailable");
                "payment gateway unavailable, try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "code": self.code(),
            "message": self.public_message(),
            "data": self.data(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Builds the success envelope.
pub fn success(message: &str, data: Value) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": message,
        "data": data,
    }))
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::EmptyCart.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::OrderNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InsufficientStock {
                product_name: "X".into(),
                available_stock: 1
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Gateway {
                code: 1,
                message: "declined".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::GatewayUnavailable("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_insufficient_stock_data_literal() {
        let err = ApiError::InsufficientStock {
            product_name: "Coffee".into(),
            available_stock: 3,
        };
        assert_eq!(
            err.data(),
            json!({ "product_name": "Coffee", "available_stock": 3 })
        );
    }

    #[test]
    fn test_insufficient_stock_data_sold_out() {
        let err = ApiError::InsufficientStock {
            product_name: "Coffee".into(),
            available_stock: 0,
        };
        assert_eq!(
            err.data(),
            json!({ "product_name": "Coffee", "available_stock": "sold_out" })
        );
    }

    #[test]
    fn test_checkout_error_conversion() {
        let err: ApiError = CheckoutError::EmptyCart.into();
        assert!(matches!(err, ApiError::EmptyCart));

        let err: ApiError = CheckoutError::OrderNotFound.into();
        assert!(matches!(err, ApiError::OrderNotFound));
    }

    #[test]
    fn test_gateway_transport_failure_is_unavailable() {
        let err: ApiError = GatewayError::Transport("connection refused".into()).into();
        assert!(matches!(err, ApiError::GatewayUnavailable(_)));

        let err: ApiError = GatewayError::InvalidResponse("HTTP 502: <html>".into()).into();
        assert!(matches!(err, ApiError::GatewayUnavailable(_)));
    }

    #[test]
    fn test_internal_message_does_not_leak() {
        let err = ApiError::Internal("query failed: secret table".into());
        assert_eq!(err.public_message(), "internal server error");
    }
}
