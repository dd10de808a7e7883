//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard success envelope: `{"success": true, ...data}`.
///
/// Errors are rendered by `AppError` as `{"success": false, "error", "code"}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Round to two decimals for display.
#[must_use]
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Body {
        presenter_name: String,
    }

    #[test]
    fn test_envelope_flattens_data() {
        let value = serde_json::to_value(ApiResponse::ok(Body {
            presenter_name: "Guest u1".to_string(),
        }))
        .unwrap_or_default();
        assert_eq!(
            value,
            serde_json::json!({"success": true, "presenterName": "Guest u1"})
        );
    }

    #[test]
    fn test_round_score() {
        assert!((round_score(4.256) - 4.26).abs() < f64::EPSILON);
        assert!((round_score(4.0) - 4.0).abs() < f64::EPSILON);
    }
}
