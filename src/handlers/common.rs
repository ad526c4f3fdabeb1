use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Deserializer};
use utoipa::IntoParams;
use validator::Validate;

/// Standard success response
pub fn success_response<T: serde::Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: serde::Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Deserializer distinguishing an absent field from an explicit `null`.
/// Combined with `#[serde(default)]`: absent stays `None` (field untouched),
/// `null` becomes `Some(None)` (clear), a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Query filter shared by the listing endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ActiveOnlyParams {
    /// Restrict the listing to active records
    #[serde(default)]
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        parent_id: Option<Option<Uuid>>,
    }

    #[test]
    fn absent_field_stays_untouched() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.parent_id, None);
    }

    #[test]
    fn explicit_null_clears() {
        let patch: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(patch.parent_id, Some(None));
    }

    #[test]
    fn value_sets() {
        let id = Uuid::new_v4();
        let patch: Patch =
            serde_json::from_str(&format!(r#"{{"parent_id": "{}"}}"#, id)).unwrap();
        assert_eq!(patch.parent_id, Some(Some(id)));
    }

    #[test]
    fn active_only_defaults_to_false() {
        let params: ActiveOnlyParams = serde_json::from_str("{}").unwrap();
        assert!(!params.active_only);
    }
}
