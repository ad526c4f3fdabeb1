use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, services::categories::DepartmentOverview, AppState};
use axum::{extract::State, routing::get, Router};

/// Creates the router for the storefront department overview
pub fn departments_routes() -> Router<AppState> {
    Router::new().route("/", get(get_departments))
}

/// Departments with their categories and subcategory names, the shape the
/// storefront navigation menu consumes.
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses(
        (status = 200, description = "Department overview retrieved", body = Vec<DepartmentOverview>)
    ),
    tag = "Departments"
)]
pub async fn get_departments(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let departments = state
        .services
        .categories
        .department_overview()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(departments))
}
