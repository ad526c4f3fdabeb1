use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, ActiveOnlyParams,
};
use crate::{
    errors::ApiError,
    services::categories::{
        CategoryTreeNode, CreateCategoryInput, UpdateCategoryInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::CategoryModel;

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/roots", get(list_roots))
        .route("/tree", get(get_tree))
        .route("/:id", get(get_category).put(update_category))
        .route("/:id/deactivate", post(deactivate_category))
        .route("/:id/children", get(list_children))
        .route("/:id/path", get(get_path))
}

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Parent not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let CreateCategoryRequest {
        name,
        level,
        parent_id,
        sort_order,
        is_active,
        description,
        image_url,
        created_by,
    } = payload;

    let input = CreateCategoryInput {
        name,
        level,
        parent_id,
        sort_order,
        is_active,
        description,
        image_url,
        created_by,
    };

    let category = state
        .services
        .categories
        .create_category(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CategoryResponse::from(category)))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category retrieved", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CategoryResponse::from(category)))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/:id",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Level change would orphan children", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let UpdateCategoryRequest {
        name,
        level,
        parent_id,
        sort_order,
        is_active,
        description,
        image_url,
        updated_by,
    } = payload;

    let input = UpdateCategoryInput {
        name,
        level,
        parent_id,
        sort_order,
        is_active,
        description,
        image_url,
        updated_by,
    };

    let category = state
        .services
        .categories
        .update_category(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CategoryResponse::from(category)))
}

/// Deactivate a category (children stay untouched)
#[utoipa::path(
    post,
    path = "/api/v1/categories/:id/deactivate",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = DeactivateCategoryRequest,
    responses(
        (status = 200, description = "Category deactivated", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn deactivate_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<DeactivateCategoryRequest>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated_by = payload.and_then(|Json(body)| body.updated_by);

    let category = state
        .services
        .categories
        .deactivate_category(id, updated_by)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CategoryResponse::from(category)))
}

/// List direct children of a category
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id/children",
    params(
        ("id" = Uuid, Path, description = "Parent category ID"),
        ActiveOnlyParams
    ),
    responses(
        (status = 200, description = "Children retrieved", body = Vec<CategoryResponse>)
    ),
    tag = "Categories"
)]
pub async fn list_children(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ActiveOnlyParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let children = state
        .services
        .categories
        .list_children(id, params.active_only)
        .await
        .map_err(map_service_error)?;

    let children: Vec<CategoryResponse> =
        children.into_iter().map(CategoryResponse::from).collect();

    Ok(success_response(children))
}

/// List root categories (departments)
#[utoipa::path(
    get,
    path = "/api/v1/categories/roots",
    params(ActiveOnlyParams),
    responses(
        (status = 200, description = "Roots retrieved", body = Vec<CategoryResponse>)
    ),
    tag = "Categories"
)]
pub async fn list_roots(
    State(state): State<AppState>,
    Query(params): Query<ActiveOnlyParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let roots = state
        .services
        .categories
        .list_roots(params.active_only)
        .await
        .map_err(map_service_error)?;

    let roots: Vec<CategoryResponse> = roots.into_iter().map(CategoryResponse::from).collect();

    Ok(success_response(roots))
}

/// Ancestor chain from the root to the given category
#[utoipa::path(
    get,
    path = "/api/v1/categories/:id/path",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Path retrieved", body = Vec<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Taxonomy integrity problem", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_path(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let path = state
        .services
        .categories
        .get_path(id)
        .await
        .map_err(map_service_error)?;

    let path: Vec<CategoryResponse> = path.into_iter().map(CategoryResponse::from).collect();

    Ok(success_response(path))
}

/// Full taxonomy nested into root nodes
#[utoipa::path(
    get,
    path = "/api/v1/categories/tree",
    params(ActiveOnlyParams),
    responses(
        (status = 200, description = "Tree retrieved", body = Vec<CategoryTreeNode>)
    ),
    tag = "Categories"
)]
pub async fn get_tree(
    State(state): State<AppState>,
    Query(params): Query<ActiveOnlyParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let tree = state
        .services
        .categories
        .category_tree(params.active_only)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(tree))
}

// Request/Response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Whiskey",
    "level": 1,
    "parent_id": "550e8400-e29b-41d4-a716-446655440000",
    "sort_order": 3,
    "is_active": true,
    "description": "Bourbon, rye, scotch and world whiskies.",
    "image_url": "https://cdn.example.com/categories/whiskey.jpg",
    "created_by": "4f9e1b2c-0d3a-4d2b-9c1f-2f2d4a6e8b01"
}))]
pub struct CreateCategoryRequest {
    /// Display name, unique only by convention
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Taxonomy rank: 0 department, 1 category, 2 subcategory
    #[validate(range(min = 0, max = 2))]
    pub level: i32,
    /// Parent category; required for levels 1 and 2
    pub parent_id: Option<Uuid>,
    /// Display position among siblings (defaults to 0)
    pub sort_order: Option<i32>,
    /// Visibility flag (defaults to true)
    pub is_active: Option<bool>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 2000))]
    pub image_url: Option<String>,
    /// Opaque identifier of the administrative actor
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Whisky & Whiskey",
    "sort_order": 1,
    "updated_by": "4f9e1b2c-0d3a-4d2b-9c1f-2f2d4a6e8b01"
}))]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 2))]
    pub level: Option<i32>,
    /// Omit to keep the current parent; send `null` to move to the root
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 2000))]
    pub image_url: Option<String>,
    /// Opaque identifier of the administrative actor
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeactivateCategoryRequest {
    /// Opaque identifier of the administrative actor
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            parent_id: model.parent_id,
            level: model.level,
            sort_order: model.sort_order,
            is_active: model.is_active,
            description: model.description,
            image_url: model.image_url,
            created_by: model.created_by,
            updated_by: model.updated_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
