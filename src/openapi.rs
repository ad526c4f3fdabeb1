use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = r#"
# Storefront Catalog Taxonomy API

Manages the three-level category tree (departments, categories,
subcategories) that drives storefront navigation.

## Placement rules

- Levels run 0..=2: 0 department, 1 category, 2 subcategory.
- A child's level is always its parent's level plus one.
- Only departments may be roots; every other node needs a parent.
- Deactivation is a soft flag and never cascades to children.

## Error Handling

Errors use a consistent response format with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation error: name must not be blank",
  "request_id": "req-abc123xyz",
  "timestamp": "2025-11-03T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Category taxonomy management"),
        (name = "Departments", description = "Storefront navigation overview")
    ),
    paths(
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::deactivate_category,
        crate::handlers::categories::list_children,
        crate::handlers::categories::list_roots,
        crate::handlers::categories::get_path,
        crate::handlers::categories::get_tree,
        crate::handlers::departments::get_departments,
    ),
    components(
        schemas(
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::categories::DeactivateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::services::categories::CategoryTreeNode,
            crate::services::categories::DepartmentOverview,
            crate::services::categories::DepartmentCategoryEntry,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_category_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Catalog API"));
        assert!(json.contains("/api/v1/categories"));
        assert!(json.contains("/api/v1/departments"));
    }
}
