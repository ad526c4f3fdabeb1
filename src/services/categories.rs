use crate::{
    entities::category::{self, CategoryLevel, Entity as Category, Model as CategoryModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category service owning the storefront taxonomy.
///
/// All placement rules live here rather than in the schema: a node's level
/// must sit in the department/category/subcategory range, a child's level is
/// exactly its parent's plus one, and only departments may be roots. Every
/// mutating call re-checks the rules before touching the `categories` table.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a new category
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let name = normalize_name(&input.name)?;
        self.validate_placement(input.level, input.parent_id)
            .await?;

        let category_id = Uuid::new_v4();
        let now = Utc::now();

        let category = category::ActiveModel {
            id: Set(category_id),
            name: Set(name),
            parent_id: Set(input.parent_id),
            level: Set(input.level),
            sort_order: Set(input.sort_order.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            description: Set(normalize_optional(input.description)),
            image_url: Set(normalize_optional(input.image_url)),
            created_by: Set(input.created_by),
            updated_by: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category_id))
            .await;

        info!("Created category: {}", category_id);
        Ok(category)
    }

    /// Apply a partial update. Placement rules are re-checked whenever the
    /// level or parent changes; a level change is refused outright while the
    /// node still has children, since they would end up at an inconsistent
    /// depth.
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let current = self.get_category(category_id).await?;

        let target_level = input.level.unwrap_or(current.level);
        let target_parent = input.parent_id.unwrap_or(current.parent_id);

        if target_parent == Some(category_id) {
            return Err(ServiceError::ValidationError(format!(
                "category {} cannot be its own parent",
                category_id
            )));
        }

        if target_level != current.level || target_parent != current.parent_id {
            self.validate_placement(target_level, target_parent).await?;
        }

        if target_level != current.level {
            let children = Category::find()
                .filter(category::Column::ParentId.eq(category_id))
                .count(&*self.db)
                .await?;
            if children > 0 {
                return Err(ServiceError::Conflict(format!(
                    "category {} has {} direct children at level {}; changing its level would leave them inconsistent",
                    category_id,
                    children,
                    current.level + 1
                )));
            }
        }

        let mut active: category::ActiveModel = current.into();

        if let Some(name) = input.name {
            active.name = Set(normalize_name(&name)?);
        }
        if let Some(level) = input.level {
            active.level = Set(level);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        if let Some(sort_order) = input.sort_order {
            active.sort_order = Set(sort_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(description) = input.description {
            active.description = Set(normalize_optional(Some(description)));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(normalize_optional(Some(image_url)));
        }
        if input.updated_by.is_some() {
            active.updated_by = Set(input.updated_by);
        }
        active.updated_at = Set(Some(Utc::now()));

        let category = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;

        info!("Updated category: {}", category_id);
        Ok(category)
    }

    /// Get a category by ID
    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    /// Direct children of a category, ordered by (sort_order, name).
    /// An unknown parent id yields an empty list; reads only fail on
    /// storage or integrity problems.
    #[instrument(skip(self))]
    pub async fn list_children(
        &self,
        parent_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<CategoryModel>, ServiceError> {
        sibling_order(
            Category::find().filter(category::Column::ParentId.eq(parent_id)),
            active_only,
        )
        .all(&*self.db)
        .await
        .map_err(Into::into)
    }

    /// Root categories (departments), ordered by (sort_order, name).
    #[instrument(skip(self))]
    pub async fn list_roots(&self, active_only: bool) -> Result<Vec<CategoryModel>, ServiceError> {
        sibling_order(
            Category::find().filter(category::Column::ParentId.is_null()),
            active_only,
        )
        .all(&*self.db)
        .await
        .map_err(Into::into)
    }

    /// Soft-delete: flips `is_active` off without touching children, which
    /// stay independently toggleable.
    #[instrument(skip(self))]
    pub async fn deactivate_category(
        &self,
        category_id: Uuid,
        updated_by: Option<Uuid>,
    ) -> Result<CategoryModel, ServiceError> {
        let current = self.get_category(category_id).await?;

        let mut active: category::ActiveModel = current.into();
        active.is_active = Set(false);
        if updated_by.is_some() {
            active.updated_by = Set(updated_by);
        }
        active.updated_at = Set(Some(Utc::now()));

        let category = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeactivated(category_id))
            .await;

        info!("Deactivated category: {}", category_id);
        Ok(category)
    }

    /// Ancestor chain from the root down to (and including) the given node,
    /// for breadcrumb rendering. Traversal is defensive: a dangling parent
    /// reference or a cycle reports an integrity error instead of looping.
    #[instrument(skip(self))]
    pub async fn get_path(&self, category_id: Uuid) -> Result<Vec<CategoryModel>, ServiceError> {
        let start = self.get_category(category_id).await?;

        let mut visited: HashSet<Uuid> = HashSet::from([start.id]);
        let mut chain = vec![start];

        loop {
            let (child_id, parent_id) = {
                let current = chain.last().expect("chain is never empty");
                match current.parent_id {
                    Some(parent_id) => (current.id, parent_id),
                    None => break,
                }
            };

            if !visited.insert(parent_id) {
                warn!(
                    category_id = %category_id,
                    offending = %parent_id,
                    "cycle detected while resolving category ancestry"
                );
                return Err(ServiceError::IntegrityError(format!(
                    "cycle through category {} while resolving ancestors of {}",
                    parent_id, category_id
                )));
            }

            let parent = Category::find_by_id(parent_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    warn!(
                        category_id = %child_id,
                        missing_parent = %parent_id,
                        "dangling parent reference in category ancestry"
                    );
                    ServiceError::IntegrityError(format!(
                        "category {} references missing parent {}",
                        child_id, parent_id
                    ))
                })?;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// The whole taxonomy nested into root nodes, one query.
    #[instrument(skip(self))]
    pub async fn category_tree(
        &self,
        active_only: bool,
    ) -> Result<Vec<CategoryTreeNode>, ServiceError> {
        let mut query = Category::find();
        if active_only {
            query = query.filter(category::Column::IsActive.eq(true));
        }
        let rows = query
            .order_by_asc(category::Column::Level)
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(build_tree(rows))
    }

    /// Navigation summary for the storefront menu: active departments, each
    /// with its category names and alphabetically sorted subcategory names.
    #[instrument(skip(self))]
    pub async fn department_overview(&self) -> Result<Vec<DepartmentOverview>, ServiceError> {
        let tree = self.category_tree(true).await?;

        Ok(tree
            .into_iter()
            .map(|department| DepartmentOverview {
                department: department.name,
                categories: department
                    .children
                    .into_iter()
                    .map(|category| {
                        let mut subcategories: Vec<String> = category
                            .children
                            .into_iter()
                            .map(|subcategory| subcategory.name)
                            .collect();
                        subcategories.sort();
                        DepartmentCategoryEntry {
                            category: category.name,
                            subcategories,
                        }
                    })
                    .collect(),
            })
            .collect())
    }

    async fn validate_placement(
        &self,
        level: i32,
        parent_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let level = CategoryLevel::try_from(level)?;

        match parent_id {
            None => {
                if level != CategoryLevel::Department {
                    return Err(ServiceError::ValidationError(format!(
                        "a {} (level {}) requires a parent; only departments may be roots",
                        level,
                        level.as_i32()
                    )));
                }
            }
            Some(parent_id) => {
                let parent = Category::find_by_id(parent_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Parent category {} not found", parent_id))
                    })?;
                if parent.level + 1 != level.as_i32() {
                    return Err(ServiceError::ValidationError(format!(
                        "parent {} is level {}; a level {} child requires a level {} parent",
                        parent_id,
                        parent.level,
                        level.as_i32(),
                        level.as_i32() - 1
                    )));
                }
            }
        }

        Ok(())
    }
}

fn sibling_order(query: Select<Category>, active_only: bool) -> Select<Category> {
    let query = if active_only {
        query.filter(category::Column::IsActive.eq(true))
    } else {
        query
    };
    query
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
}

/// Non-blank trimmed name, or a validation error naming the field.
pub fn normalize_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError(
            "name must not be blank".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Trims an optional string; blank values collapse to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Nest a flat, (level, sort_order, name)-ordered selection into root nodes.
///
/// Deeper ranks are attached first so each child list is complete before its
/// parent is consumed; child lists inherit the (sort_order, name) row order.
/// Rows whose parent is absent from the selection are dropped from the
/// rendered tree, matching the storefront's long-standing behavior.
pub fn build_tree(rows: Vec<CategoryModel>) -> Vec<CategoryTreeNode> {
    let order: Vec<(Uuid, Option<Uuid>, i32)> = rows
        .iter()
        .map(|row| (row.id, row.parent_id, row.level))
        .collect();
    let mut nodes: HashMap<Uuid, CategoryTreeNode> = rows
        .into_iter()
        .map(|row| (row.id, CategoryTreeNode::from(row)))
        .collect();

    for rank in ((CategoryLevel::MIN + 1)..=CategoryLevel::MAX).rev() {
        for (id, parent_id, level) in &order {
            if *level != rank {
                continue;
            }
            let Some(node) = nodes.remove(id) else {
                continue;
            };
            match parent_id.and_then(|parent_id| nodes.get_mut(&parent_id)) {
                Some(parent) => parent.children.push(node),
                None => {
                    warn!(category_id = %id, "skipping category with unresolved parent in tree build");
                }
            }
        }
    }

    let roots: Vec<CategoryTreeNode> = order
        .iter()
        .filter(|(_, parent_id, _)| parent_id.is_none())
        .filter_map(|(id, _, _)| nodes.remove(id))
        .collect();

    if !nodes.is_empty() {
        warn!(
            dropped = nodes.len(),
            "tree build dropped records that are neither roots nor resolvable children"
        );
    }

    roots
}

/// Input for creating a category
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub level: i32,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Input for partially updating a category
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub level: Option<i32>,
    /// `None` leaves the parent untouched; `Some(None)` moves the node to
    /// the root.
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub updated_by: Option<Uuid>,
}

/// A category with its derived children nested in, for navigation rendering.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryTreeNode {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub level: i32,
    pub sort_order: i32,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    #[schema(no_recursion)]
    pub children: Vec<CategoryTreeNode>,
}

impl From<CategoryModel> for CategoryTreeNode {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
            level: model.level,
            sort_order: model.sort_order,
            parent_id: model.parent_id,
            is_active: model.is_active,
            children: Vec::new(),
        }
    }
}

/// One department row of the storefront navigation summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepartmentOverview {
    pub department: String,
    pub categories: Vec<DepartmentCategoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepartmentCategoryEntry {
    pub category: String,
    pub subcategories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(
        name: &str,
        level: i32,
        parent_id: Option<Uuid>,
        sort_order: i32,
    ) -> CategoryModel {
        CategoryModel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
            level,
            sort_order,
            is_active: true,
            description: None,
            image_url: None,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    // ==================== normalization ====================

    #[test]
    fn normalize_name_trims_surrounding_whitespace() {
        assert_eq!(normalize_name("  Spirits  ").unwrap(), "Spirits");
    }

    #[test]
    fn normalize_name_rejects_blank() {
        for raw in ["", "   ", "\t\n"] {
            let err = normalize_name(raw).unwrap_err();
            assert!(matches!(err, ServiceError::ValidationError(_)));
        }
    }

    #[test]
    fn normalize_optional_collapses_blank_to_none() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
        assert_eq!(
            normalize_optional(Some("  Aged in oak  ".to_string())),
            Some("Aged in oak".to_string())
        );
    }

    // ==================== inputs ====================

    #[test]
    fn update_input_default_is_empty_patch() {
        let input = UpdateCategoryInput::default();
        assert!(input.name.is_none());
        assert!(input.level.is_none());
        assert!(input.parent_id.is_none());
        assert!(input.updated_by.is_none());
    }

    #[test]
    fn create_input_minimal() {
        let input = CreateCategoryInput {
            name: "Wine".to_string(),
            level: 0,
            parent_id: None,
            sort_order: None,
            is_active: None,
            description: None,
            image_url: None,
            created_by: None,
        };
        assert_eq!(input.level, 0);
        assert!(input.parent_id.is_none());
    }

    // ==================== tree assembly ====================

    #[test]
    fn build_tree_nests_three_levels() {
        let department = model("Wine", 0, None, 0);
        let category = model("Red", 1, Some(department.id), 0);
        let subcategory = model("Malbec", 2, Some(category.id), 0);

        let roots = build_tree(vec![
            department.clone(),
            category.clone(),
            subcategory.clone(),
        ]);

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "Wine");
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].name, "Red");
        assert_eq!(roots[0].children[0].children.len(), 1);
        assert_eq!(roots[0].children[0].children[0].name, "Malbec");
    }

    #[test]
    fn build_tree_preserves_row_order_among_siblings() {
        let department = model("Spirits", 0, None, 0);
        // Rows arrive already ordered by (sort_order, name)
        let ale = model("Ale", 1, Some(department.id), 1);
        let wine = model("Wine", 1, Some(department.id), 1);
        let beer = model("Beer", 1, Some(department.id), 2);

        let roots = build_tree(vec![department, ale, wine, beer]);

        let names: Vec<&str> = roots[0]
            .children
            .iter()
            .map(|child| child.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ale", "Wine", "Beer"]);
    }

    #[test]
    fn build_tree_drops_orphans() {
        let department = model("Beer", 0, None, 0);
        let orphan = model("Stout", 2, Some(Uuid::new_v4()), 0);

        let roots = build_tree(vec![department, orphan]);

        assert_eq!(roots.len(), 1);
        assert!(roots[0].children.is_empty());
    }

    #[test]
    fn build_tree_of_empty_selection_is_empty() {
        assert!(build_tree(Vec::new()).is_empty());
    }

    #[test]
    fn tree_node_serializes_children_recursively() {
        let department = model("Wine", 0, None, 0);
        let category = model("White", 1, Some(department.id), 0);
        let roots = build_tree(vec![department, category]);

        let json = serde_json::to_value(&roots).unwrap();
        assert_eq!(json[0]["name"], "Wine");
        assert_eq!(json[0]["children"][0]["name"], "White");
    }
}
