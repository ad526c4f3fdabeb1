use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// A node in the three-level storefront taxonomy, stored flat in `categories`.
///
/// `parent_id` is a weak reference to another row in the same table; the
/// children relation is always derived at read time, never persisted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    pub name: String,
    pub parent_id: Option<Uuid>,
    /// 0 = department, 1 = category, 2 = subcategory.
    pub level: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,

    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,

    #[sea_orm(has_many = "Entity")]
    Children,
}

impl Related<Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The three ranks of the taxonomy. A child's rank is always exactly one
/// below its parent's, which is what makes the structure cycle-free.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLevel {
    Department = 0,
    Category = 1,
    Subcategory = 2,
}

impl CategoryLevel {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 2;

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Rank of a direct child, or `None` for leaf subcategories.
    pub fn child(self) -> Option<CategoryLevel> {
        match self {
            CategoryLevel::Department => Some(CategoryLevel::Category),
            CategoryLevel::Category => Some(CategoryLevel::Subcategory),
            CategoryLevel::Subcategory => None,
        }
    }
}

impl TryFrom<i32> for CategoryLevel {
    type Error = ServiceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CategoryLevel::Department),
            1 => Ok(CategoryLevel::Category),
            2 => Ok(CategoryLevel::Subcategory),
            other => Err(ServiceError::ValidationError(format!(
                "level {} is out of range; expected {}..={}",
                other,
                CategoryLevel::MIN,
                CategoryLevel::MAX
            ))),
        }
    }
}

impl std::fmt::Display for CategoryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CategoryLevel::Department => "department",
            CategoryLevel::Category => "category",
            CategoryLevel::Subcategory => "subcategory",
        };
        write!(f, "{}", name)
    }
}
