pub mod categories;
pub mod common;
pub mod departments;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::categories::CategoryService;

/// Aggregated services used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let categories = Arc::new(CategoryService::new(db_pool, event_sender));
        Self { categories }
    }
}
