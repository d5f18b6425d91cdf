use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, limit: u32, offset: u32) -> Self {
        let limit = u64::from(limit.max(1));
        let offset = u64::from(offset);
        let total_pages = total.div_ceil(limit);
        let has_previous_page = offset > 0 && total > 0;
        let has_next_page = offset + (items.len() as u64) < total;
        Self {
            items,
            total,
            total_pages,
            has_next_page,
            has_previous_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct WindowQuery {
    pub since: i64,
    pub until: i64,
}
