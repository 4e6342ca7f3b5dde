//! Page envelope shared by the list endpoints.

use serde::Serialize;

use crate::repository::{PageRequest, Paged};

/// Rows per page on the REST API and on most admin changelists.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn from_page<S>(paged: Paged<S>, request: PageRequest, to_row: impl FnMut(S) -> T) -> Self {
        Self {
            data: paged.items.into_iter().map(to_row).collect(),
            total: paged.total,
            page: request.page,
            per_page: request.per_page,
        }
    }
}
