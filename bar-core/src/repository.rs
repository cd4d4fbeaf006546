use async_trait::async_trait;
use bar_shared::Visitor;

use crate::query::{Page, PageQuery};
use crate::CoreResult;

/// Read side of a collection: one page of rows plus the exact filtered count.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Row: Send + Sync + Clone;

    async fn fetch_page(&self, query: &PageQuery) -> CoreResult<Page<Self::Row>>;
}

/// Write side of the visitors collection.
#[async_trait]
pub trait VisitorCommentStore: Send + Sync {
    /// Sets `comment` on the visitor with `id`; `None` stores NULL.
    ///
    /// Returns the row as persisted.
    async fn update_comment(&self, id: i64, comment: Option<&str>) -> CoreResult<Visitor>;
}
