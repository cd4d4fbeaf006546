pub mod comment;
pub mod format;
pub mod grid;
pub mod pages;
pub mod query;
pub mod realtime;
pub mod repository;
pub mod view;

pub use comment::{normalize_comment, CommentEditor, EditOutcome};
pub use grid::{GridController, GridRow, GridSnapshot, Notification, NotificationKind, RefreshOutcome};
pub use pages::{PageController, PageSettings, VisitorsPage};
pub use query::{ColumnFilter, FilterKind, Page, PageQuery, SortDirection, SortModel};
pub use realtime::{ChangeHub, ChangeSubscription, FeedSignal, RealtimeListener};
pub use repository::{PageSource, VisitorCommentStore};
pub use format::Cell;
pub use view::{ColumnDef, DisplayOptions, GridDocument, ViewDef};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
