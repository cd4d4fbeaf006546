use std::sync::Arc;

use bar_shared::Visitor;
use tracing::{error, info};

use crate::grid::{GridController, NotificationKind};
use crate::repository::VisitorCommentStore;
use crate::{CoreError, CoreResult};

const SAVED_MESSAGE: &str = "Комментарий сохранён";
const FAILED_MESSAGE: &str = "Не удалось сохранить комментарий";

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Committed(Visitor),
    /// The write failed and the grid shows the prior row again.
    RolledBack { restored: Visitor, reason: String },
}

/// Blank input clears the comment.
pub fn normalize_comment(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Inline edit of the visitor comment column: optimistic, single attempt, rolled back on failure.
pub struct CommentEditor {
    grid: Arc<GridController<Visitor>>,
    store: Arc<dyn VisitorCommentStore>,
}

impl CommentEditor {
    pub fn new(grid: Arc<GridController<Visitor>>, store: Arc<dyn VisitorCommentStore>) -> Self {
        Self { grid, store }
    }

    /// Only rows on the currently displayed page can be edited.
    pub async fn edit(&self, id: i64, raw_comment: &str) -> CoreResult<EditOutcome> {
        let comment = normalize_comment(raw_comment);
        let prior = self
            .grid
            .update_row(id, |current| current.with_comment(comment.clone()))
            .await
            .ok_or_else(|| CoreError::NotFound(format!("visitor {} is not on the current page", id)))?;

        match self.store.update_comment(id, comment.as_deref()).await {
            Ok(saved) => {
                info!(visitor_id = id, "Visitor comment updated");
                self.grid.replace_row(saved.clone()).await;
                self.grid.notify(NotificationKind::Success, SAVED_MESSAGE).await;
                Ok(EditOutcome::Committed(saved))
            }
            Err(e) => {
                error!(visitor_id = id, "Failed to update visitor comment: {}", e);
                self.grid.replace_row(prior.clone()).await;
                self.grid.notify(NotificationKind::Error, FAILED_MESSAGE).await;
                Ok(EditOutcome::RolledBack {
                    restored: prior,
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Page, PageQuery, SortModel};
    use crate::repository::PageSource;
    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MemoryVisitors {
        rows: Mutex<Vec<Visitor>>,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    impl MemoryVisitors {
        fn with(rows: Vec<Visitor>) -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(rows),
                fail_writes: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
            })
        }

        fn stored_comment(&self, id: i64) -> Option<String> {
            let rows = self.rows.lock().unwrap();
            rows.iter().find(|v| v.id == id).and_then(|v| v.comment.clone())
        }
    }

    #[async_trait]
    impl PageSource for MemoryVisitors {
        type Row = Visitor;

        async fn fetch_page(&self, _query: &PageQuery) -> CoreResult<Page<Visitor>> {
            let rows = self.rows.lock().unwrap().clone();
            let total = rows.len() as u64;
            Ok(Page { rows, total })
        }
    }

    #[async_trait]
    impl VisitorCommentStore for MemoryVisitors {
        async fn update_comment(&self, id: i64, comment: Option<&str>) -> CoreResult<Visitor> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(CoreError::Storage("permission denied for table visitors".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|v| v.id == id)
                .ok_or_else(|| CoreError::NotFound(format!("visitor {}", id)))?;
            row.comment = comment.map(str::to_string);
            Ok(row.clone())
        }
    }

    fn visitor(id: i64, comment: Option<&str>) -> Visitor {
        Visitor {
            id,
            username: Some("regular_guest".to_string()),
            name: Some("Anna".to_string()),
            creation_date: Utc::now(),
            last_visit_date: Utc::now(),
            real_name: None,
            comment: comment.map(str::to_string),
        }
    }

    async fn setup(store: Arc<MemoryVisitors>) -> (Arc<GridController<Visitor>>, CommentEditor) {
        let grid = Arc::new(GridController::new(
            store.clone(),
            10,
            SortModel::desc("creation_date"),
            TimeDelta::seconds(3),
        ));
        grid.refresh().await;
        let editor = CommentEditor::new(grid.clone(), store);
        (grid, editor)
    }

    #[tokio::test]
    async fn test_edit_commits_on_success() {
        let store = MemoryVisitors::with(vec![visitor(5, Some("regular"))]);
        let (grid, editor) = setup(store.clone()).await;

        let outcome = editor.edit(5, "VIP, table 3").await.unwrap();

        assert!(matches!(outcome, EditOutcome::Committed(ref v) if v.comment.as_deref() == Some("VIP, table 3")));
        assert_eq!(grid.find_row(5).await.unwrap().comment.as_deref(), Some("VIP, table 3"));
        assert_eq!(store.stored_comment(5).as_deref(), Some("VIP, table 3"));

        let notification = grid.snapshot().await.notification.unwrap();
        assert_eq!(notification.kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_edit_rolls_back_on_failure() {
        let store = MemoryVisitors::with(vec![visitor(5, Some("regular"))]);
        store.fail_writes.store(true, Ordering::SeqCst);
        let (grid, editor) = setup(store.clone()).await;
        let before = grid.find_row(5).await.unwrap();

        let outcome = editor.edit(5, "VIP, table 3").await.unwrap();

        assert!(matches!(outcome, EditOutcome::RolledBack { ref restored, .. } if *restored == before));
        assert_eq!(grid.find_row(5).await.unwrap(), before);
        assert_eq!(store.stored_comment(5).as_deref(), Some("regular"));

        let notification = grid.snapshot().await.notification.unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_empty_comment_is_stored_as_null() {
        let store = MemoryVisitors::with(vec![visitor(5, Some("regular"))]);
        let (grid, editor) = setup(store.clone()).await;

        editor.edit(5, "   ").await.unwrap();

        assert_eq!(store.stored_comment(5), None);
        assert_eq!(grid.find_row(5).await.unwrap().comment, None);
    }

    #[tokio::test]
    async fn test_row_not_on_page_is_rejected() {
        let store = MemoryVisitors::with(vec![visitor(5, Some("regular"))]);
        let (_grid, editor) = setup(store.clone()).await;

        let err = editor.edit(99, "hello").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.stored_comment(5).as_deref(), Some("regular"));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_row_gone_after_refetch_is_not_written() {
        let store = MemoryVisitors::with(vec![visitor(5, Some("regular")), visitor(6, None)]);
        let (grid, editor) = setup(store.clone()).await;

        store.rows.lock().unwrap().retain(|v| v.id != 5);
        grid.refresh().await;

        let err = editor.edit(5, "VIP, table 3").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(grid.snapshot().await.notification.is_none());
    }

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment(""), None);
        assert_eq!(normalize_comment(" \n"), None);
        assert_eq!(normalize_comment(" VIP "), Some("VIP".to_string()));
    }
}
