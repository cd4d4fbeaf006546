//! The two admin views, each owning its grid state.

pub mod bookings;
pub mod visitors;

use std::sync::Arc;

use bar_shared::{Collection, Visitor};
use chrono::TimeDelta;
use tokio::sync::mpsc;

use crate::comment::{CommentEditor, EditOutcome};
use crate::grid::{GridController, GridRow, RefreshOutcome};
use crate::query::{ColumnFilter, SortModel};
use crate::realtime::{ChangeHub, RealtimeListener};
use crate::repository::{PageSource, VisitorCommentStore};
use crate::view::{DisplayOptions, GridDocument, ViewDef};
use crate::CoreResult;

#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    pub page_size: u32,
    pub display: DisplayOptions,
    pub dismiss_after: TimeDelta,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            display: DisplayOptions::default(),
            dismiss_after: TimeDelta::milliseconds(3000),
        }
    }
}

/// Controller of one routed grid view.
pub struct PageController<R> {
    collection: Collection,
    view: ViewDef<R>,
    grid: Arc<GridController<R>>,
    display: DisplayOptions,
}

impl<R: GridRow> PageController<R> {
    pub fn new(
        collection: Collection,
        view: ViewDef<R>,
        source: Arc<dyn PageSource<Row = R>>,
        settings: PageSettings,
    ) -> Self {
        let grid = Arc::new(GridController::new(
            source,
            settings.page_size,
            view.default_sort.clone(),
            settings.dismiss_after,
        ));
        Self {
            collection,
            view,
            grid,
            display: settings.display,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn grid(&self) -> &Arc<GridController<R>> {
        &self.grid
    }

    pub async fn render(&self) -> GridDocument {
        let snapshot = self.grid.snapshot().await;
        self.view.render(&snapshot, &self.display)
    }

    /// Loads the first page unless a previous load already succeeded.
    pub async fn ensure_loaded(&self) {
        if !self.grid.is_loaded().await {
            self.grid.refresh().await;
        }
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.grid.refresh().await
    }

    pub async fn goto_page(&self, page: u32) -> RefreshOutcome {
        self.grid.set_page(page).await
    }

    /// Rejects the whole set if any filter does not fit its column; state is left as is.
    pub async fn apply_filters(&self, filters: Vec<ColumnFilter>) -> CoreResult<RefreshOutcome> {
        self.view.validate_filters(&filters)?;
        Ok(self.grid.set_filters(filters).await)
    }

    pub async fn apply_sort(&self, sort: SortModel) -> CoreResult<RefreshOutcome> {
        self.view.validate_sort(&sort)?;
        Ok(self.grid.set_sort(sort).await)
    }

    /// Subscribes this view to its collection's change feed.
    pub fn listen(&self, hub: &ChangeHub) -> (RealtimeListener, mpsc::Receiver<RefreshOutcome>) {
        RealtimeListener::spawn(hub.subscribe(self.collection), self.grid.clone())
    }
}

/// Visitors view: the grid plus the inline comment editor.
pub struct VisitorsPage {
    pub page: Arc<PageController<Visitor>>,
    editor: CommentEditor,
}

impl VisitorsPage {
    pub fn new(page: PageController<Visitor>, store: Arc<dyn VisitorCommentStore>) -> Self {
        let editor = CommentEditor::new(page.grid().clone(), store);
        Self {
            page: Arc::new(page),
            editor,
        }
    }

    pub async fn edit_comment(&self, id: i64, comment: &str) -> CoreResult<EditOutcome> {
        self.editor.edit(id, comment).await
    }
}
