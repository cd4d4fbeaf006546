use std::sync::Arc;

use bar_shared::{BookingRow, Visitor};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::query::{ColumnFilter, PageQuery, SortModel};
use crate::repository::PageSource;

/// Rows the grid can address by identity.
pub trait GridRow: Clone + Send + Sync + 'static {
    fn row_id(&self) -> i64;
}

impl GridRow for BookingRow {
    fn row_id(&self) -> i64 {
        self.booking.id
    }
}

impl GridRow for Visitor {
    fn row_id(&self) -> i64 {
        self.id
    }
}

/// Page, filter and sort intent of one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub page: u32,
    pub filters: Vec<ColumnFilter>,
    pub sort: SortModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Read failed; the previous rows are still displayed.
    Failed,
    /// A newer request was issued while this one was in flight.
    Superseded,
}

/// Point-in-time copy of a grid, ready for rendering.
#[derive(Debug, Clone)]
pub struct GridSnapshot<R> {
    pub view: ViewState,
    pub rows: Vec<R>,
    pub row_count: u64,
    pub page_size: u32,
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
    pub notification: Option<Notification>,
}

struct GridState<R> {
    view: ViewState,
    rows: Vec<R>,
    row_count: u64,
    loading: bool,
    loaded: bool,
    error: Option<String>,
    notification: Option<Notification>,
    /// Id of the most recently issued request. Responses carrying an older id are dropped.
    issued: u64,
    /// Locally replaced rows, laid over any response issued at or before `stamp`.
    overlays: Vec<Overlay<R>>,
}

struct Overlay<R> {
    stamp: u64,
    row: R,
}

impl<R: GridRow> GridState<R> {
    fn put_overlay(&mut self, row: R) {
        let id = row.row_id();
        self.overlays.retain(|o| o.row.row_id() != id);
        self.overlays.push(Overlay { stamp: self.issued, row });
    }
}

/// Holds the row set of one view and keeps it in sync with its collection.
///
/// The lock is never held across a fetch; ordering between overlapping fetches
/// comes from the request id taken under the lock.
pub struct GridController<R> {
    source: Arc<dyn PageSource<Row = R>>,
    state: Mutex<GridState<R>>,
    page_size: u32,
    dismiss_after: TimeDelta,
    changes: watch::Sender<u64>,
}

impl<R: GridRow> GridController<R> {
    pub fn new(
        source: Arc<dyn PageSource<Row = R>>,
        page_size: u32,
        default_sort: SortModel,
        dismiss_after: TimeDelta,
    ) -> Self {
        Self {
            source,
            state: Mutex::new(GridState {
                view: ViewState {
                    page: 0,
                    filters: Vec::new(),
                    sort: default_sort,
                },
                rows: Vec::new(),
                row_count: 0,
                loading: false,
                loaded: false,
                error: None,
                notification: None,
                issued: 0,
                overlays: Vec::new(),
            }),
            page_size: page_size.max(1),
            dismiss_after,
            changes: watch::channel(0).0,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Ticks whenever the displayed rows, error or notification change.
    ///
    /// Every open view of this grid watches the same counter, whichever task
    /// triggered the refetch.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn publish_change(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    pub async fn view(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    pub async fn snapshot(&self) -> GridSnapshot<R> {
        self.snapshot_at(Utc::now()).await
    }

    /// Snapshot as of `now`; notifications past their expiry are dropped.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> GridSnapshot<R> {
        let mut state = self.state.lock().await;
        if state
            .notification
            .as_ref()
            .is_some_and(|n| n.expires_at <= now)
        {
            state.notification = None;
        }

        GridSnapshot {
            view: state.view.clone(),
            rows: state.rows.clone(),
            row_count: state.row_count,
            page_size: self.page_size,
            loading: state.loading,
            loaded: state.loaded,
            error: state.error.clone(),
            notification: state.notification.clone(),
        }
    }

    pub async fn set_page(&self, page: u32) -> RefreshOutcome {
        self.state.lock().await.view.page = page;
        self.refresh().await
    }

    /// Replaces the filter set and jumps back to the first page.
    pub async fn set_filters(&self, filters: Vec<ColumnFilter>) -> RefreshOutcome {
        {
            let mut state = self.state.lock().await;
            state.view.filters = filters;
            state.view.page = 0;
        }
        self.refresh().await
    }

    pub async fn set_sort(&self, sort: SortModel) -> RefreshOutcome {
        self.state.lock().await.view.sort = sort;
        self.refresh().await
    }

    /// Re-reads the current page with the current view state.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (ticket, query) = {
            let mut state = self.state.lock().await;
            state.issued += 1;
            state.loading = true;
            let query = PageQuery {
                page: state.view.page,
                page_size: self.page_size,
                filters: state.view.filters.clone(),
                sort: state.view.sort.clone(),
            };
            (state.issued, query)
        };

        let result = self.source.fetch_page(&query).await;

        let mut state = self.state.lock().await;
        if ticket != state.issued {
            debug!(ticket, latest = state.issued, "Discarding superseded page response");
            return RefreshOutcome::Superseded;
        }

        state.loading = false;
        let outcome = match result {
            Ok(page) => {
                let mut rows = page.rows;
                // Edits made after this request went out win over what it read
                state.overlays.retain(|o| o.stamp >= ticket);
                for overlay in &state.overlays {
                    let id = overlay.row.row_id();
                    if let Some(slot) = rows.iter_mut().find(|r| r.row_id() == id) {
                        *slot = overlay.row.clone();
                    }
                }
                state.rows = rows;
                state.row_count = page.total;
                state.loaded = true;
                state.error = None;
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(page = query.page, "Failed to load grid page: {}", e);
                state.error = Some(e.to_string());
                RefreshOutcome::Failed
            }
        };
        drop(state);
        self.publish_change();
        outcome
    }

    pub async fn find_row(&self, id: i64) -> Option<R> {
        let state = self.state.lock().await;
        state.rows.iter().find(|row| row.row_id() == id).cloned()
    }

    /// Swaps the displayed row with the same id. Returns false if it is not on the current page.
    ///
    /// Fetches already in flight still land, with this row laid over their result.
    pub async fn replace_row(&self, row: R) -> bool {
        let id = row.row_id();
        self.update_row(id, |_| row).await.is_some()
    }

    /// Replaces the displayed row `id` with `f(current)` in one step and returns
    /// the row it replaced, or `None` if `id` is not on the current page.
    pub async fn update_row(&self, id: i64, f: impl FnOnce(&R) -> R) -> Option<R> {
        let mut state = self.state.lock().await;
        let slot = state.rows.iter_mut().find(|r| r.row_id() == id)?;
        let updated = f(slot);
        let prior = std::mem::replace(slot, updated.clone());
        state.put_overlay(updated);
        drop(state);
        self.publish_change();
        Some(prior)
    }

    pub async fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            kind,
            message: message.into(),
            expires_at: Utc::now() + self.dismiss_after,
        };
        self.state.lock().await.notification = Some(notification);
        self.publish_change();
    }
}
