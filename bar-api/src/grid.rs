//! Handler bodies shared by both grid views.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use bar_core::{ChangeHub, ColumnFilter, GridDocument, GridRow, PageController, SortModel};
use futures_util::future;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::{ReceiverStream, WatchStream};
use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

pub async fn render<R: GridRow>(page: &PageController<R>, params: PageParams) -> GridDocument {
    match params.page {
        Some(index) => {
            page.goto_page(index).await;
        }
        None => page.ensure_loaded().await,
    }
    page.render().await
}

pub async fn filter<R: GridRow>(
    page: &PageController<R>,
    filters: Vec<ColumnFilter>,
) -> Result<GridDocument, AppError> {
    page.apply_filters(filters).await?;
    Ok(page.render().await)
}

pub async fn sort<R: GridRow>(
    page: &PageController<R>,
    sort: SortModel,
) -> Result<GridDocument, AppError> {
    page.apply_sort(sort).await?;
    Ok(page.render().await)
}

fn grid_event(doc: &GridDocument) -> Option<Event> {
    match Event::default().event("grid").json_data(doc) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to encode grid event: {}", e);
            None
        }
    }
}

/// Live grid for one open page view.
///
/// Sends the current grid first, then a `grid` event whenever the shared grid
/// changes, no matter which open view's listener ran the refetch.
/// The realtime listener lives inside the stream, so a disconnect unsubscribes.
pub fn stream<R: GridRow>(
    page: Arc<PageController<R>>,
    feed: &ChangeHub,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let collection = page.collection();
    let (listener, outcomes) = page.listen(feed);
    debug!(%collection, subscribers = feed.subscriber_count(), "Grid stream opened");

    let initial = {
        let page = page.clone();
        stream::once(async move { grid_event(&page.render().await) })
    };

    let changes = WatchStream::from_changes(page.grid().changes()).map(|_| ());

    // Keeps the listener running; its outcomes carry no output of their own.
    let refetches = ReceiverStream::new(outcomes).filter_map(move |outcome| {
        let _listener = &listener;
        debug!(%collection, ?outcome, "Change refetch finished");
        future::ready(None::<()>)
    });

    let updates = stream::select(changes, refetches).then(move |()| {
        let page = page.clone();
        async move { grid_event(&page.render().await) }
    });

    let events = initial
        .chain(updates)
        .filter_map(|event| async move { event.map(Ok) });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)))
}
