use std::sync::Arc;

use bar_core::{ChangeHub, PageController, VisitorsPage};
use bar_shared::BookingRow;

/// One controller per view, shared by every connected browser.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<PageController<BookingRow>>,
    pub visitors: Arc<VisitorsPage>,
    pub feed: ChangeHub,
}
