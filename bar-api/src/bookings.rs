use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bar_core::{ColumnFilter, GridDocument, SortModel};

use crate::error::AppError;
use crate::grid::{self, PageParams};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show_bookings))
        .route("/filters", post(filter_bookings))
        .route("/sort", post(sort_bookings))
        .route("/stream", get(stream_bookings))
}

async fn show_bookings(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Json<GridDocument> {
    Json(grid::render(&state.bookings, params).await)
}

async fn filter_bookings(
    State(state): State<AppState>,
    Json(filters): Json<Vec<ColumnFilter>>,
) -> Result<Json<GridDocument>, AppError> {
    Ok(Json(grid::filter(&state.bookings, filters).await?))
}

async fn sort_bookings(
    State(state): State<AppState>,
    Json(sort): Json<SortModel>,
) -> Result<Json<GridDocument>, AppError> {
    Ok(Json(grid::sort(&state.bookings, sort).await?))
}

async fn stream_bookings(State(state): State<AppState>) -> impl IntoResponse {
    grid::stream(state.bookings.clone(), &state.feed)
}
