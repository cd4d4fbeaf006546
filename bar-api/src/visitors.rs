use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use bar_core::{ColumnFilter, EditOutcome, GridDocument, SortModel};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::grid::{self, PageParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/visitors", get(show_visitors))
        .route("/visitors/filters", post(filter_visitors))
        .route("/visitors/sort", post(sort_visitors))
        .route("/visitors/stream", get(stream_visitors))
        .route("/visitors/{id}/comment", patch(edit_comment))
}

async fn show_visitors(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Json<GridDocument> {
    Json(grid::render(&state.visitors.page, params).await)
}

async fn filter_visitors(
    State(state): State<AppState>,
    Json(filters): Json<Vec<ColumnFilter>>,
) -> Result<Json<GridDocument>, AppError> {
    Ok(Json(grid::filter(&state.visitors.page, filters).await?))
}

async fn sort_visitors(
    State(state): State<AppState>,
    Json(sort): Json<SortModel>,
) -> Result<Json<GridDocument>, AppError> {
    Ok(Json(grid::sort(&state.visitors.page, sort).await?))
}

async fn stream_visitors(State(state): State<AppState>) -> impl IntoResponse {
    grid::stream(state.visitors.page.clone(), &state.feed)
}

/// Saves a visitor comment. Replies with the grid either way; a rolled back
/// edit answers 502 so the caller can tell the write did not land.
async fn edit_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<GridDocument>), AppError> {
    let comment = req.comment.unwrap_or_default();
    let status = match state.visitors.edit_comment(id, &comment).await? {
        EditOutcome::Committed(_) => {
            info!(visitor_id = id, "Comment edit committed");
            StatusCode::OK
        }
        EditOutcome::RolledBack { reason, .. } => {
            info!(visitor_id = id, %reason, "Comment edit rolled back");
            StatusCode::BAD_GATEWAY
        }
    };
    Ok((status, Json(state.visitors.page.render().await)))
}
