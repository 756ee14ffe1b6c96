use crate::error::{AppError, Result};
use crate::model::{CreateLinkRequest, CreateLinkResponse, StatsResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use linkhop_core::Slug;
use linkhop_shortener::Shortener;
use tracing::info;

pub async fn create_link_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLinkResponse>)> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let created = state.shortener().create(request.into()).await?;
    info!(slug = %created.slug, url = %created.url, "Link created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn link_stats_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<StatsResponse>> {
    // A slug that could never have been admitted has no stats.
    let slug = Slug::new(slug).map_err(|_| AppError::NotFound)?;

    let stats = state.shortener().stats(&slug).await?;
    Ok(Json(stats.into()))
}
