use std::collections::BTreeMap;

use axum::extract::{Query, State};
use tracing::instrument;

use schoolboard_core::{ApiResponse, AppError};
use schoolboard_models::public::{CarouselItem, PublicAnnouncement, PublicAnnouncementsQuery};

use super::service::PublicService;
use crate::state::AppState;

/// Published announcements for the public site
#[utoipa::path(
    get,
    path = "/api/public/announcements",
    params(PublicAnnouncementsQuery),
    responses(
        (status = 200, description = "Live announcements, pinned first", body = Vec<PublicAnnouncement>)
    ),
    tag = "Public"
)]
#[instrument(skip(state))]
pub async fn public_announcements(
    State(state): State<AppState>,
    Query(query): Query<PublicAnnouncementsQuery>,
) -> Result<ApiResponse<Vec<PublicAnnouncement>>, AppError> {
    let announcements = PublicService::announcements(&state.db, query.limit).await?;
    Ok(ApiResponse::ok(announcements))
}

/// Public school information
#[utoipa::path(
    get,
    path = "/api/public/info",
    responses(
        (status = 200, description = "Public settings keyed by name", body = BTreeMap<String, String>)
    ),
    tag = "Public"
)]
#[instrument(skip(state))]
pub async fn public_info(
    State(state): State<AppState>,
) -> Result<ApiResponse<BTreeMap<String, String>>, AppError> {
    Ok(ApiResponse::ok(PublicService::info(&state.db).await?))
}

/// Images for the parents' corner carousel
#[utoipa::path(
    get,
    path = "/api/parents-corner/carousel",
    responses(
        (status = 200, description = "Carousel images, newest first", body = Vec<CarouselItem>)
    ),
    tag = "Public"
)]
#[instrument(skip(state))]
pub async fn parents_corner_carousel(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CarouselItem>>, AppError> {
    let items = PublicService::carousel(&state.db, state.storage.as_ref()).await?;
    Ok(ApiResponse::ok(items))
}
