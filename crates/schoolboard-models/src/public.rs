//! Shapes served by the unauthenticated, cacheable endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use schoolboard_core::query::lenient_option;

use crate::enums::Priority;
use crate::ids::{CommunicationId, FileUploadId};

pub const PUBLIC_ANNOUNCEMENTS_MAX_LIMIT: i64 = 50;

/// `related_type` tag for images in the parents' corner carousel.
pub const PARENTS_CORNER_CAROUSEL: &str = "parents_corner_carousel";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicAnnouncement {
    pub id: CommunicationId,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub priority: Priority,
    pub is_pinned: bool,
    pub is_important: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PublicAnnouncementsQuery {
    /// 1-50, default 10
    #[serde(default, deserialize_with = "lenient_option")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CarouselRow {
    pub id: FileUploadId,
    pub path: String,
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub id: FileUploadId,
    pub url: String,
    pub alt: String,
    pub created_at: DateTime<Utc>,
}

/// Derives alt text from a filename: `sports-day_2024.jpg` -> `sports day 2024`.
pub fn alt_text(original_filename: &str) -> String {
    let stem = original_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(original_filename);

    stem.split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
