use std::collections::BTreeMap;

use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{instrument, warn};

use schoolboard_core::AppError;
use schoolboard_core::file_storage::FileStorage;
use schoolboard_models::public::{
    CarouselItem, CarouselRow, PARENTS_CORNER_CAROUSEL, PUBLIC_ANNOUNCEMENTS_MAX_LIMIT,
    PublicAnnouncement, alt_text,
};
use schoolboard_models::{CommunicationStatus, CommunicationType, TargetAudience};

pub const PUBLIC_ANNOUNCEMENTS_DEFAULT_LIMIT: i64 = 10;

pub fn clamp_public_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(PUBLIC_ANNOUNCEMENTS_DEFAULT_LIMIT)
        .clamp(1, PUBLIC_ANNOUNCEMENTS_MAX_LIMIT)
}

pub struct PublicService;

impl PublicService {
    /// Live announcements meant for everyone or for parents, pinned first.
    #[instrument(skip(db))]
    pub async fn announcements(
        db: &PgPool,
        limit: Option<i64>,
    ) -> Result<Vec<PublicAnnouncement>, AppError> {
        let audiences = vec![TargetAudience::All, TargetAudience::Parents];

        sqlx::query_as::<_, PublicAnnouncement>(
            r#"
            SELECT id, title, content, summary, priority, is_pinned, is_important,
                   published_at, expires_at
            FROM communications
            WHERE communication_type = $1
              AND status = $2
              AND (expires_at IS NULL OR expires_at > $3)
              AND (published_at IS NULL OR published_at <= $3)
              AND target_audience = ANY($4)
            ORDER BY is_pinned DESC, published_at DESC NULLS LAST, created_at DESC
            LIMIT $5
            "#,
        )
        .bind(CommunicationType::Announcement)
        .bind(CommunicationStatus::Published)
        .bind(Utc::now())
        .bind(audiences)
        .bind(clamp_public_limit(limit))
        .fetch_all(db)
        .await
        .context("Failed to fetch public announcements")
        .map_err(AppError::database)
    }

    /// Public settings as a key to value map.
    #[instrument(skip(db))]
    pub async fn info(db: &PgPool) -> Result<BTreeMap<String, String>, AppError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM system_settings WHERE is_public = TRUE ORDER BY key",
        )
        .fetch_all(db)
        .await
        .context("Failed to fetch public settings")
        .map_err(AppError::database)?;

        Ok(rows.into_iter().collect())
    }

    #[instrument(skip(db, storage))]
    pub async fn carousel(
        db: &PgPool,
        storage: &dyn FileStorage,
    ) -> Result<Vec<CarouselItem>, AppError> {
        let rows = sqlx::query_as::<_, CarouselRow>(
            r#"
            SELECT id, path, original_filename, created_at
            FROM file_uploads
            WHERE related_type = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(PARENTS_CORNER_CAROUSEL)
        .fetch_all(db)
        .await
        .context("Failed to fetch carousel images")
        .map_err(AppError::database)?;

        // A row whose path no longer maps to a valid key is skipped.
        let items = rows
            .into_iter()
            .filter_map(|row| match storage.get_url(&row.path) {
                Ok(url) => Some(CarouselItem {
                    id: row.id,
                    url,
                    alt: alt_text(&row.original_filename),
                    created_at: row.created_at,
                }),
                Err(err) => {
                    warn!(upload_id = %row.id, error = %err, "Skipping carousel image");
                    None
                }
            })
            .collect();

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_public_limit() {
        assert_eq!(clamp_public_limit(None), 10);
        assert_eq!(clamp_public_limit(Some(0)), 1);
        assert_eq!(clamp_public_limit(Some(25)), 25);
        assert_eq!(clamp_public_limit(Some(500)), 50);
    }
}
