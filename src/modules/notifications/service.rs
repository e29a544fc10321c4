use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;

use schoolboard_core::AppError;
use schoolboard_models::UserId;
use schoolboard_models::notifications::{
    NotificationPreference, UpdateNotificationPreferencesDto,
};

const PREFERENCE_COLUMNS: &str = "user_id, email_enabled, push_enabled, announcements, reminders, \
     newsletters, messages, digest_frequency, updated_at";

pub struct NotificationService;

impl NotificationService {
    /// Stored preferences, or the defaults when the user never saved any.
    #[instrument(skip(db))]
    pub async fn get_preferences(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<NotificationPreference, AppError> {
        let stored = sqlx::query_as::<_, NotificationPreference>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch notification preferences")
        .map_err(AppError::database)?;

        Ok(stored.unwrap_or_else(|| NotificationPreference::defaults_for(user_id)))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_preferences(
        db: &PgPool,
        user_id: UserId,
        dto: UpdateNotificationPreferencesDto,
    ) -> Result<NotificationPreference, AppError> {
        let current = Self::get_preferences(db, user_id).await?;
        let next = dto.merge_into(current);

        sqlx::query_as::<_, NotificationPreference>(&format!(
            r#"
            INSERT INTO notification_preferences
                (user_id, email_enabled, push_enabled, announcements, reminders,
                 newsletters, messages, digest_frequency, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                email_enabled = EXCLUDED.email_enabled,
                push_enabled = EXCLUDED.push_enabled,
                announcements = EXCLUDED.announcements,
                reminders = EXCLUDED.reminders,
                newsletters = EXCLUDED.newsletters,
                messages = EXCLUDED.messages,
                digest_frequency = EXCLUDED.digest_frequency,
                updated_at = NOW()
            RETURNING {PREFERENCE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(next.email_enabled)
        .bind(next.push_enabled)
        .bind(next.announcements)
        .bind(next.reminders)
        .bind(next.newsletters)
        .bind(next.messages)
        .bind(next.digest_frequency)
        .fetch_one(db)
        .await
        .context("Failed to save notification preferences")
        .map_err(AppError::database)
    }

    /// Drops the stored row so the defaults apply again.
    #[instrument(skip(db))]
    pub async fn reset_preferences(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<NotificationPreference, AppError> {
        sqlx::query("DELETE FROM notification_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await
            .context("Failed to reset notification preferences")
            .map_err(AppError::database)?;

        Ok(NotificationPreference::defaults_for(user_id))
    }
}
