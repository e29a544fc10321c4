use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::{info, instrument};

use schoolboard_core::AppError;
use schoolboard_models::UserId;
use schoolboard_models::settings::{SystemSetting, UpsertSettingDto, is_valid_setting_key};

const SETTING_COLUMNS: &str = "key, value, description, is_public, updated_by, updated_at";

fn check_key(key: &str) -> Result<(), AppError> {
    if is_valid_setting_key(key) {
        Ok(())
    } else {
        Err(AppError::bad_request(anyhow!(
            "Setting keys use lowercase letters, digits, '.', '_' or '-'"
        )))
    }
}

pub struct SettingsService;

impl SettingsService {
    #[instrument(skip(db))]
    pub async fn list(db: &PgPool) -> Result<Vec<SystemSetting>, AppError> {
        sqlx::query_as::<_, SystemSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM system_settings ORDER BY key"
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch settings")
        .map_err(AppError::database)
    }

    /// Creates or replaces a setting. An omitted `isPublic` keeps the stored
    /// flag, or `false` for a new key.
    #[instrument(skip(db, dto))]
    pub async fn upsert(
        db: &PgPool,
        key: &str,
        dto: UpsertSettingDto,
        updated_by: UserId,
    ) -> Result<SystemSetting, AppError> {
        check_key(key)?;

        let setting = sqlx::query_as::<_, SystemSetting>(&format!(
            r#"
            INSERT INTO system_settings (key, value, description, is_public, updated_by, updated_at)
            VALUES ($1, $2, $3, COALESCE($4, FALSE), $5, NOW())
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                description = COALESCE($3, system_settings.description),
                is_public = COALESCE($4, system_settings.is_public),
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING {SETTING_COLUMNS}
            "#
        ))
        .bind(key)
        .bind(&dto.value)
        .bind(&dto.description)
        .bind(dto.is_public)
        .bind(updated_by)
        .fetch_one(db)
        .await
        .context("Failed to save setting")
        .map_err(AppError::database)?;

        info!(key = %key, "Setting saved");
        Ok(setting)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, key: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM system_settings WHERE key = $1")
            .bind(key)
            .execute(db)
            .await
            .context("Failed to delete setting")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Setting not found")));
        }

        info!(key = %key, "Setting deleted");
        Ok(())
    }
}
