use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use schoolboard_core::PaginationParams;
use schoolboard_core::query::{lenient_option, trimmed_string};

use crate::ids::{FileUploadId, UserId};

/// Metadata for a stored file. `path` is the storage key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub id: FileUploadId,
    pub stored_filename: String,
    pub original_filename: String,
    pub path: String,
    pub size_bytes: i64,
    pub mime_type: String,
    /// Logical use, e.g. `hero_image` or `parents_corner_carousel`
    pub related_type: String,
    pub related_id: Option<Uuid>,
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    #[serde(flatten)]
    pub upload: FileUpload,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UploadListQuery {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub related_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub related_id: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub limit: Option<i64>,
}

impl UploadListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

/// `related_type` must be a short snake_case tag.
pub fn is_valid_related_type(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_type_validation() {
        assert!(is_valid_related_type("hero_image"));
        assert!(is_valid_related_type("parents_corner_carousel"));
        assert!(!is_valid_related_type(""));
        assert!(!is_valid_related_type("Hero Image"));
        assert!(!is_valid_related_type("../x"));
    }

    #[test]
    fn test_query_related_id_lenient() {
        let q: UploadListQuery =
            serde_json::from_str(r#"{"relatedType":"hero_image","relatedId":"nope"}"#).unwrap();
        assert_eq!(q.related_type.as_deref(), Some("hero_image"));
        assert!(q.related_id.is_none());
    }
}
