use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use schoolboard_core::PaginationParams;
use schoolboard_core::permissions::RoleName;
use schoolboard_core::query::lenient_option;

use crate::enums::UpgradeRequestStatus;
use crate::ids::{UpgradeRequestId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionUpgradeRequest {
    pub id: UpgradeRequestId,
    pub user_id: UserId,
    pub requested_role: String,
    pub reason: String,
    pub status: UpgradeRequestStatus,
    pub reviewer_id: Option<UserId>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Admin listing row with the requester's identity joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequestWithUser {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: PermissionUpgradeRequest,
    pub user_email: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpgradeRequestDto {
    #[schema(value_type = String, example = "teacher")]
    pub requested_role: RoleName,
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ReviewUpgradeRequestDto {
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpgradeRequestQuery {
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<UpgradeRequestStatus>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub limit: Option<i64>,
}

impl UpgradeRequestQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dto_parses_role() {
        let dto: CreateUpgradeRequestDto =
            serde_json::from_str(r#"{"requestedRole":"teacher","reason":"I teach year 4"}"#)
                .unwrap();
        assert_eq!(dto.requested_role, RoleName::Teacher);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_empty_reason_invalid() {
        let dto = CreateUpgradeRequestDto {
            requested_role: RoleName::Teacher,
            reason: String::new(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_query_status_lenient() {
        let q: UpgradeRequestQuery = serde_json::from_str(r#"{"status":"maybe"}"#).unwrap();
        assert!(q.status.is_none());
        let q: UpgradeRequestQuery = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(q.status, Some(UpgradeRequestStatus::Pending));
    }
}
