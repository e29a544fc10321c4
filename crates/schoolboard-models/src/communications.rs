//! Unified communications: announcements, messages, reminders and
//! newsletters share one table and one API.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use schoolboard_core::PaginationParams;
use schoolboard_core::permissions::RoleName;
use schoolboard_core::query::{lenient_bool, lenient_option, trimmed_string};

use crate::enums::{BoardType, CommunicationStatus, CommunicationType, Priority, TargetAudience};
use crate::ids::{CommunicationId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub id: CommunicationId,
    #[serde(rename = "type")]
    pub communication_type: CommunicationType,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub target_audience: TargetAudience,
    pub board_type: BoardType,
    /// Free-text tag naming where the record came from (e.g. `legacy_reminders`)
    pub source_group: Option<String>,
    pub priority: Priority,
    pub status: CommunicationStatus,
    pub is_pinned: bool,
    pub is_important: bool,
    pub is_featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Communication {
    /// Whether a non-privileged reader may see this record at `now`.
    pub fn is_visible_to(&self, audiences: &[TargetAudience], now: DateTime<Utc>) -> bool {
        self.status == CommunicationStatus::Published
            && self.expires_at.is_none_or(|at| at > now)
            && self.published_at.is_none_or(|at| at <= now)
            && audiences.contains(&self.target_audience)
    }
}

impl TargetAudience {
    /// Audiences a reader holding `role` is allowed to see.
    pub fn visible_to(role: RoleName) -> Vec<TargetAudience> {
        match role {
            RoleName::Admin | RoleName::OfficeMember => TargetAudience::ALL.to_vec(),
            RoleName::Teacher => vec![
                TargetAudience::All,
                TargetAudience::Teachers,
                TargetAudience::Staff,
            ],
            RoleName::Parent => vec![TargetAudience::All, TargetAudience::Parents],
        }
    }
}

/// What part of the table a caller may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Admins and office members: every record, any status.
    Everything,
    /// Published, unexpired, already-live records aimed at these audiences.
    Restricted { audiences: Vec<TargetAudience> },
}

impl Visibility {
    pub fn for_role(role: Option<RoleName>) -> Self {
        match role {
            Some(role) if role.is_privileged_viewer() => Visibility::Everything,
            Some(role) => Visibility::Restricted {
                audiences: TargetAudience::visible_to(role),
            },
            None => Visibility::Restricted {
                audiences: vec![TargetAudience::All],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ToSchema)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ExpiresAt,
    Priority,
    Title,
}

impl SortField {
    /// SQL expression to order by. Priority sorts by severity, not by name.
    pub fn sql(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "c.created_at",
            SortField::UpdatedAt => "c.updated_at",
            SortField::PublishedAt => "c.published_at",
            SortField::ExpiresAt => "c.expires_at",
            SortField::Priority => {
                "CASE c.priority WHEN 'urgent' THEN 4 WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END"
            }
            SortField::Title => "c.title",
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "createdat" => Ok(SortField::CreatedAt),
            "updatedat" => Ok(SortField::UpdatedAt),
            "publishedat" => Ok(SortField::PublishedAt),
            "expiresat" => Ok(SortField::ExpiresAt),
            "priority" => Ok(SortField::Priority),
            "title" => Ok(SortField::Title),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ToSchema)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

/// Raw list query. Unrecognized or malformed values are dropped rather
/// than rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CommunicationQuery {
    #[serde(rename = "type", default, deserialize_with = "lenient_option")]
    pub communication_type: Option<CommunicationType>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub source_group: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub board_type: Option<BoardType>,
    /// Only honoured for admins and office members
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<CommunicationStatus>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_pinned: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_important: Option<bool>,
    /// Case-insensitive match on title, content and summary
    #[serde(default, deserialize_with = "trimmed_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub page: Option<i64>,
    /// 1-100, default 10
    #[serde(default, deserialize_with = "lenient_option")]
    pub limit: Option<i64>,
    /// createdAt, updatedAt, publishedAt, expiresAt, priority or title
    #[serde(default, deserialize_with = "lenient_option")]
    #[param(value_type = Option<String>)]
    pub sort_by: Option<SortField>,
    /// asc or desc (default desc)
    #[serde(default, deserialize_with = "lenient_option")]
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

/// Resolved filter handed to the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunicationFilter {
    pub communication_type: Option<CommunicationType>,
    pub source_group: Option<String>,
    pub board_type: Option<BoardType>,
    pub status: Option<CommunicationStatus>,
    pub priority: Option<Priority>,
    pub is_pinned: Option<bool>,
    pub is_important: Option<bool>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub pagination: PaginationParams,
    pub visibility: Visibility,
}

impl CommunicationQuery {
    pub fn into_filter(self, visibility: Visibility) -> CommunicationFilter {
        // Restricted readers only ever see published records.
        let status = match visibility {
            Visibility::Everything => self.status,
            Visibility::Restricted { .. } => None,
        };

        CommunicationFilter {
            communication_type: self.communication_type,
            source_group: self.source_group,
            board_type: self.board_type,
            status,
            priority: self.priority,
            is_pinned: self.is_pinned,
            is_important: self.is_important,
            search: self.search,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            pagination: PaginationParams::new(self.page, self.limit),
            visibility,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunicationDto {
    #[serde(rename = "type")]
    pub communication_type: CommunicationType,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    pub target_audience: Option<TargetAudience>,
    pub board_type: Option<BoardType>,
    #[validate(length(max = 100))]
    pub source_group: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<CommunicationStatus>,
    pub is_pinned: Option<bool>,
    pub is_important: Option<bool>,
    pub is_featured: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A create request with defaults applied and text normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommunication {
    pub communication_type: CommunicationType,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub target_audience: TargetAudience,
    pub board_type: BoardType,
    pub source_group: Option<String>,
    pub priority: Priority,
    pub status: CommunicationStatus,
    pub is_pinned: bool,
    pub is_important: bool,
    pub is_featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

fn non_blank(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_window(
    published_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), String> {
    match (published_at, expires_at) {
        (Some(published), Some(expires)) if expires <= published => {
            Err("expiresAt must be after publishedAt".to_string())
        }
        _ => Ok(()),
    }
}

impl CreateCommunicationDto {
    /// Applies defaults (`all`, `general`, `medium`, `draft`). Publishing on
    /// create stamps `published_at` with `now` unless one was given.
    pub fn normalize(self, now: DateTime<Utc>) -> Result<NewCommunication, String> {
        let title = non_blank(&self.title, "title")?;
        let content = non_blank(&self.content, "content")?;
        let status = self.status.unwrap_or_default();

        let published_at = match (status, self.published_at) {
            (CommunicationStatus::Published, None) => Some(now),
            (_, given) => given,
        };
        check_window(published_at, self.expires_at)?;

        Ok(NewCommunication {
            communication_type: self.communication_type,
            title,
            content,
            summary: optional_text(self.summary),
            target_audience: self.target_audience.unwrap_or_default(),
            board_type: self.board_type.unwrap_or_default(),
            source_group: optional_text(self.source_group),
            priority: self.priority.unwrap_or_default(),
            status,
            is_pinned: self.is_pinned.unwrap_or(false),
            is_important: self.is_important.unwrap_or(false),
            is_featured: self.is_featured.unwrap_or(false),
            published_at,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommunicationDto {
    #[serde(rename = "type")]
    pub communication_type: Option<CommunicationType>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    pub target_audience: Option<TargetAudience>,
    pub board_type: Option<BoardType>,
    #[validate(length(max = 100))]
    pub source_group: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<CommunicationStatus>,
    pub is_pinned: Option<bool>,
    pub is_important: Option<bool>,
    pub is_featured: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UpdateCommunicationDto {
    /// Merges the provided fields into `current`. The first transition to
    /// `published` stamps `published_at` if it is still empty.
    pub fn apply_to(
        self,
        mut current: Communication,
        now: DateTime<Utc>,
    ) -> Result<Communication, String> {
        if let Some(kind) = self.communication_type {
            current.communication_type = kind;
        }
        if let Some(title) = self.title {
            current.title = non_blank(&title, "title")?;
        }
        if let Some(content) = self.content {
            current.content = non_blank(&content, "content")?;
        }
        if self.summary.is_some() {
            current.summary = optional_text(self.summary);
        }
        if let Some(audience) = self.target_audience {
            current.target_audience = audience;
        }
        if let Some(board) = self.board_type {
            current.board_type = board;
        }
        if self.source_group.is_some() {
            current.source_group = optional_text(self.source_group);
        }
        if let Some(priority) = self.priority {
            current.priority = priority;
        }
        if let Some(flag) = self.is_pinned {
            current.is_pinned = flag;
        }
        if let Some(flag) = self.is_important {
            current.is_important = flag;
        }
        if let Some(flag) = self.is_featured {
            current.is_featured = flag;
        }
        if self.published_at.is_some() {
            current.published_at = self.published_at;
        }
        if self.expires_at.is_some() {
            current.expires_at = self.expires_at;
        }
        if let Some(status) = self.status {
            if status == CommunicationStatus::Published && current.published_at.is_none() {
                current.published_at = Some(now);
            }
            current.status = status;
        }

        check_window(current.published_at, current.expires_at)?;
        current.updated_at = now;
        Ok(current)
    }
}
