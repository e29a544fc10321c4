use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::enums::DigestFrequency;
use crate::ids::UserId;

/// A user's notification settings. Users without a stored row get
/// [`NotificationPreference::defaults_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub user_id: UserId,
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub announcements: bool,
    pub reminders: bool,
    pub newsletters: bool,
    pub messages: bool,
    pub digest_frequency: DigestFrequency,
    /// `None` until the user saves preferences
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationPreference {
    pub fn defaults_for(user_id: UserId) -> Self {
        Self {
            user_id,
            email_enabled: true,
            push_enabled: false,
            announcements: true,
            reminders: true,
            newsletters: true,
            messages: true,
            digest_frequency: DigestFrequency::Immediate,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateNotificationPreferencesDto {
    pub email_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub announcements: Option<bool>,
    pub reminders: Option<bool>,
    pub newsletters: Option<bool>,
    pub messages: Option<bool>,
    pub digest_frequency: Option<DigestFrequency>,
}

impl UpdateNotificationPreferencesDto {
    /// Overlays the provided fields on `current`.
    pub fn merge_into(self, current: NotificationPreference) -> NotificationPreference {
        NotificationPreference {
            user_id: current.user_id,
            email_enabled: self.email_enabled.unwrap_or(current.email_enabled),
            push_enabled: self.push_enabled.unwrap_or(current.push_enabled),
            announcements: self.announcements.unwrap_or(current.announcements),
            reminders: self.reminders.unwrap_or(current.reminders),
            newsletters: self.newsletters.unwrap_or(current.newsletters),
            messages: self.messages.unwrap_or(current.messages),
            digest_frequency: self.digest_frequency.unwrap_or(current.digest_frequency),
            updated_at: current.updated_at,
        }
    }
}
