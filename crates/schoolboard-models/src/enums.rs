//! Closed value sets persisted as `TEXT`.
//!
//! Each enum serializes to its lowercase wire name, parses
//! case-insensitively, and encodes/decodes through Postgres `TEXT`. An
//! unknown value read from the database is a decode error.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// A string did not name any variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }
    };
}

text_enum!(
    /// Which of the four merged content kinds a communication is.
    CommunicationType {
        Announcement => "announcement",
        Message => "message",
        Reminder => "reminder",
        Newsletter => "newsletter",
    }
);

text_enum!(
    TargetAudience {
        All => "all",
        Parents => "parents",
        Teachers => "teachers",
        Students => "students",
        Staff => "staff",
    }
);

text_enum!(
    /// Notice board a communication is pinned to.
    BoardType {
        General => "general",
        Parents => "parents",
        Teachers => "teachers",
        Students => "students",
    }
);

text_enum!(
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
);

text_enum!(
    /// Lifecycle: `draft` -> `published` -> `archived`/`closed`.
    CommunicationStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
        Closed => "closed",
    }
);

text_enum!(
    UpgradeRequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

text_enum!(
    DigestFrequency {
        Immediate => "immediate",
        Daily => "daily",
        Weekly => "weekly",
        Never => "never",
    }
);

impl Default for TargetAudience {
    fn default() -> Self {
        TargetAudience::All
    }
}

impl Default for BoardType {
    fn default() -> Self {
        BoardType::General
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Default for CommunicationStatus {
    fn default() -> Self {
        CommunicationStatus::Draft
    }
}

impl Default for DigestFrequency {
    fn default() -> Self {
        DigestFrequency::Immediate
    }
}

impl UpgradeRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UpgradeRequestStatus::Pending)
    }
}
