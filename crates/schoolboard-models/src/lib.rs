//! # SchoolBoard Models
//!
//! Database entities, request/response DTOs and query types.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed UUID newtypes
//! - [`enums`]: Closed value sets stored as `TEXT` columns
//! - [`users`]: Users and admin user management DTOs
//! - [`roles`]: Role rows
//! - [`auth`]: Registration, login and OAuth DTOs
//! - [`communications`]: Unified announcements, messages, reminders, newsletters
//! - [`public`]: Shapes served by unauthenticated endpoints
//! - [`upgrade_requests`]: Role upgrade requests
//! - [`notifications`]: Per-user notification preferences
//! - [`uploads`]: File upload metadata
//! - [`settings`]: Key/value system settings

pub mod auth;
pub mod communications;
pub mod enums;
pub mod ids;
pub mod notifications;
pub mod public;
pub mod roles;
pub mod settings;
pub mod upgrade_requests;
pub mod uploads;
pub mod users;

pub use enums::{
    BoardType, CommunicationStatus, CommunicationType, DigestFrequency, Priority, TargetAudience,
    UpgradeRequestStatus,
};
pub use ids::{CommunicationId, FileUploadId, RoleId, UpgradeRequestId, UserId};
