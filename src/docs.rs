use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use schoolboard_core::{PaginationMeta, Permission, RoleName};
use schoolboard_models::auth::{
    LoginRequest, LoginResponse, OAuthUrlResponse, RefreshStatus, RegisterRequest,
};
use schoolboard_models::communications::{
    Communication, CreateCommunicationDto, UpdateCommunicationDto,
};
use schoolboard_models::notifications::{
    NotificationPreference, UpdateNotificationPreferencesDto,
};
use schoolboard_models::public::{CarouselItem, PublicAnnouncement};
use schoolboard_models::roles::{MyPermissions, RoleWithPermissions};
use schoolboard_models::settings::{SystemSetting, UpsertSettingDto};
use schoolboard_models::upgrade_requests::{
    CreateUpgradeRequestDto, PermissionUpgradeRequest, ReviewUpgradeRequestDto,
    UpgradeRequestWithUser,
};
use schoolboard_models::uploads::{FileUpload, FileUploadResponse};
use schoolboard_models::users::{ApproveUserDto, RejectedUser, UserResponse};
use schoolboard_models::{
    BoardType, CommunicationStatus, CommunicationType, DigestFrequency, Priority, TargetAudience,
    UpgradeRequestStatus,
};

use crate::modules::health::HealthStatus;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::health,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::refresh_status,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::google_redirect,
        crate::modules::auth::controller::google_url,
        crate::modules::auth::controller::google_callback,
        crate::modules::roles::controller::list_roles,
        crate::modules::roles::controller::my_permissions,
        crate::modules::communications::controller::list_communications,
        crate::modules::communications::controller::create_communication,
        crate::modules::communications::controller::get_communication,
        crate::modules::communications::controller::update_communication,
        crate::modules::communications::controller::delete_communication,
        crate::modules::public::controller::public_announcements,
        crate::modules::public::controller::public_info,
        crate::modules::public::controller::parents_corner_carousel,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::approve_user,
        crate::modules::users::controller::reject_user,
        crate::modules::upgrade_requests::controller::create_request,
        crate::modules::upgrade_requests::controller::my_requests,
        crate::modules::upgrade_requests::controller::list_requests,
        crate::modules::upgrade_requests::controller::approve_request,
        crate::modules::upgrade_requests::controller::reject_request,
        crate::modules::notifications::controller::get_preferences,
        crate::modules::notifications::controller::update_preferences,
        crate::modules::notifications::controller::reset_preferences,
        crate::modules::uploads::controller::upload_file,
        crate::modules::uploads::controller::list_uploads,
        crate::modules::uploads::controller::delete_upload,
        crate::modules::settings::controller::list_settings,
        crate::modules::settings::controller::upsert_setting,
        crate::modules::settings::controller::delete_setting,
    ),
    components(
        schemas(
            HealthStatus,
            PaginationMeta,
            Permission,
            RoleName,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshStatus,
            OAuthUrlResponse,
            UserResponse,
            ApproveUserDto,
            RejectedUser,
            RoleWithPermissions,
            MyPermissions,
            Communication,
            CreateCommunicationDto,
            UpdateCommunicationDto,
            CommunicationType,
            CommunicationStatus,
            TargetAudience,
            BoardType,
            Priority,
            PublicAnnouncement,
            CarouselItem,
            PermissionUpgradeRequest,
            UpgradeRequestWithUser,
            CreateUpgradeRequestDto,
            ReviewUpgradeRequestDto,
            UpgradeRequestStatus,
            NotificationPreference,
            UpdateNotificationPreferencesDto,
            DigestFrequency,
            FileUpload,
            FileUploadResponse,
            SystemSetting,
            UpsertSettingDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Authentication", description = "Registration, sessions and Google sign-in"),
        (name = "Roles", description = "Roles and the caller's permissions"),
        (name = "Communications", description = "Announcements, messages, reminders and newsletters"),
        (name = "Public", description = "Unauthenticated, cacheable endpoints for the public site"),
        (name = "Upgrade Requests", description = "Requests for a higher role"),
        (name = "Notifications", description = "Per-user notification preferences"),
        (name = "Uploads", description = "File uploads"),
        (name = "Admin", description = "User approval, upgrade review and system settings")
    ),
    info(
        title = "SchoolBoard API",
        version = "0.1.0",
        description = "School portal API: communications, parent-facing public content and admin tooling.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/health",
            "/api/auth/login",
            "/api/v1/communications",
            "/api/v1/communications/{id}",
            "/api/public/announcements",
            "/api/admin/users/{id}/reject",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
