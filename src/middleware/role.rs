//! Permission checks layered on top of [`AuthUser`].
//!
//! Every check re-reads the caller's roles from the database. A failed
//! lookup is logged and answered with 403, never with access.
//!
//! Two shapes are offered:
//! 1. Route-layer middleware (`require_admin`, `require_office_member`)
//!    for whole routers
//! 2. Extractors generated by [`require_permission!`](crate::require_permission)
//!    for single handlers

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tracing::{error, warn};

use schoolboard_core::{AppError, Permission, RoleName};

use crate::metrics::track_authorization_check;
use crate::middleware::auth::AuthUser;
use crate::modules::roles::service::RoleService;
use crate::state::AppState;

fn denied(permission: Permission) -> AppError {
    AppError::forbidden(format!(
        "Access denied. Missing required permission: {}",
        permission.as_str()
    ))
}

/// Ok when the caller holds `permission`, 403 otherwise.
pub async fn ensure_permission(
    db: &PgPool,
    auth_user: &AuthUser,
    permission: Permission,
) -> Result<(), AppError> {
    let user_id = auth_user.user_id()?;

    match RoleService::has_permission(db, user_id, permission).await {
        Ok(allowed) => {
            track_authorization_check(allowed, permission.as_str());
            if allowed {
                Ok(())
            } else {
                warn!(user_id = %user_id, permission = permission.as_str(), "Permission denied");
                Err(denied(permission))
            }
        }
        Err(err) => {
            error!(
                user_id = %user_id,
                permission = permission.as_str(),
                error = ?err.error,
                "Permission lookup failed, denying"
            );
            track_authorization_check(false, permission.as_str());
            Err(denied(permission))
        }
    }
}

/// Highest-ranked role of the caller, or `None` when they hold none.
/// Lookup failures deny.
pub async fn effective_role(
    db: &PgPool,
    auth_user: &AuthUser,
) -> Result<Option<RoleName>, AppError> {
    let user_id = auth_user.user_id()?;

    RoleService::effective_role(db, user_id)
        .await
        .map_err(|err| {
            error!(user_id = %user_id, error = ?err.error, "Role lookup failed, denying");
            AppError::forbidden("Access denied")
        })
}

/// Authenticates the request and checks `permission` before running the
/// rest of the stack.
pub async fn require_permission(
    state: AppState,
    req: Request,
    next: Next,
    permission: Permission,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    ensure_permission(&state.db, &auth_user, permission).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

/// Route layer for admin-only routers.
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/", get(list_users))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_permission(state, req, next, Permission::ManageUsers).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Route layer for routers office members and admins share.
pub async fn require_office_member(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_permission(state, req, next, Permission::AccessAdminPanel).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_denied_message_names_permission() {
        let err = denied(Permission::ManageUsers);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(
            err.public_message(),
            "Access denied. Missing required permission: users:manage"
        );
    }
}
