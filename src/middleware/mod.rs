//! Authentication and authorization for handlers and routers.
//!
//! - [`auth`]: the [`AuthUser`](auth::AuthUser) extractor and the
//!   permission extractors generated by `require_permission!`
//! - [`role`]: database-backed permission checks and route-layer
//!   middleware (`require_admin`, `require_office_member`)
//!
//! # Flow
//!
//! 1. The client sends `Authorization: Bearer <token>` or the `auth-token` cookie
//! 2. `AuthUser` verifies the JWT (401 on failure)
//! 3. Permission extractors re-read the caller's roles and check the
//!    permission table (403 on a miss or a failed lookup)
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireCommunicationsManage};
//!
//! async fn me(auth_user: AuthUser) -> impl IntoResponse { /* any signed-in user */ }
//!
//! async fn create(RequireCommunicationsManage(auth_user): RequireCommunicationsManage) {
//!     // office members and admins only
//! }
//! ```

pub mod auth;
pub mod role;
