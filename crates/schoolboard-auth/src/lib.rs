//! # SchoolBoard Auth
//!
//! Token and session cookie utilities.
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification
//! - [`cookies`]: `auth-token`, `refresh-token` and OAuth correlation cookies
//!
//! Access and refresh tokens are both HS256 JWTs signed with the same
//! secret. Each carries a `token_use` marker, and verification refuses a
//! token of the wrong kind.
//!
//! # Example
//!
//! ```ignore
//! use schoolboard_auth::{AccessTokenInput, create_access_token, verify_token};
//! use schoolboard_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//!
//! let token = create_access_token(
//!     &AccessTokenInput {
//!         user_id,
//!         email: "parent@example.com",
//!         first_name: "Ada",
//!         last_name: "Lovelace",
//!         roles: vec!["parent".to_string()],
//!     },
//!     &config,
//! )?;
//!
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod cookies;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims, TokenUse};
pub use jwt::{
    AccessTokenInput, TokenPair, create_access_token, create_refresh_token, create_token_pair,
    verify_refresh_token, verify_token,
};
