//! # SchoolBoard Core
//!
//! Core types, errors, and utilities for the SchoolBoard API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error type with HTTP envelope conversion
//! - [`response`]: The uniform `{success, data, pagination}` success envelope
//! - [`pagination`]: Page/limit pagination parameters and metadata
//! - [`password`]: bcrypt password hashing and verification
//! - [`permissions`]: Closed role and permission enumerations
//! - [`cache_control`]: `Cache-Control` header composition for public routes
//! - [`file_storage`]: Storage backend abstraction for uploaded files
//! - [`query`]: Lenient query-string deserializers
//!
//! # Example
//!
//! ```ignore
//! use schoolboard_core::errors::AppError;
//! use schoolboard_core::pagination::{PaginationParams, PaginationMeta};
//! use schoolboard_core::permissions::{Permission, RoleName};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Communication not found"));
//!
//! assert!(RoleName::OfficeMember.grants(Permission::ManageCommunications));
//!
//! let params = PaginationParams::default();
//! let meta = PaginationMeta::new(params.page(), params.limit(), 42);
//! ```

pub mod cache_control;
pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod query;
pub mod response;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use permissions::{Permission, RoleName};
pub use response::ApiResponse;
