//! # SchoolBoard CLI
//!
//! Administrative commands and development seed data for SchoolBoard.
//!
//! ## Usage
//!
//! ```ignore
//! use schoolboard_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::default().with_communications(50);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
