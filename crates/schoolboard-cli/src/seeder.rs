//! Fake data for local development.
//!
//! Seeded users get `@example.com` addresses and seeded communications are
//! tagged with [`SEED_SOURCE_GROUP`], so clearing never touches real data.

pub mod communications;
pub mod models;
pub mod users;

use std::time::Instant;

use sqlx::PgPool;

pub use models::{SeedConfig, UsersByRole};

/// `source_group` stamped on every seeded communication.
pub const SEED_SOURCE_GROUP: &str = "seed";

/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "password123";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    users::seed_users(db, &config.users, SEED_PASSWORD).await?;
    communications::seed_communications(db, config.communications).await?;

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   Seeded accounts sign in with password '{SEED_PASSWORD}'");
    Ok(())
}

pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🧹 Clearing seeded data...");

    communications::clear_communications(db).await?;
    users::clear_users(db).await?;

    println!("\n✅ Cleared seeded data in {:?}", start_time.elapsed());
    Ok(())
}
