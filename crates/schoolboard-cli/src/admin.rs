//! Bootstrap accounts.

use schoolboard_core::hash_password;
use schoolboard_core::permissions::RoleName;
use sqlx::PgPool;
use uuid::Uuid;

/// Creates an active user holding the `admin` role.
///
/// Fails when the email is already registered.
pub async fn create_admin(
    db: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(format!("'{email}' is not a valid email address").into());
    }
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&email)
        .fetch_one(db)
        .await?;
    if exists {
        return Err(format!("A user with email {email} already exists").into());
    }

    let password_hash = hash_password(password).map_err(|e| e.public_message())?;

    let mut tx = db.begin().await?;

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(password_hash)
    .bind(first_name.trim())
    .bind(last_name.trim())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = $2",
    )
    .bind(user_id)
    .bind(RoleName::Admin.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}
