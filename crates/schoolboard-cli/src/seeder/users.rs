//! User seeding.

use std::time::Instant;

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use schoolboard_core::hash_password;
use schoolboard_core::permissions::RoleName;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::models::{UserSeed, UsersByRole};

// 5 bind parameters per row keeps a chunk well under Postgres' 65535 limit.
const BATCH_SIZE: usize = 1000;

fn role_slug(role: RoleName) -> &'static str {
    match role {
        RoleName::Admin => "admin",
        RoleName::OfficeMember => "office",
        RoleName::Teacher => "teacher",
        RoleName::Parent => "parent",
    }
}

fn generate_user(role: RoleName, index: usize, password_hash: &str) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    // The index keeps addresses unique even when fake names repeat.
    let email = format!(
        "{}.{}+{}{}@example.com",
        first_name.to_lowercase().replace(' ', ""),
        last_name.to_lowercase().replace(' ', ""),
        role_slug(role),
        index
    );

    UserSeed {
        first_name,
        last_name,
        email,
        password_hash: password_hash.to_string(),
        role,
    }
}

pub fn generate_users(counts: &UsersByRole, password_hash: &str) -> Vec<UserSeed> {
    counts
        .counts()
        .into_iter()
        .flat_map(|(role, count)| (0..count).map(move |i| generate_user(role, i, password_hash)))
        .collect()
}

/// Inserts active users with their roles. Returns the number created.
pub async fn seed_users(
    db: &PgPool,
    counts: &UsersByRole,
    password: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!(
        "👥 Seeding {} users ({} office members, {} teachers, {} parents)...",
        counts.total(),
        counts.office_members,
        counts.teachers,
        counts.parents
    );

    // One hash for all seeded accounts; bcrypt per row would dominate runtime.
    let password_hash = hash_password(password).map_err(|e| e.public_message())?;
    let users = generate_users(counts, &password_hash);

    let mut tx = db.begin().await?;
    let mut inserted = 0;
    for chunk in users.chunks(BATCH_SIZE) {
        let ids = insert_users_chunk(&mut tx, chunk).await?;
        assign_roles_chunk(&mut tx, &ids, chunk).await?;
        inserted += ids.len();
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} users in {:?}",
        inserted,
        start_time.elapsed()
    );
    Ok(inserted)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO users (first_name, last_name, email, password_hash, is_active) ",
    );
    builder.push_values(users, |mut row, user| {
        row.push_bind(&user.first_name)
            .push_bind(&user.last_name)
            .push_bind(&user.email)
            .push_bind(&user.password_hash)
            .push_bind(true);
    });
    builder.push(" RETURNING id");

    let ids: Vec<Uuid> = builder
        .build_query_scalar()
        .fetch_all(&mut **tx)
        .await?;
    Ok(ids)
}

async fn assign_roles_chunk(
    tx: &mut Transaction<'_, Postgres>,
    user_ids: &[Uuid],
    users: &[UserSeed],
) -> Result<(), Box<dyn std::error::Error>> {
    if user_ids.is_empty() {
        return Ok(());
    }

    let roles: Vec<&str> = users.iter().map(|u| u.role.as_str()).collect();

    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT seeded.user_id, r.id
        FROM UNNEST($1::uuid[], $2::text[]) AS seeded(user_id, role_name)
        JOIN roles r ON r.name = seeded.role_name
        ON CONFLICT (user_id, role_id) DO NOTHING
        "#,
    )
    .bind(user_ids)
    .bind(&roles)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Deletes seeded users except admins.
pub async fn clear_users(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded users...");

    let result = sqlx::query(
        r#"
        DELETE FROM users u
        WHERE u.email LIKE '%@example.com'
        AND NOT EXISTS (
            SELECT 1 FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = u.id AND r.name = $1
        )
        "#,
    )
    .bind(RoleName::Admin.as_str())
    .execute(db)
    .await?
    .rows_affected();

    println!(
        "   ✓ Deleted {} users in {:?}",
        result,
        start_time.elapsed()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_users_by_role() {
        let counts = UsersByRole {
            office_members: 1,
            teachers: 2,
            parents: 3,
        };
        let users = generate_users(&counts, "hash");

        assert_eq!(users.len(), 6);
        assert_eq!(
            users.iter().filter(|u| u.role == RoleName::Parent).count(),
            3
        );
        assert!(users.iter().all(|u| u.email.ends_with("@example.com")));
        assert!(users.iter().all(|u| u.password_hash == "hash"));
    }

    #[test]
    fn test_generated_emails_are_unique_per_role() {
        let counts = UsersByRole {
            office_members: 0,
            teachers: 0,
            parents: 50,
        };
        let users = generate_users(&counts, "hash");
        let emails: HashSet<_> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails.len(), 50);
    }
}
