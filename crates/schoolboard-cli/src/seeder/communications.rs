//! Communication seeding.

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::lorem::en::{Paragraph, Sentence};
use schoolboard_models::{
    BoardType, CommunicationStatus, CommunicationType, Priority, TargetAudience,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::SEED_SOURCE_GROUP;

const BATCH_SIZE: usize = 500;

pub struct CommunicationSeed {
    pub communication_type: CommunicationType,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub target_audience: TargetAudience,
    pub board_type: BoardType,
    pub priority: Priority,
    pub status: CommunicationStatus,
    pub is_pinned: bool,
    pub published_at: Option<DateTime<Utc>>,
}

fn pick<T: Copy>(items: &[T]) -> T {
    items[(0..items.len()).fake::<usize>()]
}

fn generate_communication(now: DateTime<Utc>) -> CommunicationSeed {
    let status = pick(CommunicationStatus::ALL);
    let published_at = match status {
        CommunicationStatus::Draft => None,
        _ => Some(now - Duration::hours((1..24 * 30).fake::<i64>())),
    };
    let title: String = Sentence(3..8).fake();
    let content: String = Paragraph(2..5).fake();

    CommunicationSeed {
        communication_type: pick(CommunicationType::ALL),
        title: title.trim_end_matches('.').to_string(),
        content,
        summary: ((0..3).fake::<u8>() == 0).then(|| Sentence(5..12).fake::<String>()),
        target_audience: pick(TargetAudience::ALL),
        board_type: pick(BoardType::ALL),
        priority: pick(Priority::ALL),
        status,
        is_pinned: (0..10).fake::<u8>() == 0,
        published_at,
    }
}

pub fn generate_communications(count: usize, now: DateTime<Utc>) -> Vec<CommunicationSeed> {
    (0..count).map(|_| generate_communication(now)).collect()
}

/// First admin or office member, used as the author of seeded records.
async fn find_author(db: &PgPool) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT ur.user_id FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE r.name IN ('admin', 'office_member')
        ORDER BY ur.assigned_at
        LIMIT 1
        "#,
    )
    .fetch_optional(db)
    .await
}

pub async fn seed_communications(
    db: &PgPool,
    count: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("📣 Seeding {} communications...", count);

    let author_id = find_author(db).await?;
    let seeds = generate_communications(count, Utc::now());

    let mut tx = db.begin().await?;
    let mut inserted = 0u64;
    for chunk in seeds.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO communications (communication_type, title, content, summary, \
             target_audience, board_type, source_group, priority, status, is_pinned, \
             published_at, author_id) ",
        );
        builder.push_values(chunk, |mut row, seed| {
            row.push_bind(seed.communication_type)
                .push_bind(&seed.title)
                .push_bind(&seed.content)
                .push_bind(&seed.summary)
                .push_bind(seed.target_audience)
                .push_bind(seed.board_type)
                .push_bind(SEED_SOURCE_GROUP)
                .push_bind(seed.priority)
                .push_bind(seed.status)
                .push_bind(seed.is_pinned)
                .push_bind(seed.published_at)
                .push_bind(author_id);
        });
        inserted += builder.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} communications in {:?}",
        inserted,
        start_time.elapsed()
    );
    Ok(inserted as usize)
}

/// Deletes communications tagged as seeded.
pub async fn clear_communications(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded communications...");

    let result = sqlx::query("DELETE FROM communications WHERE source_group = $1")
        .bind(SEED_SOURCE_GROUP)
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} communications in {:?}",
        result,
        start_time.elapsed()
    );
    Ok(result)
}
