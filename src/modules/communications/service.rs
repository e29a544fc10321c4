use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use schoolboard_core::query::like_pattern;
use schoolboard_core::{AppError, PaginationMeta};
use schoolboard_models::communications::{
    Communication, CommunicationFilter, CreateCommunicationDto, UpdateCommunicationDto,
    Visibility,
};
use schoolboard_models::{CommunicationId, CommunicationStatus, UserId};

pub const COMMUNICATION_COLUMNS: &str = "c.id, c.communication_type, c.title, c.content, c.summary, \
     c.target_audience, c.board_type, c.source_group, c.priority, c.status, c.is_pinned, \
     c.is_important, c.is_featured, c.published_at, c.expires_at, c.author_id, c.created_at, \
     c.updated_at";

/// Restricts a query to what `visibility` allows at `now`.
fn push_visibility(
    builder: &mut QueryBuilder<'_, Postgres>,
    visibility: &Visibility,
    now: DateTime<Utc>,
) {
    if let Visibility::Restricted { audiences } = visibility {
        builder
            .push(" AND c.status = ")
            .push_bind(CommunicationStatus::Published)
            .push(" AND (c.expires_at IS NULL OR c.expires_at > ")
            .push_bind(now)
            .push(") AND (c.published_at IS NULL OR c.published_at <= ")
            .push_bind(now)
            .push(") AND c.target_audience = ANY(")
            .push_bind(audiences.clone())
            .push(")");
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &CommunicationFilter,
    now: DateTime<Utc>,
) {
    push_visibility(builder, &filter.visibility, now);

    if let Some(kind) = filter.communication_type {
        builder.push(" AND c.communication_type = ").push_bind(kind);
    }
    if let Some(source_group) = &filter.source_group {
        builder
            .push(" AND c.source_group = ")
            .push_bind(source_group.clone());
    }
    if let Some(board) = filter.board_type {
        builder.push(" AND c.board_type = ").push_bind(board);
    }
    if let Some(status) = filter.status {
        builder.push(" AND c.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        builder.push(" AND c.priority = ").push_bind(priority);
    }
    if let Some(pinned) = filter.is_pinned {
        builder.push(" AND c.is_pinned = ").push_bind(pinned);
    }
    if let Some(important) = filter.is_important {
        builder.push(" AND c.is_important = ").push_bind(important);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (c.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.content ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.summary ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct CommunicationService;

impl CommunicationService {
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filter: CommunicationFilter,
    ) -> Result<(Vec<Communication>, PaginationMeta), AppError> {
        let now = Utc::now();

        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM communications c WHERE 1=1");
        push_filters(&mut count_builder, &filter, now);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count communications")
            .map_err(AppError::database)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications c WHERE 1=1"
        ));
        push_filters(&mut builder, &filter, now);

        // Sort expressions come from a closed enum, never from the request.
        builder
            .push(" ORDER BY ")
            .push(filter.sort_by.sql())
            .push(" ")
            .push(filter.sort_order.sql())
            .push(" NULLS LAST, c.id ")
            .push(filter.sort_order.sql())
            .push(" LIMIT ")
            .push_bind(filter.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filter.pagination.offset());

        let communications = builder
            .build_query_as::<Communication>()
            .fetch_all(db)
            .await
            .context("Failed to fetch communications")
            .map_err(AppError::database)?;

        Ok((communications, filter.pagination.meta(total)))
    }

    /// Fetches one record, returning `None` when it does not exist or the
    /// caller may not see it.
    #[instrument(skip(db))]
    pub async fn find_visible(
        db: &PgPool,
        id: CommunicationId,
        visibility: &Visibility,
    ) -> Result<Option<Communication>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications c WHERE c.id = "
        ));
        builder.push_bind(id);
        push_visibility(&mut builder, visibility, Utc::now());

        builder
            .build_query_as::<Communication>()
            .fetch_optional(db)
            .await
            .context("Failed to fetch communication")
            .map_err(AppError::database)
    }

    #[instrument(skip(db, dto), fields(author_id = %author_id))]
    pub async fn create(
        db: &PgPool,
        dto: CreateCommunicationDto,
        author_id: UserId,
    ) -> Result<Communication, AppError> {
        let new = dto
            .normalize(Utc::now())
            .map_err(|msg| AppError::bad_request(anyhow!(msg)))?;

        let communication = sqlx::query_as::<_, Communication>(&format!(
            "INSERT INTO communications AS c (communication_type, title, content, summary, \
             target_audience, board_type, source_group, priority, status, is_pinned, \
             is_important, is_featured, published_at, expires_at, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COMMUNICATION_COLUMNS}"
        ))
        .bind(new.communication_type)
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.summary)
        .bind(new.target_audience)
        .bind(new.board_type)
        .bind(&new.source_group)
        .bind(new.priority)
        .bind(new.status)
        .bind(new.is_pinned)
        .bind(new.is_important)
        .bind(new.is_featured)
        .bind(new.published_at)
        .bind(new.expires_at)
        .bind(author_id)
        .fetch_one(db)
        .await
        .context("Failed to create communication")
        .map_err(AppError::database)?;

        info!(
            communication_id = %communication.id,
            kind = communication.communication_type.as_str(),
            "Communication created"
        );
        Ok(communication)
    }

    /// Partial update under a row lock so concurrent edits do not clobber
    /// each other.
    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        id: CommunicationId,
        dto: UpdateCommunicationDto,
    ) -> Result<Communication, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let current = sqlx::query_as::<_, Communication>(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications c WHERE c.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch communication")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Communication not found")))?;

        let next = dto
            .apply_to(current, Utc::now())
            .map_err(|msg| AppError::bad_request(anyhow!(msg)))?;

        let updated = sqlx::query_as::<_, Communication>(&format!(
            "UPDATE communications c SET communication_type = $2, title = $3, content = $4, \
             summary = $5, target_audience = $6, board_type = $7, source_group = $8, \
             priority = $9, status = $10, is_pinned = $11, is_important = $12, \
             is_featured = $13, published_at = $14, expires_at = $15, updated_at = $16 \
             WHERE c.id = $1 RETURNING {COMMUNICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(next.communication_type)
        .bind(&next.title)
        .bind(&next.content)
        .bind(&next.summary)
        .bind(next.target_audience)
        .bind(next.board_type)
        .bind(&next.source_group)
        .bind(next.priority)
        .bind(next.status)
        .bind(next.is_pinned)
        .bind(next.is_important)
        .bind(next.is_featured)
        .bind(next.published_at)
        .bind(next.expires_at)
        .bind(next.updated_at)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to update communication")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AppError::database)?;

        Ok(updated)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: CommunicationId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM communications WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete communication")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Communication not found")));
        }

        info!(communication_id = %id, "Communication deleted");
        Ok(())
    }
}
