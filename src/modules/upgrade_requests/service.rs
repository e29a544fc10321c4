use anyhow::{Context, anyhow};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use schoolboard_core::{AppError, PaginationMeta, RoleName};
use schoolboard_models::upgrade_requests::{
    CreateUpgradeRequestDto, PermissionUpgradeRequest, UpgradeRequestQuery,
    UpgradeRequestWithUser,
};
use schoolboard_models::{UpgradeRequestId, UpgradeRequestStatus, UserId};

use crate::modules::roles::service::RoleService;

const REQUEST_COLUMNS: &str = "r.id, r.user_id, r.requested_role, r.reason, r.status, \
     r.reviewer_id, r.review_note, r.reviewed_at, r.created_at";

const DUPLICATE_PENDING: &str = "You already have a pending upgrade request";

/// Outcome of an admin review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn status(&self) -> UpgradeRequestStatus {
        match self {
            ReviewDecision::Approve => UpgradeRequestStatus::Approved,
            ReviewDecision::Reject => UpgradeRequestStatus::Rejected,
        }
    }
}

fn push_status_filter(builder: &mut QueryBuilder<'_, Postgres>, query: &UpgradeRequestQuery) {
    if let Some(status) = query.status {
        builder.push(" AND r.status = ").push_bind(status);
    }
}

pub struct UpgradeRequestService;

impl UpgradeRequestService {
    #[instrument(skip(db, dto), fields(requested_role = %dto.requested_role))]
    pub async fn create(
        db: &PgPool,
        user_id: UserId,
        dto: CreateUpgradeRequestDto,
    ) -> Result<PermissionUpgradeRequest, AppError> {
        let held = RoleService::role_names_for_user(db, user_id).await?;
        if held.iter().any(|r| r == dto.requested_role.as_str()) {
            return Err(AppError::bad_request(anyhow!("You already hold this role")));
        }

        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM permission_upgrade_requests WHERE user_id = $1 AND status = 'pending')",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("Failed to check pending upgrade requests")
        .map_err(AppError::database)?;

        if pending {
            return Err(AppError::conflict(anyhow!(DUPLICATE_PENDING)));
        }

        let inserted = sqlx::query_as::<_, PermissionUpgradeRequest>(&format!(
            "INSERT INTO permission_upgrade_requests AS r (user_id, requested_role, reason) \
             VALUES ($1, $2, $3) RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(user_id)
        .bind(dto.requested_role.as_str())
        .bind(dto.reason.trim())
        .fetch_one(db)
        .await;

        // Two concurrent submissions race past the check; the partial unique
        // index rejects the loser.
        let request = match inserted {
            Ok(request) => request,
            Err(e) => {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|d| d.is_unique_violation());
                return Err(if duplicate {
                    AppError::conflict(anyhow!(DUPLICATE_PENDING))
                } else {
                    AppError::database(
                        anyhow::Error::from(e).context("Failed to create upgrade request"),
                    )
                });
            }
        };

        info!(request_id = %request.id, user_id = %user_id, "Upgrade request submitted");
        Ok(request)
    }

    #[instrument(skip(db))]
    pub async fn list_for_user(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<PermissionUpgradeRequest>, AppError> {
        sqlx::query_as::<_, PermissionUpgradeRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM permission_upgrade_requests r \
             WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch upgrade requests")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        query: UpgradeRequestQuery,
    ) -> Result<(Vec<UpgradeRequestWithUser>, PaginationMeta), AppError> {
        let pagination = query.pagination();

        let mut count_builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM permission_upgrade_requests r WHERE 1=1",
        );
        push_status_filter(&mut count_builder, &query);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count upgrade requests")
            .map_err(AppError::database)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REQUEST_COLUMNS}, u.email AS user_email, \
             u.first_name || ' ' || u.last_name AS user_name \
             FROM permission_upgrade_requests r JOIN users u ON u.id = r.user_id WHERE 1=1"
        ));
        push_status_filter(&mut builder, &query);
        builder
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let requests = builder
            .build_query_as::<UpgradeRequestWithUser>()
            .fetch_all(db)
            .await
            .context("Failed to fetch upgrade requests")
            .map_err(AppError::database)?;

        Ok((requests, pagination.meta(total)))
    }

    /// Closes a pending request. Approval grants the requested role in the
    /// same transaction.
    #[instrument(skip(db, note))]
    pub async fn review(
        db: &PgPool,
        id: UpgradeRequestId,
        reviewer_id: UserId,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<PermissionUpgradeRequest, AppError> {
        let mut tx = db
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let request = sqlx::query_as::<_, PermissionUpgradeRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM permission_upgrade_requests r WHERE r.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock upgrade request")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Upgrade request not found")))?;

        if request.status.is_terminal() {
            return Err(AppError::bad_request(anyhow!(
                "Upgrade request has already been reviewed"
            )));
        }

        if decision == ReviewDecision::Approve {
            let role = request
                .requested_role
                .parse::<RoleName>()
                .map_err(|e| AppError::bad_request(anyhow!(e)))?;
            RoleService::assign_role(&mut tx, request.user_id, role).await?;
        }

        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let reviewed = sqlx::query_as::<_, PermissionUpgradeRequest>(&format!(
            "UPDATE permission_upgrade_requests r \
             SET status = $2, reviewer_id = $3, review_note = $4, reviewed_at = NOW() \
             WHERE r.id = $1 RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(decision.status())
        .bind(reviewer_id)
        .bind(note)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to record review")
        .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit review")
            .map_err(AppError::database)?;

        info!(
            request_id = %id,
            reviewer_id = %reviewer_id,
            status = %reviewed.status,
            "Upgrade request reviewed"
        );
        Ok(reviewed)
    }
}
