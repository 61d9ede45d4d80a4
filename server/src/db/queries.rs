//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::models::Member;

/// Log and return a database error with context.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

const MEMBER_COLUMNS: &str = "id, username, display_name, membership_status, is_superuser, \
     is_service_account, instructor, towpilot, duty_officer, assistant_duty_officer, director, \
     secretary, treasurer, webmaster, member_manager, rostermeister, created_at, updated_at";

// ============================================================================
// Member Queries
// ============================================================================

/// Find member by ID.
pub async fn find_member_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Member>> {
    sqlx::query_as::<_, Member>(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_member_by_id", member_id = %id))
}
