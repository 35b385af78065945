use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::db::connection::with_transaction;
use crate::db::task_repo;
use crate::error::{PlanworkError, Result};

use super::views::TIMESTAMP_FORMAT;
use super::Context;

#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub retention_days: u32,
    pub cutoff: String,
    pub removed: usize,
}

/// Delete completed tasks whose completion is older than `retention_days`, for every user.
pub fn cleanup(ctx: &Context, retention_days: u32, now: NaiveDateTime) -> Result<CleanupReport> {
    if retention_days == 0 {
        return Err(PlanworkError::validation("retention days must be at least 1"));
    }
    let cutoff = now
        .checked_sub_signed(Duration::days(i64::from(retention_days)))
        .ok_or_else(|| PlanworkError::validation(format!("retention of {retention_days} days is out of range")))?
        .format(TIMESTAMP_FORMAT)
        .to_string();

    let removed = with_transaction(&ctx.conn, |conn| task_repo::delete_completed_before(conn, &cutoff))?;
    tracing::info!(removed, cutoff = %cutoff, "completed tasks cleaned up");

    Ok(CleanupReport {
        retention_days,
        cutoff,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tasks;
    use crate::service::testing::fixture;

    #[test]
    fn removes_only_expired_completions() {
        let f = fixture();
        let old = tasks::create_task(&f.ctx, &f.user.id, None, "old", None, false).unwrap();
        let recent = tasks::create_task(&f.ctx, &f.user.id, None, "recent", None, false).unwrap();
        let open = tasks::create_task(&f.ctx, &f.user.id, None, "open", None, false).unwrap();
        tasks::complete_task(&f.ctx, &f.user.id, &old.id).unwrap();
        tasks::complete_task(&f.ctx, &f.user.id, &recent.id).unwrap();
        f.ctx
            .conn
            .execute(
                "UPDATE tasks SET completed_at = '2026-08-01 10:00:00' WHERE id = ?1",
                [&old.id],
            )
            .unwrap();
        f.ctx
            .conn
            .execute(
                "UPDATE tasks SET completed_at = '2026-10-10 10:00:00' WHERE id = ?1",
                [&recent.id],
            )
            .unwrap();

        let now = NaiveDateTime::parse_from_str("2026-10-19 12:00:00", TIMESTAMP_FORMAT).unwrap();
        let report = cleanup(&f.ctx, 30, now).unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.cutoff, "2026-09-19 12:00:00");

        assert!(task_repo::get_task_by_id(&f.ctx.conn, &old.id).is_err());
        assert!(task_repo::get_task_by_id(&f.ctx.conn, &recent.id).is_ok());
        assert!(task_repo::get_task_by_id(&f.ctx.conn, &open.id).is_ok());
    }

    #[test]
    fn zero_retention_is_rejected() {
        let f = fixture();
        let now = chrono::Utc::now().naive_utc();
        assert!(cleanup(&f.ctx, 0, now).is_err());
    }

    #[test]
    fn oversized_retention_is_a_validation_error() {
        let f = fixture();
        let done = tasks::create_task(&f.ctx, &f.user.id, None, "kept", None, false).unwrap();
        tasks::complete_task(&f.ctx, &f.user.id, &done.id).unwrap();

        let now = chrono::Utc::now().naive_utc();
        let err = cleanup(&f.ctx, u32::MAX, now).unwrap_err();
        assert!(err.is(crate::error::ErrorCode::ValidationError));
        assert!(task_repo::get_task_by_id(&f.ctx.conn, &done.id).is_ok());
    }
}
