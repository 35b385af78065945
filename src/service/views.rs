//! Read-only projections: archive, completion metrics and the status overview.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::config::MAX_ARCHIVE_PAGE_SIZE;
use crate::db::{list_repo, task_repo, user_repo};
use crate::error::{PlanworkError, Result};
use crate::models::{ArchivedTask, TaskList, User};

use super::Context;

/// SQLite `datetime('now')` text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_STATS_DAYS: u32 = 7;
pub const DEFAULT_STATS_WEEKS: u32 = 4;
const MAX_STATS_DAYS: u32 = 366;
const MAX_STATS_WEEKS: u32 = 104;

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveGroup {
    /// Completion date, `YYYY-MM-DD`.
    pub date: String,
    pub tasks: Vec<ArchivedTask>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivePage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub has_more: bool,
    pub groups: Vec<ArchiveGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekCount {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionMetrics {
    pub total_completed: i64,
    pub completed_today: u32,
    pub daily: Vec<DayCount>,
    pub weekly: Vec<WeekCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSummary {
    #[serde(flatten)]
    pub list: TaskList,
    pub task_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub user: User,
    pub lists: Vec<ListSummary>,
    pub open_tasks: i64,
    pub completed_today: u32,
    pub total_completed: i64,
}

pub fn archive_page(ctx: &Context, user_id: &str, limit: u32, page: u32) -> Result<ArchivePage> {
    if limit == 0 || limit > MAX_ARCHIVE_PAGE_SIZE {
        return Err(PlanworkError::validation(format!(
            "limit must be between 1 and {MAX_ARCHIVE_PAGE_SIZE}"
        )));
    }
    if page == 0 {
        return Err(PlanworkError::validation("page numbers start at 1"));
    }

    let offset = (page - 1).saturating_mul(limit);
    let tasks = task_repo::list_archived(&ctx.conn, user_id, limit, offset)?;
    let total = task_repo::count_completed(&ctx.conn, user_id)?;

    Ok(ArchivePage {
        page,
        limit,
        total,
        has_more: i64::from(offset) + (tasks.len() as i64) < total,
        groups: group_by_date(tasks),
    })
}

/// Group archive rows (already newest first) by completion date.
fn group_by_date(tasks: Vec<ArchivedTask>) -> Vec<ArchiveGroup> {
    let mut groups: Vec<ArchiveGroup> = Vec::new();
    for task in tasks {
        let date = task.completed_at.get(..10).unwrap_or(task.completed_at.as_str()).to_string();
        match groups.last_mut() {
            Some(group) if group.date == date => group.tasks.push(task),
            _ => groups.push(ArchiveGroup { date, tasks: vec![task] }),
        }
    }
    groups
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Zero-filled daily and weekly completion counts ending at `today`.
pub fn completion_metrics(
    completions: &[NaiveDateTime],
    today: NaiveDate,
    days: u32,
    weeks: u32,
) -> (Vec<DayCount>, Vec<WeekCount>) {
    let mut daily: Vec<DayCount> = (0..days)
        .rev()
        .map(|back| DayCount {
            date: today - Duration::days(i64::from(back)),
            count: 0,
        })
        .collect();

    let this_week = monday_of(today);
    let mut weekly: Vec<WeekCount> = (0..weeks)
        .rev()
        .map(|back| WeekCount {
            week_start: this_week - Duration::weeks(i64::from(back)),
            count: 0,
        })
        .collect();

    for completed in completions {
        let date = completed.date();
        if let Some(day) = daily.iter_mut().find(|d| d.date == date) {
            day.count += 1;
        }
        let week_start = monday_of(date);
        if let Some(week) = weekly.iter_mut().find(|w| w.week_start == week_start) {
            week.count += 1;
        }
    }
    (daily, weekly)
}

/// Earliest instant any bucket of `completion_metrics` covers.
fn metrics_window_start(today: NaiveDate, days: u32, weeks: u32) -> NaiveDate {
    let first_day = today - Duration::days(i64::from(days.saturating_sub(1)));
    let first_week = monday_of(today) - Duration::weeks(i64::from(weeks.saturating_sub(1)));
    first_day.min(first_week)
}

fn parse_timestamps(raw: Vec<String>) -> Vec<NaiveDateTime> {
    raw.iter()
        .filter_map(|s| match NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(value = %s, error = %e, "skipping unparseable completion time");
                None
            }
        })
        .collect()
}

fn count_completed_on(ctx: &Context, user_id: &str, day: NaiveDate) -> Result<u32> {
    let since = day.format("%Y-%m-%d 00:00:00").to_string();
    let times = parse_timestamps(task_repo::completion_times_since(&ctx.conn, user_id, &since)?);
    Ok(times.iter().filter(|t| t.date() == day).count() as u32)
}

pub fn stats(ctx: &Context, user_id: &str, days: u32, weeks: u32, today: NaiveDate) -> Result<CompletionMetrics> {
    if days == 0 || days > MAX_STATS_DAYS {
        return Err(PlanworkError::validation(format!("days must be between 1 and {MAX_STATS_DAYS}")));
    }
    if weeks == 0 || weeks > MAX_STATS_WEEKS {
        return Err(PlanworkError::validation(format!("weeks must be between 1 and {MAX_STATS_WEEKS}")));
    }

    let since = metrics_window_start(today, days, weeks).format("%Y-%m-%d 00:00:00").to_string();
    let times = parse_timestamps(task_repo::completion_times_since(&ctx.conn, user_id, &since)?);
    let (daily, weekly) = completion_metrics(&times, today, days, weeks);

    Ok(CompletionMetrics {
        total_completed: task_repo::count_completed(&ctx.conn, user_id)?,
        completed_today: times.iter().filter(|t| t.date() == today).count() as u32,
        daily,
        weekly,
    })
}

pub fn status(ctx: &Context, user_id: &str, today: NaiveDate) -> Result<StatusSummary> {
    let user = user_repo::get_user_by_id(&ctx.conn, user_id)?;
    let mut lists = Vec::new();
    let mut open_tasks = 0;
    for list in list_repo::list_lists_by_user(&ctx.conn, user_id)? {
        let task_count = task_repo::count_tasks_in_list(&ctx.conn, &list.id)?;
        if !list.is_done {
            open_tasks += task_count;
        }
        lists.push(ListSummary { list, task_count });
    }

    Ok(StatusSummary {
        user,
        lists,
        open_tasks,
        completed_today: count_completed_on(ctx, user_id, today)?,
        total_completed: task_repo::count_completed(&ctx.conn, user_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::tasks;
    use crate::service::testing::fixture;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn metrics_are_zero_filled() {
        let (daily, weekly) = completion_metrics(&[], date("2026-10-14"), 3, 2);
        assert_eq!(daily.len(), 3);
        assert!(daily.iter().all(|d| d.count == 0));
        assert_eq!(daily[0].date, date("2026-10-12"));
        assert_eq!(daily[2].date, date("2026-10-14"));
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[1].week_start, date("2026-10-12"));
        assert_eq!(weekly[0].week_start, date("2026-10-05"));
    }

    #[test]
    fn metrics_bucket_by_day_and_iso_week() {
        // 2026-10-14 is a Wednesday.
        let completions = [
            at("2026-10-14 08:00:00"),
            at("2026-10-14 23:59:59"),
            at("2026-10-12 00:00:00"),
            at("2026-10-11 12:00:00"),
            at("2026-09-01 12:00:00"),
        ];
        let (daily, weekly) = completion_metrics(&completions, date("2026-10-14"), 7, 2);
        let counts: Vec<u32> = daily.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 1, 1, 0, 2]);
        assert_eq!(weekly[0], WeekCount { week_start: date("2026-10-05"), count: 1 });
        assert_eq!(weekly[1], WeekCount { week_start: date("2026-10-12"), count: 3 });
    }

    #[test]
    fn window_covers_oldest_bucket() {
        assert_eq!(metrics_window_start(date("2026-10-14"), 7, 1), date("2026-10-08"));
        assert_eq!(metrics_window_start(date("2026-10-14"), 1, 2), date("2026-10-05"));
    }

    #[test]
    fn archive_groups_by_completion_date() {
        let f = fixture();
        for title in ["a", "b", "c"] {
            let task = tasks::create_task(&f.ctx, &f.user.id, None, title, None, false).unwrap();
            tasks::complete_task(&f.ctx, &f.user.id, &task.id).unwrap();
        }
        f.ctx
            .conn
            .execute(
                "UPDATE tasks SET completed_at = '2026-10-01 09:00:00' WHERE title = 'a'",
                [],
            )
            .unwrap();

        let page = archive_page(&f.ctx, &f.user.id, 20, 1).unwrap();
        assert_eq!(page.total, 3);
        assert!(!page.has_more);
        assert_eq!(page.groups.len(), 2);
        assert_eq!(page.groups[0].tasks.len(), 2);
        assert_eq!(page.groups[1].date, "2026-10-01");
        let tagged = &page.groups[1].tasks[0];
        assert_eq!(tagged.origin_backlog_name.as_deref(), Some("Backlog"));
        assert_eq!(tagged.origin_backlog_color.as_deref(), Some("blue"));

        let page = archive_page(&f.ctx, &f.user.id, 2, 1).unwrap();
        assert!(page.has_more);
        let page = archive_page(&f.ctx, &f.user.id, 2, 2).unwrap();
        assert!(!page.has_more);
        assert_eq!(page.groups[0].tasks[0].title, "a");
    }

    #[test]
    fn archive_rejects_bad_paging() {
        let f = fixture();
        assert_eq!(archive_page(&f.ctx, &f.user.id, 0, 1).unwrap_err().code, ErrorCode::ValidationError);
        assert_eq!(archive_page(&f.ctx, &f.user.id, 101, 1).unwrap_err().code, ErrorCode::ValidationError);
        assert_eq!(archive_page(&f.ctx, &f.user.id, 10, 0).unwrap_err().code, ErrorCode::ValidationError);
    }

    #[test]
    fn status_counts_open_and_done() {
        let f = fixture();
        tasks::create_task(&f.ctx, &f.user.id, None, "open", None, false).unwrap();
        let done = tasks::create_task(&f.ctx, &f.user.id, None, "done", None, false).unwrap();
        tasks::complete_task(&f.ctx, &f.user.id, &done.id).unwrap();

        let today = chrono::Utc::now().date_naive();
        let summary = status(&f.ctx, &f.user.id, today).unwrap();
        assert_eq!(summary.open_tasks, 1);
        assert_eq!(summary.total_completed, 1);
        assert_eq!(summary.completed_today, 1);
        assert_eq!(summary.lists.len(), 3);

        let metrics = stats(&f.ctx, &f.user.id, 7, 4, today).unwrap();
        assert_eq!(metrics.completed_today, 1);
        assert_eq!(metrics.daily.last().map(|d| d.count), Some(1));
    }
}
