use serde::Serialize;

use crate::db::connection::with_transaction;
use crate::db::list_repo::{self, NewList};
use crate::db::user_repo;
use crate::error::{PlanworkError, Result};
use crate::models::{TaskList, User};
use crate::policy::order_index;

use super::Context;

pub const BACKLOG_LIST_NAME: &str = "Backlog";
pub const TODAY_LIST_NAME: &str = "Today";
pub const DONE_LIST_NAME: &str = "Done";

#[derive(Debug, Clone, Serialize)]
pub struct Onboarded {
    pub user: User,
    /// Backlog, Today, Done.
    pub lists: Vec<TaskList>,
}

/// Slug: lowercase alphanumerics and hyphens, no leading or trailing hyphen.
pub fn validate_user_name(name: &str) -> Result<()> {
    let valid = match name.len() {
        0 => false,
        1 => name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
        _ => {
            let edge_ok = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
            name.starts_with(edge_ok)
                && name.ends_with(edge_ok)
                && name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        }
    };
    if !valid {
        return Err(PlanworkError::validation(
            "user name must match ^[a-z0-9][a-z0-9-]*[a-z0-9]$ (or a single [a-z0-9])",
        ));
    }
    Ok(())
}

/// Create a user and the three lists every user starts with.
pub fn create_user(ctx: &Context, name: &str) -> Result<Onboarded> {
    validate_user_name(name)?;
    let user_id = ulid::Ulid::new().to_string();

    let onboarded = ctx.transaction(|conn| {
        let user = user_repo::create_user(conn, &user_id, name)?;

        let backlog_id = ulid::Ulid::new().to_string();
        let backlog_index = order_index::calculate_top_position(None);
        let backlog = list_repo::create_list(
            conn,
            &NewList {
                id: &backlog_id,
                user_id: &user.id,
                name: BACKLOG_LIST_NAME,
                order_index: backlog_index,
                is_backlog: true,
                is_done: false,
                color: ctx.palette.allocate(&user.id),
            },
        )?;

        let today_id = ulid::Ulid::new().to_string();
        let today_index = order_index::calculate_top_position(Some(backlog_index));
        let today = list_repo::create_list(
            conn,
            &NewList {
                id: &today_id,
                user_id: &user.id,
                name: TODAY_LIST_NAME,
                order_index: today_index,
                is_backlog: false,
                is_done: false,
                color: None,
            },
        )?;

        let done_id = ulid::Ulid::new().to_string();
        let done = list_repo::create_list(
            conn,
            &NewList {
                id: &done_id,
                user_id: &user.id,
                name: DONE_LIST_NAME,
                order_index: order_index::calculate_top_position(Some(today_index)),
                is_backlog: false,
                is_done: true,
                color: None,
            },
        )?;

        Ok(Onboarded {
            user,
            lists: vec![backlog, today, done],
        })
    })?;
    tracing::info!(user = %onboarded.user.name, id = %onboarded.user.id, "user onboarded");
    Ok(onboarded)
}

pub fn delete_user(ctx: &Context, user_id: &str) -> Result<()> {
    with_transaction(&ctx.conn, |conn| user_repo::delete_user(conn, user_id))?;
    ctx.palette.release_user(user_id);
    tracing::info!(id = %user_id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::models::{ListColor, ListRole};
    use crate::service::testing::fixture;

    #[test]
    fn onboarding_creates_backlog_today_and_done() {
        let f = fixture();
        assert_eq!(f.backlog.role(), ListRole::Backlog);
        assert_eq!(f.backlog.color, Some(ListColor::Blue));
        assert_eq!(f.today.role(), ListRole::Intermediate);
        assert_eq!(f.done.role(), ListRole::Done);
        assert!(f.backlog.order_index < f.today.order_index);

        let lists = list_repo::list_lists_by_user(&f.ctx.conn, &f.user.id).unwrap();
        assert_eq!(lists.len(), 3);
        assert_eq!(lists[2].id, f.done.id);
    }

    #[test]
    fn duplicate_name_conflicts() {
        let f = fixture();
        let err = create_user(&f.ctx, "alice").unwrap_err();
        assert_eq!(err.code, ErrorCode::NameConflict);
    }

    #[test]
    fn name_must_be_a_slug() {
        for bad in ["", "Alice", "bad-", "-bad", "has space"] {
            assert!(validate_user_name(bad).is_err(), "{bad}");
        }
        for good in ["a", "bob", "team-7"] {
            assert!(validate_user_name(good).is_ok(), "{good}");
        }
    }

    #[test]
    fn deleting_a_user_removes_lists_and_colours() {
        let f = fixture();
        delete_user(&f.ctx, &f.user.id).unwrap();
        assert!(list_repo::list_lists_by_user(&f.ctx.conn, &f.user.id).unwrap().is_empty());
        assert!(!f.ctx.palette.is_used(&f.user.id, ListColor::Blue));
        assert_eq!(
            user_repo::get_user_by_id(&f.ctx.conn, &f.user.id).unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
