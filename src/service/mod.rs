//! Use-cases over the repositories. Each mutating operation runs in one transaction.

pub mod lists;
pub mod maintenance;
pub mod tasks;
pub mod users;
pub mod views;

use rusqlite::Connection;

use crate::db::{connection, list_repo};
use crate::error::{ErrorCode, PlanworkError, Result};
use crate::policy::order_index::{self, Placement};
use crate::policy::ColorPalette;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Open database plus the process-wide colour table rebuilt from it.
pub struct Context {
    pub conn: Connection,
    pub palette: ColorPalette,
}

impl Context {
    pub fn open() -> Result<Self> {
        Self::from_connection(connection::open_db()?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let backlogs = list_repo::list_all_backlogs(&conn)?;
        let palette = ColorPalette::from_lists(&backlogs);
        tracing::debug!(backlogs = backlogs.len(), "colour palette rebuilt");
        Ok(Self { conn, palette })
    }

    /// Run `f` in a write transaction. On rollback the colour table is reloaded
    /// from the database so claims made inside `f` do not outlive it.
    pub(crate) fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let result = connection::with_transaction(&self.conn, f);
        if result.is_err() {
            match list_repo::list_all_backlogs(&self.conn) {
                Ok(backlogs) => self.palette.reload(&backlogs),
                Err(e) => tracing::warn!(error = %e, "colour palette not reloaded after rollback"),
            }
        }
        result
    }
}

/// Compute a position among `siblings`, renumbering them once through `persist`
/// if the index space is exhausted.
pub(crate) fn place_with_reindex(
    conn: &Connection,
    mut siblings: Vec<(String, f64)>,
    placement: &Placement,
    persist: impl Fn(&Connection, &str, f64) -> Result<()>,
) -> Result<f64> {
    match order_index::position_for(&siblings, placement) {
        Err(e) if e.is(ErrorCode::CapacityExceeded) => {
            let start = placement.reindex_start();
            let renumbered = order_index::generate_reindexed_order(siblings.len(), start);
            for (sibling, index) in siblings.iter_mut().zip(renumbered) {
                persist(conn, &sibling.0, index)?;
                sibling.1 = index;
            }
            tracing::warn!(count = siblings.len(), start, "order index space exhausted, siblings reindexed");
            order_index::position_for(&siblings, placement)
        }
        other => other,
    }
}

pub(crate) fn validate_text(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlanworkError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(PlanworkError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional free text: blank clears the value.
pub(crate) fn normalize_description(value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(
            PlanworkError::validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )),
        ),
        Some(text) => Ok(Some(text.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolled_back_colour_claims_are_undone() {
        let f = testing::fixture();
        let result: Result<()> = f.ctx.transaction(|_| {
            assert_eq!(f.ctx.palette.allocate(&f.user.id), Some(crate::models::ListColor::Green));
            Err(PlanworkError::validation("abort"))
        });
        assert!(result.is_err());
        assert!(!f.ctx.palette.is_used(&f.user.id, crate::models::ListColor::Green));
        assert!(f.ctx.palette.is_used(&f.user.id, crate::models::ListColor::Blue));
    }

    #[test]
    fn reindexes_once_when_top_is_full() {
        let conn = connection::open_in_memory().unwrap();
        let siblings = vec![("a".to_string(), 1000.0), ("b".to_string(), 1500.0)];
        let persisted = std::cell::RefCell::new(Vec::new());
        let index = place_with_reindex(&conn, siblings, &Placement::Top, |_, id, idx| {
            persisted.borrow_mut().push((id.to_string(), idx));
            Ok(())
        })
        .unwrap();
        assert_eq!(index, 1000.0);
        assert_eq!(
            persisted.into_inner(),
            vec![("a".to_string(), 2000.0), ("b".to_string(), 3000.0)]
        );
    }

    #[test]
    fn validates_text_fields() {
        assert_eq!(validate_text("name", "  Inbox ", MAX_NAME_LEN).unwrap(), "Inbox");
        assert!(validate_text("name", "   ", MAX_NAME_LEN).is_err());
        assert!(validate_text("name", &"x".repeat(101), MAX_NAME_LEN).is_err());
        assert_eq!(normalize_description(Some("  ")).unwrap(), None);
        assert_eq!(normalize_description(Some("a")).unwrap().as_deref(), Some("a"));
    }
}
