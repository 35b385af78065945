//! Colour allocation for backlog lists.
//!
//! Colours are unique among one user's backlogs. The used set lives in memory and
//! is rebuilt from persisted list colours when the process starts and after a
//! rolled-back transaction.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::models::{ListColor, TaskList};

#[derive(Debug, Default)]
pub struct ColorPalette {
    used: Mutex<HashMap<String, HashSet<ListColor>>>,
}

impl ColorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the persisted backlog colours.
    pub fn from_lists<'a>(lists: impl IntoIterator<Item = &'a TaskList>) -> Self {
        let palette = Self::new();
        for list in lists {
            if let (true, Some(color)) = (list.is_backlog, list.color) {
                palette.mark_used(&list.user_id, color);
            }
        }
        palette
    }

    /// Replace the in-memory table with the persisted backlog colours.
    pub fn reload<'a>(&self, lists: impl IntoIterator<Item = &'a TaskList>) {
        let fresh = Self::from_lists(lists).used.into_inner();
        *self.used.lock() = fresh;
    }

    /// Reserve the first free colour for `user_id`, or `None` if the palette is exhausted.
    pub fn allocate(&self, user_id: &str) -> Option<ListColor> {
        let mut used = self.used.lock();
        let taken = used.entry(user_id.to_string()).or_default();
        let color = ListColor::ALL.into_iter().find(|c| !taken.contains(c))?;
        taken.insert(color);
        Some(color)
    }

    /// Reserve a specific colour. Returns false if another backlog already holds it.
    pub fn try_claim(&self, user_id: &str, color: ListColor) -> bool {
        self.used
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .insert(color)
    }

    pub fn mark_used(&self, user_id: &str, color: ListColor) {
        self.used
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .insert(color);
    }

    pub fn release(&self, user_id: &str, color: ListColor) {
        let mut used = self.used.lock();
        if let Some(taken) = used.get_mut(user_id) {
            taken.remove(&color);
            if taken.is_empty() {
                used.remove(user_id);
            }
        }
    }

    pub fn release_user(&self, user_id: &str) {
        self.used.lock().remove(user_id);
    }

    pub fn is_used(&self, user_id: &str, color: ListColor) -> bool {
        self.used
            .lock()
            .get(user_id)
            .is_some_and(|taken| taken.contains(&color))
    }
}
