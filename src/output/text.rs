use crate::models::{Task, TaskList, User};
use crate::service::lists::DeletionOutcome;
use crate::service::maintenance::CleanupReport;
use crate::service::views::{ArchivePage, CompletionMetrics, StatusSummary};

pub fn short_id(id: &str) -> &str {
    &id[..std::cmp::min(8, id.len())]
}

fn list_tag(l: &TaskList) -> String {
    match (l.is_backlog, l.is_done, l.color) {
        (true, _, Some(color)) => format!(" [backlog:{}]", color.as_str()),
        (true, _, None) => " [backlog]".to_string(),
        (_, true, _) => " [done]".to_string(),
        _ => String::new(),
    }
}

pub fn print_user(u: &User, active: bool) {
    let marker = if active { " *" } else { "" };
    println!("User: {} ({}){marker}", u.name, u.id);
    println!("  Created: {}", u.created_at);
}

pub fn print_user_list(users: &[User], active_id: Option<&str>) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }
    for u in users {
        let marker = if Some(u.id.as_str()) == active_id { " *" } else { "" };
        println!("  {} ({}){marker}", u.name, short_id(&u.id));
    }
}

pub fn print_list(l: &TaskList) {
    println!("List: {} ({}){}", l.name, l.id, list_tag(l));
    println!("  Order index: {}", l.order_index);
}

pub fn print_list_line(l: &TaskList, task_count: Option<i64>) {
    let count = task_count.map(|c| format!(" - {c} tasks")).unwrap_or_default();
    println!("  {} ({}){}{count}", l.name, short_id(&l.id), list_tag(l));
}

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    println!("  List: {}", t.list_id);
    if let Some(ref origin) = t.origin_backlog_id {
        println!("  Origin backlog: {origin}");
    }
    println!("  Order index: {}", t.order_index);
    println!("  Created: {}", t.created_at);
    if let Some(ref completed) = t.completed_at {
        println!("  Completed: {completed}");
    }
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("    (empty)");
        return;
    }
    for t in tasks {
        let check = if t.is_completed() { "x" } else { " " };
        println!("    [{check}] {} ({})", t.title, short_id(&t.id));
    }
}

pub fn print_deletion(outcome: &DeletionOutcome) {
    println!("Deleted list: {} ({})", outcome.deleted.name, outcome.deleted.id);
    println!(
        "  Moved {} task(s) to {}",
        outcome.moved_tasks, outcome.destination.name
    );
    if let Some(ref promoted) = outcome.promoted {
        println!("  Promoted {} to backlog", promoted.name);
    }
    if outcome.reassigned_tasks > 0 {
        println!("  Re-tagged {} task(s) with a new origin backlog", outcome.reassigned_tasks);
    }
}

pub fn print_archive(page: &ArchivePage) {
    if page.groups.is_empty() {
        println!("No completed tasks.");
        return;
    }
    for group in &page.groups {
        println!("{}", group.date);
        for t in &group.tasks {
            let origin = match (&t.origin_backlog_name, &t.origin_backlog_color) {
                (Some(name), Some(color)) => format!(" <{name}:{color}>"),
                (Some(name), None) => format!(" <{name}>"),
                _ => String::new(),
            };
            println!("  {} ({}){origin}", t.title, short_id(&t.id));
        }
    }
    let more = if page.has_more { ", more with --page" } else { "" };
    println!("\nPage {} ({} completed in total{more})", page.page, page.total);
}

pub fn print_metrics(m: &CompletionMetrics) {
    println!("Completed: {} total, {} today", m.total_completed, m.completed_today);
    println!("\nDaily:");
    for d in &m.daily {
        println!("  {}  {:>3} {}", d.date, d.count, "#".repeat(d.count as usize));
    }
    println!("\nWeekly (from Monday):");
    for w in &m.weekly {
        println!("  {}  {:>3} {}", w.week_start, w.count, "#".repeat(w.count as usize));
    }
}

pub fn print_status(s: &StatusSummary) {
    println!("User: {} ({})", s.user.name, short_id(&s.user.id));
    println!(
        "Open tasks: {}  Completed today: {}  Completed total: {}",
        s.open_tasks, s.completed_today, s.total_completed
    );
    println!("\nLists:");
    for entry in &s.lists {
        print_list_line(&entry.list, Some(entry.task_count));
    }
}

pub fn print_cleanup(report: &CleanupReport) {
    println!(
        "Removed {} completed task(s) older than {} days (before {})",
        report.removed, report.retention_days, report.cutoff
    );
}
