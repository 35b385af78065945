use serde_json::json;

use crate::cli::commands::{ListCommands, ListPosition};
use crate::cli::user::resolve_user_id;
use crate::db::{list_repo, task_repo};
use crate::error::{PlanworkError, Result};
use crate::models::ListColor;
use crate::output;
use crate::policy::order_index::Placement;
use crate::service::{lists, Context};

pub fn run(cmd: ListCommands, json_output: bool, user_flag: Option<&str>) -> i32 {
    super::finish(run_inner(cmd, json_output, user_flag), json_output)
}

fn run_inner(cmd: ListCommands, json_output: bool, user_flag: Option<&str>) -> Result<i32> {
    let ctx = Context::open()?;
    let user_id = resolve_user_id(&ctx.conn, user_flag)?;

    match cmd {
        ListCommands::Create { name, backlog, color } => {
            let color = color.as_deref().map(parse_color).transpose()?.flatten();
            let list = lists::create_list(&ctx, &user_id, &name, backlog, color)?;
            if json_output {
                output::json::print_success(output::json::list_json(&list));
            } else {
                println!("Created list: {} ({})", list.name, list.id);
            }
        }
        ListCommands::Ls => run_ls(&ctx, &user_id, json_output)?,
        ListCommands::Show { reference } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let shown = lists::show_list(&ctx, &user_id, &list.id)?;
            if json_output {
                let tasks: Vec<_> = shown.tasks.iter().map(output::json::task_summary).collect();
                output::json::print_success(json!({
                    "list": output::json::list_json(&shown.list),
                    "tasks": tasks
                }));
            } else {
                output::text::print_list(&shown.list);
                println!("\n  Tasks:");
                output::text::print_task_list(&shown.tasks);
            }
        }
        ListCommands::Rename { reference, name } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let renamed = lists::rename_list(&ctx, &user_id, &list.id, &name)?;
            if json_output {
                output::json::print_success(output::json::list_json(&renamed));
            } else {
                println!("Renamed list: {} -> {}", list.name, renamed.name);
            }
        }
        ListCommands::Color { reference, color } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let updated = lists::set_color(&ctx, &user_id, &list.id, parse_color(&color)?)?;
            if json_output {
                output::json::print_success(output::json::list_json(&updated));
            } else {
                let shown = updated.color.map(|c| c.as_str()).unwrap_or("none");
                println!("List {} colour: {shown}", updated.name);
            }
        }
        ListCommands::ToggleBacklog { reference } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let toggled = lists::toggle_backlog(&ctx, &user_id, &list.id)?;
            if json_output {
                output::json::print_success(output::json::list_json(&toggled));
            } else if toggled.is_backlog {
                println!("List {} is now a backlog", toggled.name);
            } else {
                println!("List {} is no longer a backlog", toggled.name);
            }
        }
        ListCommands::Reorder { reference, position } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let placement = list_placement(&ctx, &user_id, position)?;
            let moved = lists::reorder_list(&ctx, &user_id, &list.id, placement)?;
            if json_output {
                output::json::print_success(output::json::list_json(&moved));
            } else {
                println!("Moved list {} to order index {}", moved.name, moved.order_index);
            }
        }
        ListCommands::Delete { reference, destination } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let destination = destination
                .map(|d| list_repo::resolve_list(&ctx.conn, &user_id, &d))
                .transpose()?;
            let outcome = lists::delete_list(&ctx, &user_id, &list.id, destination.as_ref().map(|d| d.id.as_str()))?;
            if json_output {
                output::json::print_success(json!({
                    "deleted": output::json::list_json(&outcome.deleted),
                    "destination": output::json::list_json(&outcome.destination),
                    "promoted": outcome.promoted.as_ref().map(output::json::list_json),
                    "moved_tasks": outcome.moved_tasks,
                    "reassigned_tasks": outcome.reassigned_tasks
                }));
            } else {
                output::text::print_deletion(&outcome);
            }
        }
        ListCommands::Reindex { reference } => {
            let list = list_repo::resolve_list(&ctx.conn, &user_id, &reference)?;
            let count = lists::reindex_tasks(&ctx, &user_id, &list.id)?;
            if json_output {
                output::json::print_success(json!({ "list_id": list.id, "reindexed": count }));
            } else {
                println!("Reindexed {count} task(s) in {}", list.name);
            }
        }
    }
    Ok(0)
}

fn run_ls(ctx: &Context, user_id: &str, json_output: bool) -> Result<()> {
    let all = list_repo::list_lists_by_user(&ctx.conn, user_id)?;
    let mut counts = Vec::with_capacity(all.len());
    for list in &all {
        counts.push(task_repo::count_tasks_in_list(&ctx.conn, &list.id)?);
    }

    if json_output {
        let lists_json: Vec<_> = all
            .iter()
            .zip(&counts)
            .map(|(l, count)| {
                let mut v = output::json::list_json(l);
                v["task_count"] = json!(count);
                v
            })
            .collect();
        output::json::print_success(json!({ "lists": lists_json }));
    } else {
        for (list, count) in all.iter().zip(counts) {
            output::text::print_list_line(list, Some(count));
        }
    }
    Ok(())
}

/// `none` clears the colour.
fn parse_color(value: &str) -> Result<Option<ListColor>> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    ListColor::from_str(&value.to_ascii_lowercase())
        .map(Some)
        .ok_or_else(|| {
            let names: Vec<&str> = ListColor::ALL.iter().map(|c| c.as_str()).collect();
            PlanworkError::validation(format!("unknown colour '{value}' (expected one of {})", names.join(", ")))
        })
}

fn list_placement(ctx: &Context, user_id: &str, position: ListPosition) -> Result<Placement> {
    match (position.index, position.after) {
        (Some(index), _) => Ok(Placement::Index(index)),
        (None, Some(after)) => {
            let target = list_repo::resolve_list(&ctx.conn, user_id, &after)?;
            Ok(Placement::After(target.id))
        }
        (None, None) => Ok(Placement::Top),
    }
}
