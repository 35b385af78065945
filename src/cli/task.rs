use serde_json::json;

use crate::cli::commands::{TaskCommands, TaskPosition};
use crate::cli::user::resolve_user_id;
use crate::db::{list_repo, task_repo};
use crate::error::Result;
use crate::output;
use crate::policy::order_index::Placement;
use crate::service::{tasks, Context};

pub fn run(cmd: TaskCommands, json_output: bool, user_flag: Option<&str>) -> i32 {
    super::finish(run_inner(cmd, json_output, user_flag), json_output)
}

fn run_inner(cmd: TaskCommands, json_output: bool, user_flag: Option<&str>) -> Result<i32> {
    let ctx = Context::open()?;
    let user_id = resolve_user_id(&ctx.conn, user_flag)?;

    match cmd {
        TaskCommands::Add { title, list, description, top } => {
            let list_id = list
                .map(|r| list_repo::resolve_list(&ctx.conn, &user_id, &r))
                .transpose()?
                .map(|l| l.id);
            let task = tasks::create_task(&ctx, &user_id, list_id.as_deref(), &title, description.as_deref(), top)?;
            if json_output {
                output::json::print_success(output::json::task_detail(&task));
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        TaskCommands::Ls { list } => run_ls(&ctx, &user_id, list.as_deref(), json_output)?,
        TaskCommands::Show { id } => {
            let task = task_repo::resolve_task(&ctx.conn, &user_id, &id)?;
            if json_output {
                output::json::print_success(output::json::task_detail(&task));
            } else {
                output::text::print_task(&task);
            }
        }
        TaskCommands::Edit { id, title, description } => {
            let task = tasks::edit_task(&ctx, &user_id, &id, title.as_deref(), description.as_deref())?;
            print_task_result("Updated", &task, json_output);
        }
        TaskCommands::Move { id, list, position } => {
            let dest = list_repo::resolve_list(&ctx.conn, &user_id, &list)?;
            let placement = task_placement(&ctx, &user_id, position, None)?;
            let task = tasks::move_task(&ctx, &user_id, &id, &dest.id, placement)?;
            if json_output {
                output::json::print_success(output::json::task_detail(&task));
            } else if task.is_completed() {
                println!("Completed task: {} ({})", task.title, task.id);
            } else {
                println!("Moved task {} to {}", task.title, dest.name);
            }
        }
        TaskCommands::Reorder { id, position, index } => {
            let placement = task_placement(&ctx, &user_id, position, index)?;
            let task = tasks::reorder_task(&ctx, &user_id, &id, placement)?;
            print_task_result("Reordered", &task, json_output);
        }
        TaskCommands::Complete { id } => {
            let task = tasks::complete_task(&ctx, &user_id, &id)?;
            print_task_result("Completed", &task, json_output);
        }
        TaskCommands::Delete { id } => {
            let task = tasks::delete_task(&ctx, &user_id, &id)?;
            if json_output {
                output::json::print_success(json!({ "deleted": task.id, "title": task.title }));
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
    }
    Ok(0)
}

fn print_task_result(verb: &str, task: &crate::models::Task, json_output: bool) {
    if json_output {
        output::json::print_success(output::json::task_detail(task));
    } else {
        println!("{verb} task: {} ({})", task.title, task.id);
    }
}

fn run_ls(ctx: &Context, user_id: &str, list_ref: Option<&str>, json_output: bool) -> Result<()> {
    let lists = match list_ref {
        Some(reference) => vec![list_repo::resolve_list(&ctx.conn, user_id, reference)?],
        None => list_repo::list_lists_by_user(&ctx.conn, user_id)?,
    };

    let mut groups = Vec::with_capacity(lists.len());
    for list in lists {
        let tasks = task_repo::list_tasks_in_list(&ctx.conn, &list.id, list.is_done)?;
        groups.push((list, tasks));
    }

    if json_output {
        let groups_json: Vec<_> = groups
            .iter()
            .map(|(list, tasks)| {
                let tasks_json: Vec<_> = tasks.iter().map(output::json::task_summary).collect();
                json!({ "list": output::json::list_json(list), "tasks": tasks_json })
            })
            .collect();
        output::json::print_success(json!({ "lists": groups_json }));
    } else {
        for (list, tasks) in &groups {
            output::text::print_list_line(list, None);
            output::text::print_task_list(tasks);
        }
    }
    Ok(())
}

fn task_placement(
    ctx: &Context,
    user_id: &str,
    position: TaskPosition,
    index: Option<f64>,
) -> Result<Placement> {
    if let Some(index) = index {
        return Ok(Placement::Index(index));
    }
    if position.top {
        return Ok(Placement::Top);
    }
    match position.after {
        Some(after) => {
            let target = task_repo::resolve_task(&ctx.conn, user_id, &after)?;
            Ok(Placement::After(target.id))
        }
        None => Ok(Placement::Bottom),
    }
}
