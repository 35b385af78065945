use rusqlite::Connection;
use serde_json::json;

use crate::cli::commands::UserCommands;
use crate::config::Config;
use crate::db::user_repo;
use crate::error::{PlanworkError, Result};
use crate::output;
use crate::service::{users, Context};

pub fn run(cmd: UserCommands, json_output: bool) -> i32 {
    let result = match cmd {
        UserCommands::Create { name } => run_create(&name, json_output),
        UserCommands::List => run_list(json_output),
        UserCommands::Show { reference } => run_show(&reference, json_output),
        UserCommands::Activate { reference } => run_activate(&reference, json_output),
        UserCommands::Delete { reference } => run_delete(&reference, json_output),
    };
    super::finish(result, json_output)
}

/// Active user id, or the user named by `--user`.
pub fn resolve_user_id(conn: &Connection, user_flag: Option<&str>) -> Result<String> {
    if let Some(reference) = user_flag {
        return Ok(user_repo::resolve_user(conn, reference)?.id);
    }

    let config = Config::load()?;
    let Some(id) = config.active_user_id else {
        return Err(PlanworkError::no_active_user());
    };
    match user_repo::get_user_by_id(conn, &id) {
        Ok(user) => Ok(user.id),
        Err(e) if e.is(crate::error::ErrorCode::NotFound) => {
            tracing::warn!(id = %id, "active user no longer exists");
            Err(PlanworkError::no_active_user())
        }
        Err(e) => Err(e),
    }
}

/// Id stored in config when it still names an existing user.
fn valid_active_id(conn: &Connection, config: &Config) -> Option<String> {
    config
        .active_user_id
        .as_deref()
        .and_then(|id| user_repo::get_user_by_id(conn, id).ok())
        .map(|u| u.id)
}

fn run_create(name: &str, json_output: bool) -> Result<i32> {
    let ctx = Context::open()?;
    let onboarded = users::create_user(&ctx, name)?;

    let mut config = Config::load()?;
    let activated = valid_active_id(&ctx.conn, &config).is_none();
    if activated {
        config.active_user_id = Some(onboarded.user.id.clone());
        config.save()?;
    }

    if json_output {
        let lists: Vec<_> = onboarded.lists.iter().map(output::json::list_json).collect();
        output::json::print_success(json!({
            "user": output::json::user_json(&onboarded.user, activated),
            "lists": lists
        }));
    } else {
        println!("Created user: {} ({})", onboarded.user.name, onboarded.user.id);
        for list in &onboarded.lists {
            output::text::print_list_line(list, None);
        }
        if activated {
            println!("Active user set to: {}", onboarded.user.name);
        }
    }
    Ok(0)
}

fn run_list(json_output: bool) -> Result<i32> {
    let ctx = Context::open()?;
    let all = user_repo::list_users(&ctx.conn)?;
    let active_id = valid_active_id(&ctx.conn, &Config::load()?);

    if json_output {
        let users_json: Vec<_> = all
            .iter()
            .map(|u| output::json::user_json(u, Some(&u.id) == active_id.as_ref()))
            .collect();
        output::json::print_success(json!({ "users": users_json }));
    } else {
        output::text::print_user_list(&all, active_id.as_deref());
    }
    Ok(0)
}

fn run_show(reference: &str, json_output: bool) -> Result<i32> {
    let ctx = Context::open()?;
    let user = user_repo::resolve_user(&ctx.conn, reference)?;
    let active = valid_active_id(&ctx.conn, &Config::load()?).as_deref() == Some(user.id.as_str());
    let lists = crate::db::list_repo::list_lists_by_user(&ctx.conn, &user.id)?;

    if json_output {
        let lists_json: Vec<_> = lists.iter().map(output::json::list_json).collect();
        output::json::print_success(json!({
            "user": output::json::user_json(&user, active),
            "lists": lists_json
        }));
    } else {
        output::text::print_user(&user, active);
        println!("\nLists:");
        for list in &lists {
            output::text::print_list_line(list, None);
        }
    }
    Ok(0)
}

fn run_activate(reference: &str, json_output: bool) -> Result<i32> {
    let ctx = Context::open()?;
    let user = user_repo::resolve_user(&ctx.conn, reference)?;

    let mut config = Config::load()?;
    config.active_user_id = Some(user.id.clone());
    config.save()?;

    if json_output {
        output::json::print_success(json!({ "active_user_id": user.id, "name": user.name }));
    } else {
        println!("Active user set to: {} ({})", user.name, user.id);
    }
    Ok(0)
}

fn run_delete(reference: &str, json_output: bool) -> Result<i32> {
    let ctx = Context::open()?;
    let user = user_repo::resolve_user(&ctx.conn, reference)?;
    users::delete_user(&ctx, &user.id)?;

    let mut config = Config::load()?;
    let was_active = config.active_user_id.as_deref() == Some(user.id.as_str());
    if was_active {
        config.active_user_id = None;
        config.save()?;
    }

    if json_output {
        output::json::print_success(json!({
            "deleted": user.id,
            "name": user.name,
            "active_cleared": was_active
        }));
    } else {
        println!("Deleted user: {} ({})", user.name, user.id);
        if was_active {
            println!("Active user cleared.");
        }
    }
    Ok(0)
}
