use chrono::Utc;
use serde_json::json;

use crate::cli::commands::ConfigCommands;
use crate::config::Config;
use crate::error::Result;
use crate::output;
use crate::service::{maintenance, Context};

pub fn run_cleanup(retention_days: Option<u32>, json_output: bool) -> i32 {
    super::finish(cleanup_inner(retention_days, json_output), json_output)
}

pub fn run_config(cmd: ConfigCommands, json_output: bool) -> i32 {
    super::finish(config_inner(cmd, json_output), json_output)
}

fn cleanup_inner(retention_days: Option<u32>, json_output: bool) -> Result<i32> {
    let ctx = Context::open()?;
    let retention_days = match retention_days {
        Some(days) => days,
        None => Config::load()?.retention_days,
    };
    let report = maintenance::cleanup(&ctx, retention_days, Utc::now().naive_utc())?;

    if json_output {
        output::json::print_success(output::json::to_value(&report));
    } else {
        output::text::print_cleanup(&report);
    }
    Ok(0)
}

fn config_inner(cmd: ConfigCommands, json_output: bool) -> Result<i32> {
    let mut config = Config::load()?;
    if let ConfigCommands::Set { key, value } = cmd {
        config.set(&key, &value)?;
        config.save()?;
        tracing::info!(key = %key, value = %value, "config updated");
    }

    if json_output {
        output::json::print_success(json!({
            "active_user_id": config.active_user_id,
            "retention_days": config.retention_days,
            "archive_page_size": config.archive_page_size
        }));
    } else {
        println!("active_user_id     {}", config.active_user_id.as_deref().unwrap_or("(none)"));
        println!("retention_days     {}", config.retention_days);
        println!("archive_page_size  {}", config.archive_page_size);
    }
    Ok(0)
}
