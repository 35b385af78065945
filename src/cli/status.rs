use chrono::Utc;

use crate::cli::user::resolve_user_id;
use crate::config::Config;
use crate::error::Result;
use crate::output;
use crate::service::{views, Context};

pub fn run_status(json_output: bool, user_flag: Option<&str>) -> i32 {
    super::finish(status_inner(json_output, user_flag), json_output)
}

pub fn run_stats(days: u32, weeks: u32, json_output: bool, user_flag: Option<&str>) -> i32 {
    super::finish(stats_inner(days, weeks, json_output, user_flag), json_output)
}

pub fn run_archive(limit: Option<u32>, page: u32, json_output: bool, user_flag: Option<&str>) -> i32 {
    super::finish(archive_inner(limit, page, json_output, user_flag), json_output)
}

fn status_inner(json_output: bool, user_flag: Option<&str>) -> Result<i32> {
    let ctx = Context::open()?;
    let user_id = resolve_user_id(&ctx.conn, user_flag)?;
    let summary = views::status(&ctx, &user_id, Utc::now().date_naive())?;

    if json_output {
        output::json::print_success(output::json::to_value(&summary));
    } else {
        output::text::print_status(&summary);
    }
    Ok(0)
}

fn stats_inner(days: u32, weeks: u32, json_output: bool, user_flag: Option<&str>) -> Result<i32> {
    let ctx = Context::open()?;
    let user_id = resolve_user_id(&ctx.conn, user_flag)?;
    let metrics = views::stats(&ctx, &user_id, days, weeks, Utc::now().date_naive())?;

    if json_output {
        output::json::print_success(output::json::to_value(&metrics));
    } else {
        output::text::print_metrics(&metrics);
    }
    Ok(0)
}

fn archive_inner(limit: Option<u32>, page: u32, json_output: bool, user_flag: Option<&str>) -> Result<i32> {
    let ctx = Context::open()?;
    let user_id = resolve_user_id(&ctx.conn, user_flag)?;
    let limit = match limit {
        Some(limit) => limit,
        None => Config::load()?.archive_page_size,
    };
    let archive = views::archive_page(&ctx, &user_id, limit, page)?;

    if json_output {
        output::json::print_success(output::json::to_value(&archive));
    } else {
        output::text::print_archive(&archive);
    }
    Ok(0)
}
