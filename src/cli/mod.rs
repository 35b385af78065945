pub mod commands;
pub mod init;
pub mod list;
pub mod maintenance;
pub mod status;
pub mod task;
pub mod user;

pub use commands::*;

use crate::error::{PlanworkError, Result};
use crate::output;

/// Turn a handler result into an exit code, reporting errors on the chosen channel.
pub(crate) fn finish(result: Result<i32>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            report_error(&e, json_output);
            1
        }
    }
}

fn report_error(e: &PlanworkError, json_output: bool) {
    tracing::debug!(code = e.code.as_str(), detail = ?e.detail, "command failed");
    if json_output {
        output::json::print(&output::json::error(e));
    } else {
        eprintln!("Error: {}", e.describe());
    }
}
