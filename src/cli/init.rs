use serde_json::json;

use crate::db::connection;
use crate::error::Result;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    super::finish(run_inner(json_output), json_output)
}

fn run_inner(json_output: bool) -> Result<i32> {
    let path = connection::init_db()?;
    if json_output {
        output::json::print_success(json!({ "path": path.to_string_lossy() }));
    } else {
        println!("Initialized planwork at {}", path.display());
    }
    Ok(0)
}
