use serde::Serialize;
use serde_json::{json, Value};

use crate::error::PlanworkError;
use crate::models::{Task, TaskList, User};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &PlanworkError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message(),
            "detail": err.detail
        }
    })
}

/// Print a value as pretty JSON on stdout.
pub fn print(value: &Value) {
    println!("{value:#}");
}

pub fn print_success(data: Value) {
    print(&success(data));
}

/// Serialize any model for embedding in an envelope.
pub fn to_value<T: Serialize>(item: &T) -> Value {
    serde_json::to_value(item).unwrap_or(Value::Null)
}

pub fn user_json(u: &User, active: bool) -> Value {
    json!({
        "id": u.id,
        "name": u.name,
        "created_at": u.created_at,
        "active": active
    })
}

pub fn list_json(l: &TaskList) -> Value {
    json!({
        "id": l.id,
        "name": l.name,
        "role": l.role().as_str(),
        "is_backlog": l.is_backlog,
        "is_done": l.is_done,
        "color": l.color.map(|c| c.as_str()),
        "order_index": l.order_index,
        "created_at": l.created_at,
        "updated_at": l.updated_at
    })
}

pub fn task_summary(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "list_id": t.list_id,
        "order_index": t.order_index,
        "completed_at": t.completed_at
    })
}

pub fn task_detail(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": t.description,
        "list_id": t.list_id,
        "origin_backlog_id": t.origin_backlog_id,
        "order_index": t.order_index,
        "completed_at": t.completed_at,
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn error_envelope_carries_code_message_and_detail() {
        let err = PlanworkError::invariant("last backlog");
        let v = error(&err);
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["error"]["code"], json!("INVARIANT_VIOLATION"));
        assert_eq!(v["error"]["message"], json!(ErrorCode::InvariantViolation.message()));
        assert_eq!(v["error"]["detail"], json!("last backlog"));
    }

    #[test]
    fn success_envelope_wraps_data() {
        let v = success(json!({ "n": 1 }));
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["data"]["n"], json!(1));
    }
}
