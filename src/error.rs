use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    NoActiveUser,
    NotFound,
    Forbidden,
    AmbiguousRef,
    InvariantViolation,
    CapacityExceeded,
    NameConflict,
    ValidationError,
    ConfigError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NoActiveUser => "NO_ACTIVE_USER",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::NameConflict => "NAME_CONFLICT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// The user-visible message for this code. Stable across releases.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotInitialized => "planwork is not initialized. Run `planwork init` first.",
            Self::NoActiveUser => {
                "No active user. Use `planwork user activate <name>` or `--user <name>`."
            }
            Self::NotFound => "The referenced resource does not exist",
            Self::Forbidden => "The referenced resource belongs to another user",
            Self::AmbiguousRef => "The reference matches more than one resource",
            Self::InvariantViolation => "The operation would break a list invariant",
            Self::CapacityExceeded => "Order index space exhausted; the list must be reindexed",
            Self::NameConflict => "The name is already taken",
            Self::ValidationError => "Invalid input",
            Self::ConfigError => "Configuration could not be read or written",
            Self::DatabaseError => "Database operation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{}", .code.message())]
pub struct PlanworkError {
    pub code: ErrorCode,
    pub detail: Option<String>,
}

impl PlanworkError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn bare(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    /// Message plus detail, for terminal output.
    pub fn describe(&self) -> String {
        match self.detail {
            Some(ref detail) => format!("{} ({detail})", self.message()),
            None => self.message().to_string(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::bare(ErrorCode::NotInitialized)
    }

    pub fn no_active_user() -> Self {
        Self::bare(ErrorCode::NoActiveUser)
    }

    pub fn user_not_found(reference: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("User not found: {reference}"))
    }

    pub fn list_not_found(reference: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("List not found: {reference}"))
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {reference}"))
    }

    pub fn forbidden(kind: &str, id: &str) -> Self {
        Self::new(ErrorCode::Forbidden, format!("{kind} {id} is owned by another user"))
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!("'{}' matches: {}", reference, candidates.join(", ")),
        )
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvariantViolation, detail)
    }

    pub fn capacity_exceeded(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::CapacityExceeded, detail)
    }

    pub fn name_conflict(name: &str) -> Self {
        Self::new(ErrorCode::NameConflict, format!("'{name}' already exists"))
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, detail)
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, detail)
    }

    pub fn database(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, detail)
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}

impl From<rusqlite::Error> for PlanworkError {
    fn from(e: rusqlite::Error) -> Self {
        tracing::error!(error = %e, "sqlite error");
        Self::bare(ErrorCode::DatabaseError)
    }
}

pub type Result<T, E = PlanworkError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_code_has_a_fixed_message() {
        let a = PlanworkError::list_not_found("a");
        let b = PlanworkError::task_not_found("b");
        assert_eq!(a.message(), b.message());
        assert_eq!(a.to_string(), ErrorCode::NotFound.message());
    }

    #[test]
    fn describe_appends_detail() {
        let e = PlanworkError::invariant("Done list cannot be renamed");
        assert!(e.describe().ends_with("(Done list cannot be renamed)"));
        assert_eq!(PlanworkError::no_active_user().describe(), ErrorCode::NoActiveUser.message());
    }
}
