//! Core tool types.
//!
//! Defines the [`ActionTool`] trait every structured action implements and
//! the typed [`ToolError`] returned when an action cannot be carried out.

/// Stable error codes for programmatic error handling.
///
/// Codes are part of the public API contract and will not change.
pub mod error_codes {
    /// No tool is registered under the requested name.
    pub const TOOL_NOT_FOUND: &str = "TOOL_NOT_FOUND";

    /// Required arguments were missing or had the wrong type.
    pub const TOOL_INVALID_ARGUMENTS: &str = "TOOL_INVALID_ARGUMENTS";

    /// The calendar or reminder back-end rejected the request.
    pub const TOOL_BACKEND_FAILED: &str = "TOOL_BACKEND_FAILED";
}

/// Errors produced while dispatching or executing a tool.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("[{}] no tool named '{}'", error_codes::TOOL_NOT_FOUND, .0)]
    NotFound(String),

    /// Required arguments were missing or had the wrong type.
    #[error("[{}] {}", error_codes::TOOL_INVALID_ARGUMENTS, .0)]
    InvalidArguments(String),

    /// The calendar or reminder back-end rejected the request.
    #[error("[{}] {}", error_codes::TOOL_BACKEND_FAILED, .0)]
    Backend(String),
}

impl ToolError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => error_codes::TOOL_NOT_FOUND,
            Self::InvalidArguments(_) => error_codes::TOOL_INVALID_ARGUMENTS,
            Self::Backend(_) => error_codes::TOOL_BACKEND_FAILED,
        }
    }

    /// Returns the human-readable message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(name) => format!("no tool named '{name}'"),
            Self::InvalidArguments(m) | Self::Backend(m) => m.clone(),
        }
    }
}

/// A structured action the assistant can perform on the user's behalf.
///
/// Tools are synchronous and side-effecting. They must be `Send + Sync` so a
/// single registry can be shared by concurrent turns.
pub trait ActionTool: Send + Sync {
    /// Returns the tool name (e.g. "schedule_meeting").
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool and return the confirmation text to speak.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] when a required argument is
    /// missing or mistyped, and [`ToolError::Backend`] when the back-end call
    /// fails.
    fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "argument '{key}' must be a string, got {other}"
        ))),
        None => Err(ToolError::InvalidArguments(format!(
            "missing required argument '{key}'"
        ))),
    }
}

/// Read an optional string argument. `null` counts as absent.
pub(crate) fn optional_str<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> Result<Option<&'a str>, ToolError> {
    match args.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "argument '{key}' must be a string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ToolError::NotFound("x".into()).code(), "TOOL_NOT_FOUND");
        assert_eq!(
            ToolError::InvalidArguments("x".into()).code(),
            "TOOL_INVALID_ARGUMENTS"
        );
        assert_eq!(ToolError::Backend("x".into()).code(), "TOOL_BACKEND_FAILED");
    }

    #[test]
    fn display_includes_code_and_message_excludes_it() {
        let err = ToolError::Backend("calendar offline".into());
        assert_eq!(err.to_string(), "[TOOL_BACKEND_FAILED] calendar offline");
        assert_eq!(err.message(), "calendar offline");
    }

    #[test]
    fn required_str_reports_missing_and_mistyped() {
        let args = json!({"time": 7});
        assert!(matches!(
            required_str(&args, "subject"),
            Err(ToolError::InvalidArguments(m)) if m.contains("missing")
        ));
        assert!(matches!(
            required_str(&args, "time"),
            Err(ToolError::InvalidArguments(m)) if m.contains("must be a string")
        ));
    }

    #[test]
    fn optional_str_treats_null_as_absent() {
        let args = json!({"message": null});
        assert_eq!(optional_str(&args, "message").ok(), Some(None));
        assert_eq!(optional_str(&json!({}), "message").ok(), Some(None));
        assert!(optional_str(&json!({"message": false}), "message").is_err());
    }
}
