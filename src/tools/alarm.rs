//! Alarm / reminder tool.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::types::{ActionTool, ToolError, optional_str, required_str};

/// Message used when the user did not say what the alarm is for.
pub const DEFAULT_ALARM_MESSAGE: &str = "wake up";

/// An alarm the user asked to set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRequest {
    pub time: String,
    pub message: String,
}

/// Reminder back-end the alarm setter records alarms with.
pub trait ReminderService: Send + Sync {
    /// Schedule an alarm.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure when the service rejects the alarm.
    fn schedule(&self, request: &AlarmRequest) -> Result<(), String>;
}

/// Process-local reminder list.
#[derive(Debug, Default)]
pub struct InMemoryReminders {
    alarms: Mutex<Vec<AlarmRequest>>,
}

impl InMemoryReminders {
    /// Snapshot of every alarm set so far.
    pub fn alarms(&self) -> Vec<AlarmRequest> {
        self.alarms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReminderService for InMemoryReminders {
    fn schedule(&self, request: &AlarmRequest) -> Result<(), String> {
        let mut alarms = self
            .alarms
            .lock()
            .map_err(|_| "reminder lock poisoned".to_string())?;
        alarms.push(request.clone());
        Ok(())
    }
}

/// Sets alarms and reminders.
pub struct AlarmSetter {
    reminders: Arc<dyn ReminderService>,
}

impl AlarmSetter {
    pub const NAME: &'static str = "set_alarm";

    pub fn new(reminders: Arc<dyn ReminderService>) -> Self {
        Self { reminders }
    }
}

impl ActionTool for AlarmSetter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Set an alarm or reminder for the given time with an optional message."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "time": {
                    "type": "string",
                    "description": "When the alarm should ring, e.g. '7:00 AM'"
                },
                "message": {
                    "type": "string",
                    "description": "What to be reminded of (defaults to 'wake up')"
                }
            },
            "required": ["time"],
            "additionalProperties": false
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let time = required_str(&args, "time")?.to_string();
        let message = optional_str(&args, "message")?
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_ALARM_MESSAGE)
            .to_string();
        let request = AlarmRequest { time, message };

        self.reminders
            .schedule(&request)
            .map_err(ToolError::Backend)?;
        tracing::debug!(time = %request.time, "alarm scheduled");

        Ok(format!(
            "Alarm confirmed for {}. The reminder message is: '{}'.",
            request.time, request.message
        ))
    }
}
