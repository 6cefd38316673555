//! Meeting scheduling tool.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::types::{ActionTool, ToolError, required_str};

/// A meeting the user asked to put on their calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub time: String,
    pub subject: String,
    pub attendees: String,
}

/// Calendar back-end the scheduler records meetings with.
pub trait CalendarService: Send + Sync {
    /// Book a meeting.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure when the calendar rejects the booking.
    fn book(&self, request: &MeetingRequest) -> Result<(), String>;
}

/// Process-local calendar that keeps booked meetings in a vector.
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    meetings: Mutex<Vec<MeetingRequest>>,
}

impl InMemoryCalendar {
    /// Snapshot of every meeting booked so far.
    pub fn meetings(&self) -> Vec<MeetingRequest> {
        self.meetings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CalendarService for InMemoryCalendar {
    fn book(&self, request: &MeetingRequest) -> Result<(), String> {
        let mut meetings = self
            .meetings
            .lock()
            .map_err(|_| "calendar lock poisoned".to_string())?;
        meetings.push(request.clone());
        Ok(())
    }
}

/// Schedules meetings on the user's calendar.
pub struct MeetingScheduler {
    calendar: Arc<dyn CalendarService>,
}

impl MeetingScheduler {
    pub const NAME: &'static str = "schedule_meeting";

    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }
}

impl ActionTool for MeetingScheduler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Schedule a meeting with the given attendees at the given time."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "time": {
                    "type": "string",
                    "description": "When the meeting takes place, e.g. 'Tomorrow at 10:00 AM'"
                },
                "subject": {
                    "type": "string",
                    "description": "What the meeting is about"
                },
                "attendees": {
                    "type": "string",
                    "description": "Who is invited, e.g. 'Alice and Bob'"
                }
            },
            "required": ["time", "subject", "attendees"],
            "additionalProperties": false
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let request = MeetingRequest {
            time: required_str(&args, "time")?.to_string(),
            subject: required_str(&args, "subject")?.to_string(),
            attendees: required_str(&args, "attendees")?.to_string(),
        };

        self.calendar.book(&request).map_err(ToolError::Backend)?;
        tracing::debug!(subject = %request.subject, time = %request.time, "meeting booked");

        Ok(format!(
            "Got it. I have successfully scheduled a meeting on '{}' with {} for {}.",
            request.subject, request.attendees, request.time
        ))
    }
}
