//! Structured actions the assistant can dispatch.
//!
//! Each tool implements [`ActionTool`] and is looked up by name through the
//! [`ToolRegistry`]. Calendar and reminder systems sit behind the
//! [`CalendarService`] and [`ReminderService`] traits.

pub mod alarm;
pub mod meeting;
pub mod registry;
pub mod types;

pub use alarm::{
    AlarmRequest, AlarmSetter, DEFAULT_ALARM_MESSAGE, InMemoryReminders, ReminderService,
};
pub use meeting::{CalendarService, InMemoryCalendar, MeetingRequest, MeetingScheduler};
pub use registry::ToolRegistry;
pub use types::{ActionTool, ToolError, error_codes};
