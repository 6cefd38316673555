//! Tool registry.
//!
//! The [`ToolRegistry`] holds registered tools, provides lookup by name and
//! exports JSON schemas in a deterministic order.

use std::collections::HashMap;
use std::sync::Arc;

use super::alarm::{AlarmSetter, ReminderService};
use super::meeting::{CalendarService, MeetingScheduler};
use super::types::{ActionTool, ToolError};

/// Registry of available action tools, keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ActionTool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the meeting scheduler and alarm setter.
    pub fn with_default_tools(
        calendar: Arc<dyn CalendarService>,
        reminders: Arc<dyn ReminderService>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MeetingScheduler::new(calendar)));
        registry.register(Arc::new(AlarmSetter::new(reminders)));
        registry
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn ActionTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionTool>> {
        self.tools.get(name).cloned()
    }

    /// Look up `name` and execute it with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for an unknown name, otherwise whatever
    /// the tool returns.
    pub fn execute(&self, name: &str, args: serde_json::Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(args)
    }

    /// Check if a tool exists in the registry.
    pub fn exists(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List names of all registered tools, sorted.
    pub fn list_available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.values().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }

    /// Export `{name, description, parameters}` for every tool, sorted by name.
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        let mut schemas: Vec<(String, serde_json::Value)> = self
            .tools
            .values()
            .map(|t| {
                let entry = serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.schema(),
                });
                (t.name().to_string(), entry)
            })
            .collect();
        schemas.sort_by(|a, b| a.0.cmp(&b.0));
        schemas.into_iter().map(|(_, v)| v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::alarm::InMemoryReminders;
    use crate::tools::meeting::InMemoryCalendar;

    struct StaticTool {
        tool_name: &'static str,
    }

    impl ActionTool for StaticTool {
        fn name(&self) -> &str {
            self.tool_name
        }
        fn description(&self) -> &str {
            "Returns a fixed confirmation"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
            Ok(format!("{} done", self.tool_name))
        }
    }

    fn default_registry() -> ToolRegistry {
        ToolRegistry::with_default_tools(
            Arc::new(InMemoryCalendar::default()),
            Arc::new(InMemoryReminders::default()),
        )
    }

    #[test]
    fn default_tools_are_registered() {
        let registry = default_registry();
        assert_eq!(
            registry.list_available(),
            vec!["schedule_meeting", "set_alarm"]
        );
        assert!(registry.exists("set_alarm"));
        assert!(!registry.exists("order_pizza"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool { tool_name: "ping" }));
        registry.register(Arc::new(StaticTool { tool_name: "ping" }));
        assert_eq!(registry.list_available().len(), 1);
    }

    #[test]
    fn execute_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let result = registry.execute("ping", serde_json::json!({}));
        assert_eq!(result, Err(ToolError::NotFound("ping".into())));
    }

    #[test]
    fn execute_dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool { tool_name: "ping" }));
        assert_eq!(
            registry.execute("ping", serde_json::json!({})).as_deref(),
            Ok("ping done")
        );
    }

    #[test]
    fn schemas_are_sorted_and_complete() {
        let registry = default_registry();
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0]["name"], "schedule_meeting");
        assert_eq!(schemas[1]["name"], "set_alarm");
        assert!(schemas[0]["parameters"]["properties"]["attendees"].is_object());
        assert!(schemas[1]["description"].is_string());
    }
}
