//! Trigger descriptors supplied by the host.
//!
//! The host passes the trigger that caused a scheduling request; the engine
//! only needs a human-readable origin string for listings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The host trigger that issued a scheduling request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerInfo {
    /// Trigger kind, e.g. `event`, `command`, `channel_reward`.
    #[serde(rename = "type", default)]
    pub trigger_type: String,
    /// Free-form host metadata.
    #[serde(default)]
    pub metadata: Value,
}

impl TriggerInfo {
    pub fn new(trigger_type: impl Into<String>, metadata: Value) -> Self {
        Self {
            trigger_type: trigger_type.into(),
            metadata,
        }
    }

    fn meta_str(&self, path: &[&str]) -> Option<&str> {
        let mut current = &self.metadata;
        for key in path {
            current = current.get(key)?;
        }
        current.as_str().filter(|s| !s.is_empty())
    }
}

/// Human-readable description of where a deferral came from.
pub fn describe_trigger(trigger: Option<&TriggerInfo>) -> String {
    let Some(trigger) = trigger else {
        return "Unknown trigger".to_string();
    };

    let kind = if trigger.trigger_type.is_empty() {
        "unknown"
    } else {
        trigger.trigger_type.as_str()
    };

    match kind {
        "event" => trigger
            .meta_str(&["event", "name"])
            .or_else(|| trigger.meta_str(&["eventSource", "name"]))
            .map_or_else(|| "Event trigger".to_string(), |name| format!("Event: {name}")),
        "preset" => trigger
            .meta_str(&["presetName"])
            .or_else(|| trigger.meta_str(&["triggerId"]))
            .map_or_else(|| "Preset trigger".to_string(), |name| format!("Preset: {name}")),
        "command" => trigger
            .meta_str(&["userCommand", "trigger"])
            .or_else(|| trigger.meta_str(&["command", "name"]))
            .map_or_else(|| "Command trigger".to_string(), |cmd| format!("Command: {cmd}")),
        "quick_action" => "Quick Action trigger".to_string(),
        "manual" => "Manual trigger".to_string(),
        "timer" => "Timer trigger".to_string(),
        "hotkey" => "Hotkey trigger".to_string(),
        "counter" => trigger
            .meta_str(&["counter", "name"])
            .map_or_else(|| "Counter trigger".to_string(), |name| format!("Counter: {name}")),
        "channel_reward" => "Channel reward trigger".to_string(),
        other => {
            let pretty = other.replace('_', " ");
            let mut chars = pretty.chars();
            let capped = chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            });
            format!("{capped} trigger")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_trigger() {
        assert_eq!(describe_trigger(None), "Unknown trigger");
    }

    #[test]
    fn test_named_triggers() {
        let t = TriggerInfo::new("event", json!({ "event": { "name": "Follow" } }));
        assert_eq!(describe_trigger(Some(&t)), "Event: Follow");

        let t = TriggerInfo::new("event", json!({ "eventSource": { "name": "Twitch" } }));
        assert_eq!(describe_trigger(Some(&t)), "Event: Twitch");

        let t = TriggerInfo::new("command", json!({ "userCommand": { "trigger": "!hi" } }));
        assert_eq!(describe_trigger(Some(&t)), "Command: !hi");

        let t = TriggerInfo::new("preset", json!({ "presetName": "Intro" }));
        assert_eq!(describe_trigger(Some(&t)), "Preset: Intro");

        let t = TriggerInfo::new("counter", json!({ "counter": { "name": "deaths" } }));
        assert_eq!(describe_trigger(Some(&t)), "Counter: deaths");
    }

    #[test]
    fn test_fallback_triggers() {
        let t = TriggerInfo::new("event", Value::Null);
        assert_eq!(describe_trigger(Some(&t)), "Event trigger");

        let t = TriggerInfo::new("quick_action", Value::Null);
        assert_eq!(describe_trigger(Some(&t)), "Quick Action trigger");

        let t = TriggerInfo::new("custom_script_thing", Value::Null);
        assert_eq!(describe_trigger(Some(&t)), "Custom script thing trigger");

        let t = TriggerInfo::new("", Value::Null);
        assert_eq!(describe_trigger(Some(&t)), "Unknown trigger");
    }
}
