//! Lifecycle notification payloads.
//!
//! These are the semantic notifications emitted at each task state
//! transition. Field names follow the host's camelCase metadata convention.

use serde::{Deserialize, Serialize};

use super::deferred_task::{CancelReason, TaskId};

/// Emitted when a task is stored and its timer armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotice {
    pub effect_id: Option<String>,
    pub task_id: TaskId,
    pub user_comment: Option<String>,
    pub task_group: Option<String>,
    /// Milliseconds since epoch at which the task will run.
    pub scheduled_time: i64,
}

/// Emitted when a task leaves the store to be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedNotice {
    pub effect_id: Option<String>,
    pub task_id: TaskId,
    pub user_comment: Option<String>,
    pub task_group: Option<String>,
}

/// Emitted when a task leaves the store without running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanceledNotice {
    pub effect_id: Option<String>,
    pub task_id: TaskId,
    pub user_comment: Option<String>,
    pub task_group: Option<String>,
    pub cancel_reason: CancelReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canceled_notice_json_shape() {
        let notice = CanceledNotice {
            effect_id: Some("effect-id-123".to_string()),
            task_id: TaskId::from("task-id-456"),
            user_comment: None,
            task_group: Some("example-group".to_string()),
            cancel_reason: CancelReason::User,
        };
        let value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value["taskId"], "task-id-456");
        assert_eq!(value["taskGroup"], "example-group");
        assert_eq!(value["cancelReason"], "user");
        assert!(value["userComment"].is_null());
    }
}
