//! Query and management surface for task listings.
//!
//! Requests arrive as tagged JSON (`{"type": "get-tasks"}` and so on) and
//! map one-to-one onto task manager operations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::models::{CancelReason, TaskId, TaskInfo};

use super::task_manager::DeferredTaskManager;

/// A management request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum IpcRequest {
    GetTasks,
    DeleteTask {
        #[serde(alias = "taskId")]
        task_id: TaskId,
    },
    DeleteAllTasks,
    ExecuteTask {
        #[serde(alias = "taskId")]
        task_id: TaskId,
    },
}

impl IpcRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetTasks => "get-tasks",
            Self::DeleteTask { .. } => "delete-task",
            Self::DeleteAllTasks => "delete-all-tasks",
            Self::ExecuteTask { .. } => "execute-task",
        }
    }
}

/// Response to an [`IpcRequest`], tagged with the request's `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcResponse {
    #[serde(rename = "get-tasks")]
    Tasks { success: bool, tasks: Vec<TaskInfo> },
    #[serde(rename = "delete-task", rename_all = "camelCase")]
    Deleted { success: bool, task_id: TaskId },
    #[serde(rename = "delete-all-tasks", rename_all = "camelCase")]
    DeletedAll {
        success: bool,
        cancelled_count: usize,
    },
    #[serde(rename = "execute-task", rename_all = "camelCase")]
    Executed {
        success: bool,
        task_id: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl IpcResponse {
    pub fn success(&self) -> bool {
        match self {
            Self::Tasks { success, .. }
            | Self::Deleted { success, .. }
            | Self::DeletedAll { success, .. }
            | Self::Executed { success, .. } => *success,
        }
    }
}

/// Apply a management request to the engine.
pub fn handle_ipc_request(manager: &DeferredTaskManager, request: IpcRequest) -> IpcResponse {
    debug!(request = request.name(), "Handling IPC request");

    match request {
        IpcRequest::GetTasks => IpcResponse::Tasks {
            success: true,
            tasks: manager.get_tasks(),
        },
        IpcRequest::DeleteTask { task_id } => IpcResponse::Deleted {
            success: manager.cancel_task(&task_id, CancelReason::User),
            task_id,
        },
        IpcRequest::DeleteAllTasks => IpcResponse::DeletedAll {
            success: true,
            cancelled_count: manager.cancel_all_tasks(),
        },
        IpcRequest::ExecuteTask { task_id } => {
            let executed = manager.execute_task(&task_id);
            IpcResponse::Executed {
                success: executed,
                task_id,
                error: (!executed).then(|| "Task not found".to_string()),
            }
        }
    }
}
