//! Integration tests for the task management surface

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use common::{counting_work, Harness};
use deferred_action::domain::models::{CancelReason, ScheduleTask, TaskId};
use deferred_action::services::{handle_ipc_request, IpcRequest, IpcResponse};
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn test_get_tasks_lists_pending() {
    let h = Harness::new();
    let runs = Arc::new(AtomicU32::new(0));
    let id = h.manager.schedule(
        ScheduleTask::new(12.5).with_comment("later"),
        counting_work(&runs),
    );

    let (success, tasks) = match handle_ipc_request(&h.manager, IpcRequest::GetTasks) {
        IpcResponse::Tasks { success, tasks } => (success, tasks),
        other => panic!("unexpected response {other:?}"),
    };
    assert!(success);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(tasks[0].countdown_seconds, 13);

    let value = serde_json::to_value(IpcResponse::Tasks { success, tasks }).unwrap();
    assert_eq!(value["tasks"][0]["userComment"], "later");
    assert_eq!(value["tasks"][0]["countdownSeconds"], 13);
}

#[tokio::test(start_paused = true)]
async fn test_delete_task_cancels_with_user_reason() {
    let h = Harness::new();
    let runs = Arc::new(AtomicU32::new(0));
    let id = h.manager.schedule(ScheduleTask::new(5.0), counting_work(&runs));

    let response = handle_ipc_request(
        &h.manager,
        IpcRequest::DeleteTask {
            task_id: id.clone(),
        },
    );
    assert_eq!(
        response,
        IpcResponse::Deleted {
            success: true,
            task_id: id.clone()
        }
    );
    assert_eq!(h.recorder.canceled()[0].cancel_reason, CancelReason::User);

    let response = handle_ipc_request(&h.manager, IpcRequest::DeleteTask { task_id: id });
    assert!(!response.success());

    h.advance_ms(10_000).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delete_all_tasks_reports_count() {
    let h = Harness::new();
    let runs = Arc::new(AtomicU32::new(0));
    h.manager.schedule(ScheduleTask::new(5.0), counting_work(&runs));
    h.manager.schedule(ScheduleTask::new(6.0), counting_work(&runs));

    let response = handle_ipc_request(&h.manager, IpcRequest::DeleteAllTasks);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "type": "delete-all-tasks", "success": true, "cancelledCount": 2 })
    );

    let response = handle_ipc_request(&h.manager, IpcRequest::DeleteAllTasks);
    assert_eq!(
        response,
        IpcResponse::DeletedAll {
            success: true,
            cancelled_count: 0
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_execute_task_reports_missing() {
    let h = Harness::new();
    let runs = Arc::new(AtomicU32::new(0));
    let id = h.manager.schedule(ScheduleTask::new(5.0), counting_work(&runs));

    let response = handle_ipc_request(
        &h.manager,
        IpcRequest::ExecuteTask {
            task_id: id.clone(),
        },
    );
    assert!(response.success());
    h.advance_ms(0).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let missing = TaskId::from("missing");
    let response = handle_ipc_request(
        &h.manager,
        IpcRequest::ExecuteTask {
            task_id: missing.clone(),
        },
    );
    assert_eq!(
        response,
        IpcResponse::Executed {
            success: false,
            task_id: missing,
            error: Some("Task not found".to_string()),
        }
    );
}
