//! Application services.
//!
//! The scheduling engine and the layers wired around it:
//! - `timer` / `task_store`: one-shot timers and the pending task registry
//! - `task_manager`: the deferred task engine
//! - `group_conflict`: group collision policy
//! - `deferred_action_service`: request validation and effect binding
//! - `event_bus`: broadcast of lifecycle and store events
//! - `ipc`: task listing and management requests

pub mod deferred_action_service;
pub mod event_bus;
pub mod group_conflict;
pub mod ipc;
pub mod task_manager;
pub mod task_store;
pub mod timer;

pub use deferred_action_service::{
    parse_delay_seconds, DeferredActionService, ScheduleDeferredAction, ScheduleOutcome,
};
pub use event_bus::{
    DeferredActionEvent, EventBus, EventBusConfig, EventCategory, EventId, EventPayload,
    SequenceNumber,
};
pub use group_conflict::{GroupConflictResolver, Resolution};
pub use ipc::{handle_ipc_request, IpcRequest, IpcResponse};
pub use task_manager::{DeferredTaskManager, DeferredTaskManagerBuilder};
pub use task_store::{StoredTask, TaskStore};
pub use timer::TimerHandle;
