pub mod config;
pub mod deferred_task;
pub mod group_policy;
pub mod notification;
pub mod trigger;

pub use config::{Config, EventBusSettings, LoggingConfig, SchedulerConfig};
pub use deferred_task::{
    countdown_seconds, delay_seconds_to_ms, describe_effect_count, normalize_group, CancelReason,
    DeferredTask, ExecutionSource, ScheduleTask, TaskId, TaskInfo,
};
pub use group_policy::{ExistingTaskAction, GroupConflictPolicy, NewTaskAction};
pub use notification::{CanceledNotice, ExecutedNotice, ScheduledNotice};
pub use trigger::{describe_trigger, TriggerInfo};
