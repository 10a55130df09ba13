//! Deferred Action - delayed effect scheduling engine
//!
//! Schedules opaque units of work to run after a delay, tracks them until
//! they are executed or canceled, and resolves conflicts between tasks that
//! share a group label.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): task models, notices and port traits
//! - **Service Layer** (`services`): the scheduling engine and the layers around it
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use deferred_action::domain::models::ScheduleTask;
//! use deferred_action::domain::ports::work;
//! use deferred_action::DeferredTaskManager;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = DeferredTaskManager::new();
//!     let task_id = manager.schedule(
//!         ScheduleTask::new(5.0).with_comment("say hello"),
//!         work(|| async {
//!             println!("hello");
//!             Ok(())
//!         }),
//!     );
//!     assert_eq!(manager.get_tasks()[0].id, task_id);
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CancelReason, Config, ExistingTaskAction, GroupConflictPolicy, NewTaskAction, ScheduleTask,
    TaskId, TaskInfo,
};
pub use domain::ports::{work, EffectRunner, Executable, LifecycleNotifier, StoreListener};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    DeferredActionService, DeferredTaskManager, EventBus, GroupConflictResolver,
    ScheduleDeferredAction,
};
