//! Group conflict resolution.
//!
//! Applies a [`GroupConflictPolicy`] when a new request names a group that
//! already holds pending tasks. Existing tasks are handled oldest first,
//! then the policy decides whether the caller should go on to schedule the
//! new work.

use tracing::debug;

use crate::domain::models::{
    CancelReason, ExistingTaskAction, GroupConflictPolicy, NewTaskAction, TaskId,
};
use crate::domain::ports::Executable;

use super::task_manager::{run_isolated, DeferredTaskManager};

/// What the caller should do with the new request after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Schedule the new work normally.
    Proceed,
    /// The new work already ran under this one-off identifier.
    ExecutedImmediately(TaskId),
    /// Nothing should be scheduled.
    Skipped,
}

/// Stateless resolver; all state lives in the task manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupConflictResolver;

impl GroupConflictResolver {
    pub const fn new() -> Self {
        Self
    }

    /// Resolve a conflict in `group_name`.
    ///
    /// `new_work` is only invoked for [`NewTaskAction::Execute`], with the
    /// identifier the work runs under. Existing tasks run in FIFO order and
    /// each one completes before the next starts.
    pub async fn resolve<F>(
        &self,
        manager: &DeferredTaskManager,
        group_name: &str,
        policy: GroupConflictPolicy,
        new_work: F,
    ) -> Resolution
    where
        F: FnOnce(TaskId) -> Box<dyn Executable>,
    {
        let group = group_name.trim();
        let existing = manager.find_tasks_by_group(group);
        if existing.is_empty() {
            return Resolution::Proceed;
        }

        debug!(
            group = %group,
            count = existing.len(),
            "Found existing task(s) in group"
        );

        for task in existing {
            match policy.existing {
                ExistingTaskAction::Keep => {}
                ExistingTaskAction::Cancel => {
                    if manager.cancel_task(&task.id, CancelReason::Conflict) {
                        debug!(task_id = %task.id, group = %group, "Cancelled existing task in group");
                    }
                }
                ExistingTaskAction::Execute => {
                    // The task may have fired between the lookup and now.
                    if let Some(work) = manager.cancel_and_reclaim(&task.id, CancelReason::Conflict) {
                        run_isolated(task.id.clone(), work).await;
                        debug!(
                            task_id = %task.id,
                            group = %group,
                            "Executed existing task immediately in group"
                        );
                    }
                }
            }
        }

        match policy.new {
            NewTaskAction::Schedule => Resolution::Proceed,
            NewTaskAction::Skip => {
                debug!(group = %group, "Skipped scheduling new task in group");
                Resolution::Skipped
            }
            NewTaskAction::Execute => {
                let task_id = TaskId::immediate(manager.now_ms());
                run_isolated(task_id.clone(), new_work(task_id.clone())).await;
                debug!(task_id = %task_id, group = %group, "Executed new task immediately in group");
                Resolution::ExecutedImmediately(task_id)
            }
        }
    }
}
