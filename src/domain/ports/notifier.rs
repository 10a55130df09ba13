//! Notification ports.
//!
//! Two independent channels leave the engine: semantic lifecycle notices
//! (scheduled / executed / canceled) for the host event system, and a
//! lightweight store signal (added / removed / all removed) for UI refresh.
//! Both are delivered synchronously at the point of the state transition,
//! after the store lock has been released.

use crate::domain::models::{CanceledNotice, ExecutedNotice, ScheduledNotice, TaskId, TaskInfo};

/// Receives lifecycle notices.
pub trait LifecycleNotifier: Send + Sync {
    fn scheduled(&self, notice: &ScheduledNotice);
    fn executed(&self, notice: &ExecutedNotice);
    fn canceled(&self, notice: &CanceledNotice);
}

/// Receives store-mutation signals.
pub trait StoreListener: Send + Sync {
    fn task_added(&self, task: &TaskInfo);
    fn task_removed(&self, task_id: &TaskId);
    fn all_tasks_removed(&self, count: usize);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl LifecycleNotifier for NoopNotifier {
    fn scheduled(&self, _notice: &ScheduledNotice) {}
    fn executed(&self, _notice: &ExecutedNotice) {}
    fn canceled(&self, _notice: &CanceledNotice) {}
}

impl StoreListener for NoopNotifier {
    fn task_added(&self, _task: &TaskInfo) {}
    fn task_removed(&self, _task_id: &TaskId) {}
    fn all_tasks_removed(&self, _count: usize) {}
}
