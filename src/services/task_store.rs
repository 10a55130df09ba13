//! In-memory registry of pending deferred tasks.
//!
//! The store is not synchronized itself; the task manager wraps it in a
//! mutex and performs every insert, removal and drain under that lock.
//! Entries carry a creation sequence number so that listings and group
//! lookups are ordered oldest-first independent of hash order.

use std::collections::HashMap;

use crate::domain::models::{DeferredTask, TaskId};

use super::timer::TimerHandle;

/// A task together with the timer that will fire it.
#[derive(Debug)]
pub struct StoredTask {
    pub task: DeferredTask,
    pub timer: TimerHandle,
    /// Monotonic insertion counter; lower means older.
    pub sequence: u64,
}

/// Pending tasks keyed by identifier.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: HashMap<TaskId, StoredTask>,
    next_sequence: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.tasks.contains_key(task_id)
    }

    pub fn get(&self, task_id: &TaskId) -> Option<&StoredTask> {
        self.tasks.get(task_id)
    }

    /// Insert a task. The caller guarantees the id is not already live.
    pub fn insert(&mut self, task: DeferredTask, timer: TimerHandle) {
        debug_assert!(!self.tasks.contains_key(&task.id), "duplicate task id {}", task.id);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.tasks.insert(
            task.id.clone(),
            StoredTask {
                task,
                timer,
                sequence,
            },
        );
    }

    pub fn remove(&mut self, task_id: &TaskId) -> Option<StoredTask> {
        self.tasks.remove(task_id)
    }

    /// Remove every entry, oldest first.
    pub fn drain(&mut self) -> Vec<StoredTask> {
        let mut drained: Vec<StoredTask> = self.tasks.drain().map(|(_, stored)| stored).collect();
        drained.sort_by_key(|stored| stored.sequence);
        drained
    }

    /// All entries, oldest first.
    pub fn ordered(&self) -> Vec<&StoredTask> {
        let mut entries: Vec<&StoredTask> = self.tasks.values().collect();
        entries.sort_by_key(|stored| stored.sequence);
        entries
    }

    /// Entries whose group equals `group` (already trimmed), oldest first.
    pub fn find_by_group(&self, group: &str) -> Vec<&StoredTask> {
        self.ordered()
            .into_iter()
            .filter(|stored| stored.task.task_group.as_deref() == Some(group))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
