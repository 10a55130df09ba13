//! Deferred task domain model.
//!
//! A deferred task is a unit of work that waits for a delay before its
//! callback runs. Tasks live in the engine's store from scheduling until they
//! are executed (by timer or on demand) or canceled; removal is terminal.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::executable::Executable;

/// Opaque identifier of a deferred task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a fresh random (UUID v4) identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifier for work that runs immediately without ever entering the store.
    pub fn immediate(now_ms: i64) -> Self {
        Self(format!("immediate-{now_ms}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Why a task was canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CancelReason {
    /// Explicit external request (UI, IPC).
    #[default]
    User,
    /// Superseded by a group conflict policy.
    Conflict,
    /// Canceled by another scheduled unit of work.
    Effect,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Conflict => "conflict",
            Self::Effect => "effect",
        }
    }
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What triggered the execution of a stored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionSource {
    /// The task's own delay timer fired.
    Timer,
    /// An explicit execute-now request.
    Immediate,
}

impl ExecutionSource {
    /// Phrase used in execution log lines.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Timer => "after delay",
            Self::Immediate => "immediately",
        }
    }
}

/// Normalize a group name: trimmed, with empty or whitespace-only treated as absent.
pub fn normalize_group(group: Option<&str>) -> Option<String> {
    group
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(ToString::to_string)
}

/// Auto-generated description for a task without a user comment.
pub fn describe_effect_count(effect_count: usize) -> String {
    if effect_count == 1 {
        "Run 1 effect".to_string()
    } else {
        format!("Run {effect_count} effects")
    }
}

/// Convert a delay in seconds to whole milliseconds.
///
/// Negative and non-finite delays are clamped to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn delay_seconds_to_ms(delay_seconds: f64) -> u64 {
    if !delay_seconds.is_finite() || delay_seconds <= 0.0 {
        return 0;
    }
    (delay_seconds * 1000.0).round() as u64
}

/// Whole seconds remaining until `scheduled_time`, never negative.
pub fn countdown_seconds(scheduled_time: i64, now_ms: i64) -> u64 {
    let remaining = scheduled_time.saturating_sub(now_ms);
    if remaining <= 0 {
        return 0;
    }
    remaining.unsigned_abs().div_ceil(1000)
}

/// Parameters for scheduling a deferred task.
#[derive(Debug, Clone, Default)]
pub struct ScheduleTask {
    /// Delay before execution, in seconds.
    pub delay_seconds: f64,
    pub user_comment: Option<String>,
    pub effect_count: usize,
    pub trigger_description: String,
    pub task_group: Option<String>,
    /// Correlates the task back to the definition that issued the request.
    pub effect_id: Option<String>,
}

impl ScheduleTask {
    pub fn new(delay_seconds: f64) -> Self {
        Self {
            delay_seconds,
            ..Default::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.user_comment = Some(comment.into());
        self
    }

    pub fn with_effect_count(mut self, effect_count: usize) -> Self {
        self.effect_count = effect_count;
        self
    }

    pub fn with_trigger(mut self, trigger_description: impl Into<String>) -> Self {
        self.trigger_description = trigger_description.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.task_group = Some(group.into());
        self
    }

    pub fn with_effect_id(mut self, effect_id: impl Into<String>) -> Self {
        self.effect_id = Some(effect_id.into());
        self
    }

    /// Description shown for the task: the user comment if present, otherwise
    /// generated from the effect count.
    pub fn description(&self) -> String {
        match self.user_comment.as_deref() {
            Some(comment) if !comment.is_empty() => comment.to_string(),
            _ => describe_effect_count(self.effect_count),
        }
    }
}

/// A pending deferred task held by the engine's store.
pub struct DeferredTask {
    pub id: TaskId,
    /// Creation time, milliseconds since epoch.
    pub created_at: i64,
    /// `created_at + delay_ms`.
    pub scheduled_time: i64,
    pub delay_ms: u64,
    pub user_comment: Option<String>,
    pub effect_count: usize,
    pub trigger_description: String,
    pub description: String,
    pub task_group: Option<String>,
    pub effect_id: Option<String>,
    /// Consumed on execution, which makes a second invocation impossible.
    pub on_execute: Box<dyn Executable>,
}

impl DeferredTask {
    /// Snapshot of this task relative to `now_ms`.
    pub fn info(&self, now_ms: i64) -> TaskInfo {
        TaskInfo {
            id: self.id.clone(),
            created_at: self.created_at,
            scheduled_time: self.scheduled_time,
            user_comment: self.user_comment.clone(),
            effect_count: self.effect_count,
            trigger_description: self.trigger_description.clone(),
            description: self.description.clone(),
            task_group: self.task_group.clone(),
            effect_id: self.effect_id.clone(),
            countdown_seconds: countdown_seconds(self.scheduled_time, now_ms),
        }
    }
}

impl std::fmt::Debug for DeferredTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTask")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("scheduled_time", &self.scheduled_time)
            .field("delay_ms", &self.delay_ms)
            .field("description", &self.description)
            .field("task_group", &self.task_group)
            .field("effect_id", &self.effect_id)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of a pending task, as exposed to listings and the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: TaskId,
    pub created_at: i64,
    pub scheduled_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
    pub effect_count: usize,
    pub trigger_description: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<String>,
    pub countdown_seconds: u64,
}
