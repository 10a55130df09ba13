//! Group conflict policy model.
//!
//! When a new deferral names a group that already has live tasks, the policy
//! decides what happens to the existing tasks and to the incoming request.

use serde::{Deserialize, Serialize};

/// Disposition of tasks already live in the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ExistingTaskAction {
    /// Cancel each existing task with reason `conflict`.
    Cancel,
    /// Cancel each existing task, then run its work immediately.
    Execute,
    /// Leave existing tasks untouched.
    #[default]
    Keep,
}

impl ExistingTaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Execute => "execute",
            Self::Keep => "keep",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cancel" => Some(Self::Cancel),
            "execute" => Some(Self::Execute),
            "keep" => Some(Self::Keep),
            _ => None,
        }
    }
}

impl TryFrom<String> for ExistingTaskAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| {
            format!("unknown existing task action \"{value}\", expected cancel, execute or keep")
        })
    }
}

/// Disposition of the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum NewTaskAction {
    /// Run the new work now under a one-off identifier; nothing is stored.
    Execute,
    /// Schedule normally.
    #[default]
    Schedule,
    /// Do not schedule anything.
    Skip,
}

impl NewTaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::Schedule => "schedule",
            Self::Skip => "skip",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "execute" => Some(Self::Execute),
            "schedule" => Some(Self::Schedule),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl TryFrom<String> for NewTaskAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| {
            format!("unknown new task action \"{value}\", expected execute, schedule or skip")
        })
    }
}

/// Combined policy applied to a group collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GroupConflictPolicy {
    #[serde(default)]
    pub existing: ExistingTaskAction,
    #[serde(default)]
    pub new: NewTaskAction,
}

impl GroupConflictPolicy {
    pub const fn new(existing: ExistingTaskAction, new: NewTaskAction) -> Self {
        Self { existing, new }
    }
}
