//! Request layer for scheduling, cancelling and executing deferred actions.
//!
//! Accepts host requests carrying opaque effect lists, validates them,
//! applies group conflict policy and binds the effects to engine tasks.
//! Effects are run through an injected [`EffectRunner`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    describe_effect_count, describe_trigger, normalize_group, CancelReason, ExistingTaskAction,
    GroupConflictPolicy, NewTaskAction, ScheduleTask, SchedulerConfig, TaskId, TriggerInfo,
};
use crate::domain::ports::{work, EffectRunner, Executable, ExecutionContext};

use super::group_conflict::{GroupConflictResolver, Resolution};
use super::task_manager::DeferredTaskManager;

/// A request to run an effect list after a delay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleDeferredAction {
    /// Delay in seconds, as a number or as text.
    #[serde(default)]
    pub delay: Value,
    #[serde(default)]
    pub user_comment: Option<String>,
    #[serde(default)]
    pub assign_to_group: bool,
    #[serde(default)]
    pub task_group_name: Option<String>,
    #[serde(default)]
    pub existing_task_action: Option<ExistingTaskAction>,
    #[serde(default)]
    pub new_task_action: Option<NewTaskAction>,
    #[serde(default)]
    pub effects: Vec<Value>,
    #[serde(default)]
    pub effect_id: Option<String>,
    #[serde(default)]
    pub trigger: Option<TriggerInfo>,
}

impl ScheduleDeferredAction {
    pub fn new(delay: impl Into<Value>, effects: Vec<Value>) -> Self {
        Self {
            delay: delay.into(),
            effects,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.user_comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn in_group(
        mut self,
        group: impl Into<String>,
        existing: ExistingTaskAction,
        new: NewTaskAction,
    ) -> Self {
        self.assign_to_group = true;
        self.task_group_name = Some(group.into());
        self.existing_task_action = Some(existing);
        self.new_task_action = Some(new);
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerInfo) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn with_effect_id(mut self, effect_id: impl Into<String>) -> Self {
        self.effect_id = Some(effect_id.into());
        self
    }

    fn delay_text(&self) -> String {
        match &self.delay {
            Value::Null => String::new(),
            Value::String(text) => text.trim().to_string(),
            other => other.to_string(),
        }
    }

    /// Validation messages; empty when the request is acceptable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.delay_text().is_empty() {
            errors.push("Delay is required.".to_string());
        }

        if self.effects.is_empty() {
            errors.push("Please add at least one effect to the effect list.".to_string());
        }

        if self.assign_to_group && self.group().is_none() {
            errors.push("Task group name cannot be empty.".to_string());
        }

        errors
    }

    /// Group the request targets, if grouping was asked for.
    pub fn group(&self) -> Option<String> {
        if self.assign_to_group {
            normalize_group(self.task_group_name.as_deref())
        } else {
            None
        }
    }

    /// One-line summary used in listings, e.g. `5s - reminder (2 effects)`.
    pub fn label(&self) -> String {
        let delay = match parse_delay_text(&self.delay_text()) {
            Some(seconds) if seconds <= 0.0 => "Immediate - ".to_string(),
            Some(seconds) => format!("{seconds}s - "),
            None => String::new(),
        };
        let comment = self.user_comment.as_deref().unwrap_or_default();
        let count = self.effects.len();
        let plural = if count == 1 { "" } else { "s" };
        format!("{delay}{comment} ({count} effect{plural})")
    }
}

/// Read the longest numeric prefix of `text`, so `"10s"` and
/// `"10 seconds"` both mean ten. Trailing text is ignored.
fn parse_delay_text(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite())
}

/// Normalize a host-supplied delay to seconds.
///
/// Unparseable, non-finite or negative values become zero, meaning "run on
/// the next tick". Values above `max_seconds` are capped.
pub fn parse_delay_seconds(delay: &Value, max_seconds: f64) -> f64 {
    let text = match delay {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };

    match parse_delay_text(&text) {
        Some(seconds) if seconds > 0.0 => seconds.min(max_seconds),
        _ => {
            debug!(delay = %text, "Delay resolved to zero or less, running immediately");
            0.0
        }
    }
}

/// Result of a scheduling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub success: bool,
    /// The stored task, or the one-off id of an immediate run. `None` when
    /// the request was skipped.
    pub task_id: Option<TaskId>,
}

/// Binds host effect lists to engine tasks.
#[derive(Clone)]
pub struct DeferredActionService {
    manager: DeferredTaskManager,
    runner: Arc<dyn EffectRunner>,
    config: SchedulerConfig,
    resolver: GroupConflictResolver,
}

impl std::fmt::Debug for DeferredActionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredActionService")
            .field("manager", &self.manager)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DeferredActionService {
    pub fn new(
        manager: DeferredTaskManager,
        runner: Arc<dyn EffectRunner>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            manager,
            runner,
            config,
            resolver: GroupConflictResolver::new(),
        }
    }

    pub fn manager(&self) -> &DeferredTaskManager {
        &self.manager
    }

    /// Schedule the request's effects, resolving group conflicts first.
    pub async fn schedule_deferred_action(
        &self,
        request: ScheduleDeferredAction,
    ) -> DomainResult<ScheduleOutcome> {
        let errors = request.validate();
        if !errors.is_empty() {
            if request.effects.is_empty() {
                warn!("Schedule deferred action: no effects specified");
            }
            return Err(DomainError::InvalidInput(errors));
        }

        let delay_seconds = parse_delay_seconds(&request.delay, self.config.max_delay_seconds);
        let trigger_description = describe_trigger(request.trigger.as_ref());
        let group = request.group();
        let effects = Arc::new(request.effects);

        if let Some(group_name) = group.as_deref() {
            let policy = GroupConflictPolicy::new(
                request
                    .existing_task_action
                    .unwrap_or(self.config.default_existing_action),
                request
                    .new_task_action
                    .unwrap_or(self.config.default_new_action),
            );

            let resolution = self
                .resolver
                .resolve(&self.manager, group_name, policy, |task_id| {
                    self.effect_work(
                        &task_id,
                        group.as_deref(),
                        request.effect_id.as_deref(),
                        request.user_comment.as_deref(),
                        &effects,
                    )
                })
                .await;

            match resolution {
                Resolution::Proceed => {}
                Resolution::Skipped => {
                    return Ok(ScheduleOutcome {
                        success: true,
                        task_id: None,
                    });
                }
                Resolution::ExecutedImmediately(task_id) => {
                    return Ok(ScheduleOutcome {
                        success: true,
                        task_id: Some(task_id),
                    });
                }
            }
        }

        let mut task = ScheduleTask::new(delay_seconds)
            .with_effect_count(effects.len())
            .with_trigger(trigger_description);
        if let Some(comment) = &request.user_comment {
            task = task.with_comment(comment.clone());
        }
        if let Some(group_name) = &group {
            task = task.with_group(group_name.clone());
        }
        if let Some(effect_id) = &request.effect_id {
            task = task.with_effect_id(effect_id.clone());
        }

        let task_id = self.manager.schedule_with(task, |task_id| {
            self.effect_work(
                task_id,
                group.as_deref(),
                request.effect_id.as_deref(),
                request.user_comment.as_deref(),
                &effects,
            )
        });

        Ok(ScheduleOutcome {
            success: true,
            task_id: Some(task_id),
        })
    }

    fn effect_work(
        &self,
        task_id: &TaskId,
        task_group: Option<&str>,
        effect_id: Option<&str>,
        user_comment: Option<&str>,
        effects: &Arc<Vec<Value>>,
    ) -> Box<dyn Executable> {
        let runner = self.runner.clone();
        let effects = effects.clone();
        let context = ExecutionContext {
            task_id: task_id.clone(),
            task_group: task_group.map(str::to_string),
            effect_id: effect_id.map(str::to_string),
            user_comment: user_comment.map(str::to_string),
        };

        work(move || async move {
            let task_id = context.task_id.clone();
            if let Err(err) = runner.run_effects(context, effects.as_ref().clone()).await {
                error!(task_id = %task_id, error = %err, "Failed to execute deferred effect list");
            }
            Ok(())
        })
    }

    /// Cancel a pending task on behalf of an effect.
    pub fn cancel_deferred_action(&self, task_id: &str) -> bool {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            warn!("Cancel deferred action: task id is required");
            return false;
        }

        let cancelled = self
            .manager
            .cancel_task(&TaskId::from(task_id), CancelReason::Effect);
        if !cancelled {
            warn!(task_id = %task_id, "Cancel deferred action: task not found");
        }
        cancelled
    }

    /// Run a pending task now on behalf of an effect.
    pub fn execute_deferred_action(&self, task_id: &str) -> bool {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            warn!("Execute deferred action: task id is required");
            return false;
        }

        let executed = self.manager.execute_task(&TaskId::from(task_id));
        if !executed {
            warn!(task_id = %task_id, "Execute deferred action: task not found");
        }
        executed
    }
}
