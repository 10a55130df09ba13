//! Effect execution port used by the request layer.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::TaskId;

/// Identity under which a batch of effects runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub task_id: TaskId,
    pub task_group: Option<String>,
    pub effect_id: Option<String>,
    pub user_comment: Option<String>,
}

/// Runs a host effect list. The engine never interprets the effects.
#[async_trait]
pub trait EffectRunner: Send + Sync {
    async fn run_effects(&self, context: ExecutionContext, effects: Vec<Value>) -> Result<()>;
}
