//! Implementation of the `deferred-action serve` command.
//!
//! Reads one JSON request per line from stdin and writes one JSON line per
//! response, event and effect run to stdout. Logs go to stderr.
//!
//! Requests are either scheduling requests (`{"type": "schedule", ...}`),
//! effect-side cancel/execute requests (`cancel-action`, `execute-action`)
//! or task management requests (`get-tasks`, `delete-task`,
//! `delete-all-tasks`, `execute-task`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::cli::load_config;
use crate::cli::output::{json_line, output, truncate, CommandOutput};
use crate::domain::models::TaskInfo;
use crate::domain::ports::{EffectRunner, ExecutionContext};
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::{
    handle_ipc_request, DeferredActionService, DeferredTaskManager, EventBus, EventBusConfig,
    IpcRequest, ScheduleDeferredAction,
};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Do not print lifecycle and store events
    #[arg(long)]
    pub no_events: bool,

    /// Override the configured log level
    #[arg(long)]
    pub log_level: Option<String>,
}

/// A line of input.
#[derive(Debug, Clone)]
pub enum ServeRequest {
    Schedule(Box<ScheduleDeferredAction>),
    CancelAction { task_id: String },
    ExecuteAction { task_id: String },
    Ipc(IpcRequest),
}

#[derive(Deserialize)]
struct TaskIdField {
    #[serde(default, alias = "taskId")]
    task_id: String,
}

impl ServeRequest {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line).context("Request is not valid JSON")?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .context("Request is missing a string \"type\" field")?
            .to_string();

        let request = match kind.as_str() {
            "schedule" => Self::Schedule(Box::new(
                serde_json::from_value(value).context("Invalid schedule request")?,
            )),
            "cancel-action" => {
                let field: TaskIdField =
                    serde_json::from_value(value).context("Invalid cancel-action request")?;
                Self::CancelAction {
                    task_id: field.task_id,
                }
            }
            "execute-action" => {
                let field: TaskIdField =
                    serde_json::from_value(value).context("Invalid execute-action request")?;
                Self::ExecuteAction {
                    task_id: field.task_id,
                }
            }
            _ => Self::Ipc(
                serde_json::from_value(value)
                    .with_context(|| format!("Unknown request type \"{kind}\""))?,
            ),
        };
        Ok(request)
    }
}

/// Effect runner that hands effect lists back to the host on stdout.
#[derive(Debug, Default)]
pub struct StdoutEffectRunner;

#[async_trait]
impl EffectRunner for StdoutEffectRunner {
    async fn run_effects(&self, context: ExecutionContext, effects: Vec<Value>) -> Result<()> {
        info!(task_id = %context.task_id, effects = effects.len(), "Running deferred effects");
        json_line(&json!({
            "type": "run-effects",
            "context": context,
            "effects": effects,
        }));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ServeOutput {
    pub requests_handled: usize,
    pub requests_failed: usize,
    pub dropped_tasks: Vec<TaskInfo>,
}

impl CommandOutput for ServeOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Handled {} request(s), {} failed.",
            self.requests_handled, self.requests_failed
        )];
        if !self.dropped_tasks.is_empty() {
            lines.push(format!(
                "Dropped {} pending task(s):",
                self.dropped_tasks.len()
            ));
            for task in &self.dropped_tasks {
                lines.push(format!(
                    "  - {} ({}s left): {}",
                    task.id,
                    task.countdown_seconds,
                    truncate(&task.description, 60)
                ));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Dispatch one request, returning the response line.
pub async fn handle_request(service: &DeferredActionService, request: ServeRequest) -> Value {
    match request {
        ServeRequest::Schedule(request) => {
            match service.schedule_deferred_action(*request).await {
                Ok(outcome) => json!({
                    "type": "schedule",
                    "success": outcome.success,
                    "task_id": outcome.task_id,
                }),
                Err(err) => json!({
                    "type": "schedule",
                    "success": false,
                    "error": err.to_string(),
                    "messages": err.messages(),
                }),
            }
        }
        ServeRequest::CancelAction { task_id } => json!({
            "type": "cancel-action",
            "success": service.cancel_deferred_action(&task_id),
            "task_id": task_id.trim(),
        }),
        ServeRequest::ExecuteAction { task_id } => json!({
            "type": "execute-action",
            "success": service.execute_deferred_action(&task_id),
            "task_id": task_id.trim(),
        }),
        ServeRequest::Ipc(request) => {
            serde_json::to_value(handle_ipc_request(service.manager(), request))
                .unwrap_or_default()
        }
    }
}

fn spawn_event_printer(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => json_line(&json!({ "type": "event", "event": event })),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event printer lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub async fn execute(args: ServeArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    let bus = Arc::new(EventBus::new(EventBusConfig::from(&config.event_bus)));
    let printer = (!args.no_events).then(|| spawn_event_printer(&bus));

    let manager = DeferredTaskManager::builder().notifiers(bus.clone()).build();
    let service = DeferredActionService::new(
        manager.clone(),
        Arc::new(StdoutEffectRunner),
        config.scheduler.clone(),
    );

    info!("Deferred action engine ready, reading requests from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut requests_handled = 0;
    let mut requests_failed = 0;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                None
            }
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match ServeRequest::parse(line) {
            Ok(request) => {
                let response = handle_request(&service, request).await;
                requests_handled += 1;
                json_line(&response);
            }
            Err(err) => {
                requests_failed += 1;
                warn!(error = %format!("{err:#}"), "Rejected request");
                json_line(&json!({ "type": "error", "success": false, "error": format!("{err:#}") }));
            }
        }
    }

    let dropped_tasks = manager.get_tasks();
    manager.cleanup();
    debug!(dropped = dropped_tasks.len(), "Engine cleaned up");

    if let Some(printer) = printer {
        printer.abort();
    }

    output(
        &ServeOutput {
            requests_handled,
            requests_failed,
            dropped_tasks,
        },
        json_mode,
    );
    Ok(())
}
