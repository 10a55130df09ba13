//! EventBus service for deferred task event streaming.
//!
//! Provides a broadcast-based event system with sequence numbering. The bus
//! implements both notification ports so it can be plugged straight into the
//! task manager; every lifecycle notice and store signal becomes one
//! [`DeferredActionEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::{
    CanceledNotice, EventBusSettings, ExecutedNotice, ScheduledNotice, TaskId, TaskInfo,
};
use crate::domain::ports::{LifecycleNotifier, StoreListener};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing sequence number assigned by EventBus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    pub fn zero() -> Self {
        Self(0)
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event category for filtering and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Semantic task transitions (scheduled, executed, canceled).
    Lifecycle,
    /// Store refresh signals for task listings.
    Store,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::Store => write!(f, "store"),
        }
    }
}

/// Event envelope containing all event metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredActionEvent {
    pub id: EventId,
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub category: EventCategory,
    pub payload: EventPayload,
}

impl DeferredActionEvent {
    /// Wrap a payload; the sequence number is assigned on publish.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            sequence: SequenceNumber::zero(),
            timestamp: Utc::now(),
            category: payload.category(),
            payload,
        }
    }
}

/// Event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    // Lifecycle events
    TaskScheduled(ScheduledNotice),
    TaskExecuted(ExecutedNotice),
    TaskCanceled(CanceledNotice),

    // Store events
    TaskAdded(TaskInfo),
    TaskRemoved { task_id: TaskId },
    AllTasksRemoved { count: usize },
}

impl EventPayload {
    pub fn category(&self) -> EventCategory {
        match self {
            Self::TaskScheduled(_) | Self::TaskExecuted(_) | Self::TaskCanceled(_) => {
                EventCategory::Lifecycle
            }
            Self::TaskAdded(_) | Self::TaskRemoved { .. } | Self::AllTasksRemoved { .. } => {
                EventCategory::Store
            }
        }
    }
}

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl From<&EventBusSettings> for EventBusConfig {
    fn from(settings: &EventBusSettings) -> Self {
        Self {
            channel_capacity: settings.channel_capacity,
        }
    }
}

/// Central event bus for broadcasting events to multiple consumers.
pub struct EventBus {
    sender: broadcast::Sender<DeferredActionEvent>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sequence", &self.current_sequence())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl EventBus {
    /// Create a new EventBus with the given configuration.
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Publish an event.
    pub fn publish(&self, mut event: DeferredActionEvent) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        event.sequence = SequenceNumber(seq);

        // Broadcast to subscribers (ignore send errors - may have no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn publish_payload(&self, payload: EventPayload) {
        self.publish(DeferredActionEvent::new(payload));
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DeferredActionEvent> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn current_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl LifecycleNotifier for EventBus {
    fn scheduled(&self, notice: &ScheduledNotice) {
        self.publish_payload(EventPayload::TaskScheduled(notice.clone()));
    }

    fn executed(&self, notice: &ExecutedNotice) {
        self.publish_payload(EventPayload::TaskExecuted(notice.clone()));
    }

    fn canceled(&self, notice: &CanceledNotice) {
        self.publish_payload(EventPayload::TaskCanceled(notice.clone()));
    }
}

impl StoreListener for EventBus {
    fn task_added(&self, task: &TaskInfo) {
        self.publish_payload(EventPayload::TaskAdded(task.clone()));
    }

    fn task_removed(&self, task_id: &TaskId) {
        self.publish_payload(EventPayload::TaskRemoved {
            task_id: task_id.clone(),
        });
    }

    fn all_tasks_removed(&self, count: usize) {
        self.publish_payload(EventPayload::AllTasksRemoved { count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CancelReason;

    #[tokio::test]
    async fn test_event_bus_sequence_assignment() {
        let bus = EventBus::new(EventBusConfig::default());

        assert_eq!(bus.current_sequence().0, 0);

        let mut rx = bus.subscribe();

        bus.task_removed(&TaskId::from("a"));
        let event1 = rx.recv().await.unwrap();
        assert_eq!(event1.sequence.0, 0);
        assert_eq!(event1.category, EventCategory::Store);

        bus.all_tasks_removed(3);
        let event2 = rx.recv().await.unwrap();
        assert_eq!(event2.sequence.0, 1);
        assert_eq!(event2.payload, EventPayload::AllTasksRemoved { count: 3 });

        assert_eq!(bus.current_sequence().0, 2);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.all_tasks_removed(1);
        assert_eq!(bus.current_sequence().0, 1);
    }

    #[tokio::test]
    async fn test_lifecycle_event_json() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.canceled(&CanceledNotice {
            effect_id: None,
            task_id: TaskId::from("task-1"),
            user_comment: Some("hello".to_string()),
            task_group: None,
            cancel_reason: CancelReason::Conflict,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.category, EventCategory::Lifecycle);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["category"], "lifecycle");
        assert_eq!(value["payload"]["type"], "TaskCanceled");
        assert_eq!(value["payload"]["data"]["taskId"], "task-1");
        assert_eq!(value["payload"]["data"]["cancelReason"], "conflict");
    }
}
