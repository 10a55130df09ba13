//! Event bus wired into the engine as its notifier

use std::sync::Arc;

use deferred_action::domain::models::{CancelReason, ScheduleTask};
use deferred_action::domain::ports::work;
use deferred_action::services::{EventBus, EventCategory, EventPayload};
use deferred_action::DeferredTaskManager;

#[tokio::test(start_paused = true)]
async fn test_engine_events_flow_through_bus() {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let manager = DeferredTaskManager::builder().notifiers(bus.clone()).build();

    let id = manager.schedule(
        ScheduleTask::new(5.0).with_group("G"),
        work(|| async { Ok(()) }),
    );
    assert!(manager.cancel_task(&id, CancelReason::Conflict));

    let mut payloads = Vec::new();
    while let Ok(event) = rx.try_recv() {
        payloads.push((event.sequence.0, event.category, event.payload));
    }

    assert_eq!(payloads.len(), 4);
    let sequences: Vec<u64> = payloads.iter().map(|(seq, _, _)| *seq).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3]);

    assert!(matches!(&payloads[0], (_, EventCategory::Lifecycle, EventPayload::TaskScheduled(n)) if n.task_id == id));
    assert!(matches!(&payloads[1], (_, EventCategory::Store, EventPayload::TaskAdded(info)) if info.id == id));
    assert!(matches!(&payloads[2], (_, EventCategory::Store, EventPayload::TaskRemoved { task_id }) if *task_id == id));
    assert!(matches!(
        &payloads[3],
        (_, EventCategory::Lifecycle, EventPayload::TaskCanceled(n))
            if n.task_id == id && n.cancel_reason == CancelReason::Conflict
    ));
}

#[tokio::test(start_paused = true)]
async fn test_bulk_cancel_emits_single_store_event() {
    let bus = Arc::new(EventBus::default());
    let manager = DeferredTaskManager::builder().notifiers(bus.clone()).build();
    for _ in 0..3 {
        manager.schedule(ScheduleTask::new(5.0), work(|| async { Ok(()) }));
    }

    let mut rx = bus.subscribe();
    assert_eq!(manager.cancel_all_tasks(), 3);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.payload, EventPayload::AllTasksRemoved { count: 3 });
    assert!(rx.try_recv().is_err());
}
