//! Common test utilities for integration tests
//!
//! Provides a controllable clock, predictable identifiers, a notifier that
//! records everything the engine emits, and helpers for driving paused
//! Tokio time.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deferred_action::domain::models::{
    CanceledNotice, ExecutedNotice, ScheduledNotice, TaskId, TaskInfo,
};
use deferred_action::domain::ports::{
    work, Clock, Executable, IdGenerator, LifecycleNotifier, StoreListener,
};
use deferred_action::DeferredTaskManager;

/// Fixed starting time for tests: 2024-01-01T00:00:00Z.
pub const T0: i64 = 1_704_067_200_000;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(start_ms),
        })
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Identifiers `task-1`, `task-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> TaskId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        TaskId(format!("task-{n}"))
    }
}

/// Everything the engine emitted, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Scheduled(ScheduledNotice),
    Executed(ExecutedNotice),
    Canceled(CanceledNotice),
    Added(TaskId),
    Removed(TaskId),
    AllRemoved(usize),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn canceled(&self) -> Vec<CanceledNotice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Canceled(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub fn executed(&self) -> Vec<ExecutedNotice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Executed(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

impl LifecycleNotifier for RecordingNotifier {
    fn scheduled(&self, notice: &ScheduledNotice) {
        self.push(Recorded::Scheduled(notice.clone()));
    }

    fn executed(&self, notice: &ExecutedNotice) {
        self.push(Recorded::Executed(notice.clone()));
    }

    fn canceled(&self, notice: &CanceledNotice) {
        self.push(Recorded::Canceled(notice.clone()));
    }
}

impl StoreListener for RecordingNotifier {
    fn task_added(&self, task: &TaskInfo) {
        self.push(Recorded::Added(task.id.clone()));
    }

    fn task_removed(&self, task_id: &TaskId) {
        self.push(Recorded::Removed(task_id.clone()));
    }

    fn all_tasks_removed(&self, count: usize) {
        self.push(Recorded::AllRemoved(count));
    }
}

/// Engine wired to a manual clock, sequential ids and a recorder.
pub struct Harness {
    pub manager: DeferredTaskManager,
    pub clock: Arc<ManualClock>,
    pub recorder: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::new(T0);
        let recorder = Arc::new(RecordingNotifier::default());
        let manager = DeferredTaskManager::builder()
            .notifiers(recorder.clone())
            .clock(clock.clone())
            .id_generator(Arc::new(SequentialIds::default()))
            .build();
        Self {
            manager,
            clock,
            recorder,
        }
    }

    /// Move both the engine clock and paused Tokio time forward, then let
    /// fired timers and callbacks run.
    pub async fn advance_ms(&self, ms: u64) {
        self.clock.advance_ms(i64::try_from(ms).unwrap());
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }
}

/// Let spawned timers and callbacks run to completion.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Work that bumps `counter` each time it runs.
pub fn counting_work(counter: &Arc<AtomicU32>) -> Box<dyn Executable> {
    let counter = counter.clone();
    work(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

/// Work that appends `label` to a shared log when it runs.
pub fn logging_work(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Box<dyn Executable> {
    let log = log.clone();
    let label = label.to_string();
    work(move || async move {
        log.lock().unwrap().push(label);
        Ok(())
    })
}
