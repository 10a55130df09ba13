//! Deferred task scheduling engine.
//!
//! Owns the task store and one timer per task. Every task follows
//! `Scheduled -> {Executed | Canceled}`; membership in the store, checked
//! under the store mutex, is the single source of truth for "already
//! handled", so a timer that fires after an explicit execute (or the other
//! way around) finds nothing and does nothing.
//!
//! Notifications and callbacks always run after the store lock is released,
//! which lets callbacks and listeners call back into the engine.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::domain::models::{
    delay_seconds_to_ms, normalize_group, CancelReason, CanceledNotice, DeferredTask,
    ExecutedNotice, ExecutionSource, ScheduleTask, ScheduledNotice, TaskId, TaskInfo,
};
use crate::domain::ports::{
    Clock, Executable, IdGenerator, LifecycleNotifier, NoopNotifier, StoreListener, SystemClock,
    UuidGenerator,
};

use super::task_store::{StoredTask, TaskStore};
use super::timer::TimerHandle;

/// Attempts at drawing a fresh identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

struct ManagerInner {
    store: Mutex<TaskStore>,
    notifier: Arc<dyn LifecycleNotifier>,
    listener: Arc<dyn StoreListener>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        let store = self.store.get_mut().unwrap_or_else(PoisonError::into_inner);
        for stored in store.drain() {
            stored.timer.disarm();
        }
    }
}

/// Handle to the deferred task engine.
///
/// Cloning is cheap and every clone refers to the same engine. All mutating
/// operations must be called from within a Tokio runtime, since they arm or
/// disarm timers and spawn callbacks.
#[derive(Clone)]
pub struct DeferredTaskManager {
    inner: Arc<ManagerInner>,
}

impl Default for DeferredTaskManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for DeferredTaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTaskManager")
            .field("pending", &self.task_count())
            .finish_non_exhaustive()
    }
}

/// Builder wiring the engine's collaborators.
pub struct DeferredTaskManagerBuilder {
    notifier: Arc<dyn LifecycleNotifier>,
    listener: Arc<dyn StoreListener>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for DeferredTaskManagerBuilder {
    fn default() -> Self {
        Self {
            notifier: Arc::new(NoopNotifier),
            listener: Arc::new(NoopNotifier),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }
}

impl DeferredTaskManagerBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn LifecycleNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store_listener(mut self, listener: Arc<dyn StoreListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Use one value for both lifecycle notices and store signals.
    pub fn notifiers<N>(self, notifier: Arc<N>) -> Self
    where
        N: LifecycleNotifier + StoreListener + 'static,
    {
        self.notifier(notifier.clone()).store_listener(notifier)
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn build(self) -> DeferredTaskManager {
        DeferredTaskManager {
            inner: Arc::new(ManagerInner {
                store: Mutex::new(TaskStore::new()),
                notifier: self.notifier,
                listener: self.listener,
                clock: self.clock,
                ids: self.ids,
            }),
        }
    }
}

impl DeferredTaskManager {
    /// Engine with no-op notifiers, the system clock and UUID identifiers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DeferredTaskManagerBuilder {
        DeferredTaskManagerBuilder::default()
    }

    fn store(&self) -> MutexGuard<'_, TaskStore> {
        // The store has no multi-step invariants a panicking holder could break.
        self.inner.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current time according to the engine's clock.
    pub fn now_ms(&self) -> i64 {
        self.inner.clock.now_ms()
    }

    /// Schedule `on_execute` to run after `request.delay_seconds`.
    ///
    /// Negative or non-finite delays are treated as zero, which runs the task
    /// on the next scheduler tick. Returns the new task's identifier.
    pub fn schedule(&self, request: ScheduleTask, on_execute: Box<dyn Executable>) -> TaskId {
        self.schedule_with(request, move |_| on_execute)
    }

    /// Like [`schedule`](Self::schedule), but builds the work from the
    /// identifier the task is stored under.
    ///
    /// `build` runs while the store is locked and must not call back into
    /// the manager.
    pub fn schedule_with<F>(&self, request: ScheduleTask, build: F) -> TaskId
    where
        F: FnOnce(&TaskId) -> Box<dyn Executable>,
    {
        let delay_ms = delay_seconds_to_ms(request.delay_seconds);
        let created_at = self.inner.clock.now_ms();
        let scheduled_time =
            created_at.saturating_add(i64::try_from(delay_ms).unwrap_or(i64::MAX));
        let description = request.description();
        let task_group = normalize_group(request.task_group.as_deref());

        let (task_id, info) = {
            let mut store = self.store();
            let task_id = self.fresh_id(&store);

            // Armed while the lock is held, so even a zero-delay timer observes
            // the task once it gets to run.
            let weak = Arc::downgrade(&self.inner);
            let fire_id = task_id.clone();
            let timer = TimerHandle::arm(Duration::from_millis(delay_ms), move || {
                Self::fire(&weak, &fire_id);
            });

            let task = DeferredTask {
                id: task_id.clone(),
                created_at,
                scheduled_time,
                delay_ms,
                user_comment: request.user_comment.clone(),
                effect_count: request.effect_count,
                trigger_description: request.trigger_description,
                description,
                task_group: task_group.clone(),
                effect_id: request.effect_id.clone(),
                on_execute: build(&task_id),
            };
            let info = task.info(created_at);
            store.insert(task, timer);
            (task_id, info)
        };

        debug!(
            task_id = %task_id,
            delay_ms,
            description = %info.description,
            "Scheduled deferred task"
        );

        self.inner.notifier.scheduled(&ScheduledNotice {
            effect_id: request.effect_id,
            task_id: task_id.clone(),
            user_comment: request.user_comment,
            task_group,
            scheduled_time,
        });
        self.inner.listener.task_added(&info);

        task_id
    }

    fn fresh_id(&self, store: &TaskStore) -> TaskId {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.inner.ids.next_id();
            if !store.contains(&candidate) {
                return candidate;
            }
            warn!(task_id = %candidate, "Identifier generator returned a live task id, retrying");
        }
        panic!("identifier generator produced {MAX_ID_ATTEMPTS} colliding task ids in a row");
    }

    fn fire(weak: &Weak<ManagerInner>, task_id: &TaskId) {
        if let Some(inner) = weak.upgrade() {
            Self { inner }.execute_stored(task_id, ExecutionSource::Timer);
        }
    }

    /// Execute a pending task now. Returns `false` if the task is not pending.
    ///
    /// The result reflects only that execution was triggered; a failing
    /// callback is logged and does not change it.
    pub fn execute_task(&self, task_id: &TaskId) -> bool {
        self.execute_stored(task_id, ExecutionSource::Immediate)
    }

    fn execute_stored(&self, task_id: &TaskId, source: ExecutionSource) -> bool {
        let removed = self.store().remove(task_id);
        let Some(StoredTask { task, timer, .. }) = removed else {
            match source {
                ExecutionSource::Immediate => {
                    warn!(task_id = %task_id, "Attempted to execute non-existent task");
                }
                ExecutionSource::Timer => {
                    debug!(task_id = %task_id, "Timer fired for a task that was already handled");
                }
            }
            return false;
        };

        // A timer-sourced call runs inside the timer itself.
        if source == ExecutionSource::Immediate {
            timer.disarm();
        }

        self.inner.listener.task_removed(&task.id);
        debug!(
            task_id = %task.id,
            description = %task.description,
            "Executing deferred task {}",
            source.describe()
        );

        self.inner.notifier.executed(&ExecutedNotice {
            effect_id: task.effect_id,
            task_id: task.id.clone(),
            user_comment: task.user_comment,
            task_group: task.task_group,
        });

        tokio::spawn(run_isolated(task.id, task.on_execute));
        true
    }

    /// Cancel a pending task without running it. Returns `false` if the task
    /// is not pending.
    pub fn cancel_task(&self, task_id: &TaskId, reason: CancelReason) -> bool {
        self.remove_canceled(task_id, reason).is_some()
    }

    /// Cancel a pending task and hand its work back to the caller instead of
    /// dropping it.
    ///
    /// Emits the same notifications as [`cancel_task`](Self::cancel_task).
    /// Used when a group conflict supersedes a task but its work should still
    /// run under its own identity.
    pub fn cancel_and_reclaim(
        &self,
        task_id: &TaskId,
        reason: CancelReason,
    ) -> Option<Box<dyn Executable>> {
        self.remove_canceled(task_id, reason).map(|task| task.on_execute)
    }

    fn remove_canceled(&self, task_id: &TaskId, reason: CancelReason) -> Option<DeferredTask> {
        let removed = self.store().remove(task_id);
        let Some(StoredTask { task, timer, .. }) = removed else {
            warn!(task_id = %task_id, "Attempted to cancel non-existent task");
            return None;
        };
        timer.disarm();

        self.inner.listener.task_removed(&task.id);
        debug!(
            task_id = %task.id,
            description = %task.description,
            reason = %reason,
            "Cancelled deferred task"
        );

        self.inner.notifier.canceled(&CanceledNotice {
            effect_id: task.effect_id.clone(),
            task_id: task.id.clone(),
            user_comment: task.user_comment.clone(),
            task_group: task.task_group.clone(),
            cancel_reason: reason,
        });
        Some(task)
    }

    /// Cancel every pending task. Returns how many were pending.
    ///
    /// Emits a single bulk-removal signal and no per-task notices.
    pub fn cancel_all_tasks(&self) -> usize {
        let drained = self.store().drain();
        if drained.is_empty() {
            return 0;
        }

        let count = drained.len();
        for stored in drained {
            stored.timer.disarm();
        }

        self.inner.listener.all_tasks_removed(count);
        debug!(count, "Cancelled all deferred tasks");
        count
    }

    /// Pending tasks in `group_name`, oldest first.
    ///
    /// Blank group names match nothing.
    pub fn find_tasks_by_group(&self, group_name: &str) -> Vec<TaskInfo> {
        let group = group_name.trim();
        if group.is_empty() {
            return Vec::new();
        }
        let now = self.inner.clock.now_ms();
        self.store()
            .find_by_group(group)
            .into_iter()
            .map(|stored| stored.task.info(now))
            .collect()
    }

    /// Snapshot of every pending task, earliest scheduled time first.
    ///
    /// Ties keep creation order.
    pub fn get_tasks(&self) -> Vec<TaskInfo> {
        let now = self.inner.clock.now_ms();
        let mut tasks: Vec<TaskInfo> = self
            .store()
            .ordered()
            .into_iter()
            .map(|stored| stored.task.info(now))
            .collect();
        tasks.sort_by_key(|task| task.scheduled_time);
        tasks
    }

    /// Snapshot of one pending task.
    pub fn get_task(&self, task_id: &TaskId) -> Option<TaskInfo> {
        let now = self.inner.clock.now_ms();
        self.store().get(task_id).map(|stored| stored.task.info(now))
    }

    pub fn task_count(&self) -> usize {
        self.store().len()
    }

    /// Disarm every timer and forget every task without notifying anyone.
    ///
    /// Intended for shutdown, when downstream consumers are gone.
    pub fn cleanup(&self) {
        let drained = self.store().drain();
        debug!(count = drained.len(), "Cleaning up deferred tasks");
        for stored in drained {
            stored.timer.disarm();
        }
    }
}

/// Run task work, logging (never propagating) errors and panics.
pub(crate) async fn run_isolated(task_id: TaskId, work: Box<dyn Executable>) {
    match AssertUnwindSafe(work.run()).catch_unwind().await {
        Ok(Ok(())) => debug!(task_id = %task_id, "Deferred task work completed"),
        Ok(Err(err)) => error!(task_id = %task_id, error = %err, "Error executing deferred task"),
        Err(panic) => error!(
            task_id = %task_id,
            panic = %panic_message(panic.as_ref()),
            "Deferred task work panicked"
        ),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::work;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_work(counter: &Arc<AtomicU32>) -> Box<dyn Executable> {
        let counter = counter.clone();
        work(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_then_timer_runs_once() {
        let manager = DeferredTaskManager::new();
        let runs = Arc::new(AtomicU32::new(0));
        let id = manager.schedule(ScheduleTask::new(5.0), counting_work(&runs));

        assert!(manager.execute_task(&id));
        assert!(!manager.execute_task(&id));

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(manager.task_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_work_is_isolated() {
        let manager = DeferredTaskManager::new();
        let id = manager.schedule(
            ScheduleTask::new(0.0),
            work(|| async { panic!("boom") }),
        );
        assert!(manager.execute_task(&id));
        settle().await;

        // Engine keeps working after the panic.
        let runs = Arc::new(AtomicU32::new(0));
        manager.schedule(ScheduleTask::new(0.0), counting_work(&runs));
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_reclaim_returns_work() {
        let manager = DeferredTaskManager::new();
        let runs = Arc::new(AtomicU32::new(0));
        let id = manager.schedule(ScheduleTask::new(30.0), counting_work(&runs));

        let reclaimed = manager
            .cancel_and_reclaim(&id, CancelReason::Conflict)
            .expect("task should be pending");
        assert_eq!(manager.task_count(), 0);
        assert!(manager.cancel_and_reclaim(&id, CancelReason::Conflict).is_none());

        run_isolated(id, reclaimed).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_engine_disarms_timers() {
        let runs = Arc::new(AtomicU32::new(0));
        {
            let manager = DeferredTaskManager::new();
            manager.schedule(ScheduleTask::new(1.0), counting_work(&runs));
        }
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
