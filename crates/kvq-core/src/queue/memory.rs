//! In-memory queue implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{DeliveryState, TaskLease, TaskQueue, TaskRecord};
use crate::domain::{Mutation, MutationTask, TaskId, TaskResult, TaskStatus};
use crate::error::QueueError;
use crate::observability::QueueCounts;
use crate::ports::{IdGenerator, ResultBackend, SystemClock, UlidGenerator};

/// In-memory queue state.
///
/// 注意: lock は await を跨がない（parking_lot::Mutex）
struct QueueState {
    /// All task records (single source of truth for delivery state).
    records: HashMap<TaskId, TaskRecord>,

    /// Ready queue (TaskIds only).
    ready: VecDeque<TaskId>,

    /// Set by `close()`; enqueue is refused afterwards.
    closed: bool,

    /// Finished tasks leave `records`; only their outcomes are counted.
    succeeded: usize,
    failed: usize,
}

impl QueueState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            ready: VecDeque::new(),
            closed: false,
            succeeded: 0,
            failed: 0,
        }
    }

    /// Pop the next runnable task and lease it.
    fn take_ready(&mut self, lease_timeout: Duration) -> Option<(MutationTask, u32)> {
        while let Some(task_id) = self.ready.pop_front() {
            if let Some(record) = self.records.get_mut(&task_id)
                && record.state.is_runnable()
            {
                let delivery = record.start_lease(lease_timeout);
                return Some((record.task.clone(), delivery));
            }
        }
        None
    }

    /// Move expired leases back to the ready queue, oldest task first.
    fn reap_expired(&mut self, now: Instant) -> usize {
        let mut expired: Vec<(Instant, TaskId)> = self
            .records
            .iter()
            .filter(|(_, record)| record.is_expired(now))
            .map(|(task_id, record)| (record.created_at, *task_id))
            .collect();
        expired.sort();

        for (_, task_id) in &expired {
            if let Some(record) = self.records.get_mut(task_id) {
                warn!(task_id = %task_id, deliveries = record.deliveries, "lease expired; requeueing task");
                record.requeue();
                self.ready.push_back(*task_id);
            }
        }
        expired.len()
    }

    fn next_lease_deadline(&self) -> Option<Instant> {
        self.records
            .values()
            .filter(|record| record.state == DeliveryState::Leased)
            .filter_map(|record| record.lease_deadline)
            .min()
    }

    /// Drop the record of a task whose result is stored.
    fn finish(&mut self, task_id: TaskId, counted: Option<TaskStatus>) {
        self.records.remove(&task_id);
        match counted {
            Some(TaskStatus::Success) => self.succeeded += 1,
            Some(TaskStatus::Failed) => self.failed += 1,
            Some(TaskStatus::Pending) | None => {}
        }
    }

    fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts {
            succeeded: self.succeeded,
            failed: self.failed,
            ..QueueCounts::default()
        };
        for record in self.records.values() {
            match record.state {
                DeliveryState::Queued => counts.pending += 1,
                DeliveryState::Leased => counts.running += 1,
            }
        }
        counts
    }
}

/// In-memory queue implementation.
///
/// FIFO for a single producer. Terminal results are written to the
/// injected [`ResultBackend`].
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    results: Arc<dyn ResultBackend>,
    ids: Arc<dyn IdGenerator>,
    lease_timeout: Duration,
}

impl InMemoryQueue {
    pub fn new(results: Arc<dyn ResultBackend>, lease_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::new())),
            notify: Arc::new(Notify::new()),
            results,
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            lease_timeout,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn result_backend(&self) -> Arc<dyn ResultBackend> {
        Arc::clone(&self.results)
    }

    /// Snapshot of a task that is still queued or leased.
    ///
    /// Finished tasks are no longer held here; read their results through
    /// [`InMemoryQueue::result_backend`].
    pub fn task(&self, task_id: TaskId) -> Option<MutationTask> {
        self.state
            .lock()
            .records
            .get(&task_id)
            .map(|record| record.task.clone())
    }

    /// Refuse further enqueues and wake idle workers.
    ///
    /// Tasks already queued are still handed out; `lease()` returns `None`
    /// once nothing is left.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Requeue every expired lease now. `lease()` also does this on its own.
    pub fn reap_expired(&self) -> usize {
        let reaped = self.state.lock().reap_expired(Instant::now());
        if reaped > 0 {
            self.notify.notify_waiters();
        }
        reaped
    }
}

#[async_trait]
impl TaskQueue for InMemoryQueue {
    async fn enqueue(&self, mutation: Mutation) -> Result<TaskId, QueueError> {
        let kind = mutation.kind();
        let key = mutation.key().to_string();
        let task_id = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(QueueError::Unavailable("queue is closed".to_string()));
            }
            let mut task_id = self.ids.generate_task_id();
            while state.records.contains_key(&task_id) {
                task_id = self.ids.generate_task_id();
            }
            let record = TaskRecord::new(MutationTask::new(task_id, mutation));
            state.records.insert(task_id, record);
            state.ready.push_back(task_id);
            task_id
        };

        // Notify waiting workers
        self.notify.notify_one();
        debug!(task_id = %task_id, kind = %kind, key = %key, "task enqueued");
        Ok(task_id)
    }

    async fn lease(&self) -> Option<Box<dyn TaskLease>> {
        loop {
            // 先に waiter として登録しておく（lock 解放〜await の間の通知を取りこぼさない）
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_wake = {
                let mut state = self.state.lock();
                state.reap_expired(Instant::now());

                if let Some((task, delivery)) = state.take_ready(self.lease_timeout) {
                    debug!(task_id = %task.id(), delivery, "task leased");
                    return Some(Box::new(InMemoryLease {
                        task,
                        delivery,
                        state: Arc::clone(&self.state),
                        notify: Arc::clone(&self.notify),
                        results: Arc::clone(&self.results),
                        completed: false,
                    }));
                }

                if state.closed {
                    return None;
                }

                // No ready tasks - wake up when the earliest lease expires
                state.next_lease_deadline()
            };

            match next_wake {
                Some(deadline) => {
                    tokio::select! {
                        _ = &mut notified => {},
                        _ = tokio::time::sleep_until(deadline) => {},
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn counts(&self) -> QueueCounts {
        self.state.lock().counts()
    }
}

/// Lease implementation for InMemoryQueue.
struct InMemoryLease {
    task: MutationTask,
    delivery: u32,
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    results: Arc<dyn ResultBackend>,
    completed: bool,
}

#[async_trait]
impl TaskLease for InMemoryLease {
    fn task(&self) -> &MutationTask {
        &self.task
    }

    fn delivery(&self) -> u32 {
        self.delivery
    }

    async fn complete(mut self: Box<Self>, result: TaskResult) -> Result<(), QueueError> {
        let task_id = self.task.id();

        // 結果の保存が先。失敗したら lease は未完了のまま drop され、task は再配送される
        let first = self.results.put(task_id, result.clone()).await?;
        self.completed = true;
        self.task.finish(&result);
        let status = self.task.status();

        self.state
            .lock()
            .finish(task_id, first.then_some(status));

        if !first {
            debug!(
                task_id = %task_id,
                delivery = self.delivery,
                "task already terminal; keeping first result"
            );
            return Ok(());
        }

        info!(
            task_id = %task_id,
            kind = %self.task.kind(),
            key = %self.task.key(),
            status = ?status,
            message = self.task.result_message(),
            "task finished"
        );
        Ok(())
    }
}

impl Drop for InMemoryLease {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let task_id = self.task.id();
        let requeued = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            match state.records.get_mut(&task_id) {
                Some(record)
                    if record.state == DeliveryState::Leased
                        && record.deliveries == self.delivery =>
                {
                    record.requeue();
                    state.ready.push_back(task_id);
                    true
                }
                _ => false,
            }
        };
        if requeued {
            warn!(task_id = %task_id, delivery = self.delivery, "lease dropped without completion; requeueing task");
            self.notify.notify_one();
        }
    }
}
