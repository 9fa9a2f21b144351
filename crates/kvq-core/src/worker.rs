use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::executor::MutationExecutor;
use crate::queue::TaskQueue;

/// Worker group handle.
/// - 各ワーカーは一度に一つの task を最後まで処理する
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(n: usize, queue: Arc<dyn TaskQueue>, executor: Arc<MutationExecutor>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let ex = Arc::clone(&executor);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, q, ex, &mut rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Request shutdown for all workers.
    /// In-flight tasks run to completion; no new leases are taken.
    pub fn request_shutdown(&self) {
        // receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        self.join().await;
    }

    /// Wait for all workers without signalling them; they exit once the
    /// queue is closed and drained.
    pub async fn join(self) {
        for j in self.joins {
            if let Err(e) = j.await {
                error!(error = %e, "worker task panicked");
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn TaskQueue>,
    executor: Arc<MutationExecutor>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    debug!(worker_id, "worker started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // lease は待つ可能性があるので shutdown と競合させる
        let lease = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // sender dropped: nobody can ask us to stop anymore, so stop now
                    break;
                }
                continue;
            }
            lease = queue.lease() => lease,
        };

        // queue closed and drained
        let Some(lease) = lease else {
            break;
        };

        let result = executor.execute(lease.task()).await;
        let task_id = lease.task().id();
        if let Err(e) = lease.complete(result).await {
            error!(worker_id, task_id = %task_id, error = %e, "failed to record task result; task will be redelivered");
        }
    }
    debug!(worker_id, "worker stopped");
}
