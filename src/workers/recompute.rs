//! Background recompute of program-level progress summaries.
//!
//! Module completion dispatches a job here instead of awaiting the recompute
//! inline, so the module-completion response never blocks on (or fails with)
//! the summary write. Failed jobs are logged and dropped, not retried; the
//! next completion for the same (user, program) re-enqueues a full recount.

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::services::ProgressService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeJob {
    pub user_id: Uuid,
    pub program_id: Uuid,
}

/// Singleton queue feeding a single worker task. The worker is spawned on the
/// runtime that first enqueues, and respawned if that runtime has shut down,
/// so enqueue must always be called from inside a Tokio runtime.
pub struct RecomputeQueue {
    tx: std::sync::Mutex<mpsc::UnboundedSender<RecomputeJob>>,
}

impl RecomputeQueue {
    pub fn instance() -> &'static RecomputeQueue {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<RecomputeQueue> = OnceLock::new();
        INSTANCE.get_or_init(RecomputeQueue::start)
    }

    fn start() -> Self {
        Self { tx: std::sync::Mutex::new(Self::spawn_worker()) }
    }

    fn spawn_worker() -> mpsc::UnboundedSender<RecomputeJob> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(rx));
        tx
    }

    /// Queue a program progress recompute. Never blocks and never fails the
    /// caller; a closed worker only logs.
    pub fn enqueue(&self, user_id: Uuid, program_id: Uuid) {
        let job = RecomputeJob { user_id, program_id };
        let mut tx = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if tx.is_closed() {
            *tx = Self::spawn_worker();
        }
        if tx.send(job).is_err() {
            warn!(user_id = %user_id, program_id = %program_id,
                  "recompute worker is gone; dropping job");
            return;
        }
        debug!(user_id = %user_id, program_id = %program_id,
               "queued program progress recompute");
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<RecomputeJob>) {
        while let Some(job) = rx.recv().await {
            Self::process(job).await;
        }
    }

    async fn process(job: RecomputeJob) {
        let pool = match DatabaseManager::pool().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(user_id = %job.user_id, program_id = %job.program_id,
                      "program progress recompute skipped, no database: {}", e);
                return;
            }
        };

        let service = ProgressService::new(pool);
        match service.calculate_program_progress(job.user_id, job.program_id).await {
            Ok(result) => {
                debug!(user_id = %job.user_id, program_id = %job.program_id,
                       percentage = result.completion_percentage,
                       completed = result.is_completed,
                       "program progress recomputed");
            }
            Err(e) => {
                warn!(user_id = %job.user_id, program_id = %job.program_id,
                      "program progress recompute failed: {}", e);
            }
        }
    }
}
