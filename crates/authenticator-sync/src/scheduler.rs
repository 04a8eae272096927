//! # Reconcile Scheduler
//!
//! Runs reconciliation periodically on a background task and hands the
//! resulting operations to the host.
//!
//! ## Tick Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scheduler Tick                                  │
//! │                                                                         │
//! │  interval.tick() ──► remote_snapshot() ──► local_snapshot()            │
//! │                            │                     │                      │
//! │                            └──── error ──────────┴──► emit_error,      │
//! │                                                       skip tick         │
//! │                            ▼                                            │
//! │                  SyncOperationChecker::calculate_operations             │
//! │                            │                                            │
//! │                            ▼                                            │
//! │           only_on_change && same set as last emission? ──► skip        │
//! │                            │                                            │
//! │                            ▼                                            │
//! │           lock gate ─► cancelled? ─► emit_operations ─► unlock          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! Every emitter call happens while holding the emission gate, after
//! checking the cancelled flag. [`SchedulerHandle::cancel`] sets the flag
//! while holding the same gate, so once it returns the emitter is never
//! called again. Called from inside an emitter callback, it only sets the
//! flag: the gate is already held by that thread.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use authenticator_core::operations::same_operation_set;
use authenticator_core::{EntryOperation, LocalEntry, RemoteEntry};
use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::checker::{OperationSummary, SyncOperationChecker};
use crate::config::{SchedulerSettings, SyncConfig};
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Supplies the two snapshots for each tick.
///
/// Implemented by the host on top of its transport and storage.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetches and decrypts the server's entries.
    fn remote_snapshot(&self) -> impl Future<Output = SyncResult<Vec<RemoteEntry>>> + Send;

    /// Reads the local ledger.
    fn local_snapshot(&self) -> impl Future<Output = SyncResult<Vec<LocalEntry>>> + Send;
}

/// Receives the scheduler's results.
pub trait ReconcileEventEmitter: Send + Sync {
    /// Called with the operations of a tick.
    fn emit_operations(&self, operations: &[EntryOperation]);

    /// Called when a tick could not complete.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl ReconcileEventEmitter for NoOpEmitter {
    fn emit_operations(&self, _operations: &[EntryOperation]) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Scheduler Status
// =============================================================================

/// Counters for external queries.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStatus {
    /// Ticks started, including failed and suppressed ones.
    pub ticks: u64,

    /// Calls to `emit_operations`.
    pub emissions: u64,

    /// When operations were last emitted.
    pub last_emission: Option<DateTime<Utc>>,

    /// Error of the most recent failed tick. Cleared by the next emission.
    pub last_error: Option<String>,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Emission gate shared by the task and its handle.
#[derive(Default)]
struct Gate {
    lock: Mutex<()>,
    cancelled: AtomicBool,
    /// Thread currently running an emitter callback.
    emitting: Mutex<Option<ThreadId>>,
}

/// Clears `Gate::emitting` when the callback returns or unwinds.
struct EmittingGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for EmittingGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Gate {
    /// Runs `emit` unless cancelled. Returns whether it ran.
    fn emit(&self, emit: impl FnOnce()) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancelled.load(Ordering::SeqCst) {
            return false;
        }

        *self.emitting.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        let _emitting = EmittingGuard(&self.emitting);
        emit();
        true
    }

    fn cancel(&self) {
        let current = thread::current().id();
        let reentrant =
            *self.emitting.lock().unwrap_or_else(PoisonError::into_inner) == Some(current);

        if reentrant {
            // This thread holds `lock` further up the stack
            self.cancelled.store(true, Ordering::SeqCst);
            return;
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Periodic reconciliation runner.
pub struct ReconcileScheduler<S: SnapshotSource> {
    settings: SchedulerSettings,
    checker: SyncOperationChecker,
    source: Arc<S>,
    emitter: Arc<dyn ReconcileEventEmitter>,
}

impl<S: SnapshotSource> ReconcileScheduler<S> {
    pub fn new(
        settings: SchedulerSettings,
        checker: SyncOperationChecker,
        source: Arc<S>,
        emitter: Arc<dyn ReconcileEventEmitter>,
    ) -> Self {
        ReconcileScheduler {
            settings,
            checker,
            source,
            emitter,
        }
    }

    /// Builds a scheduler and its checker from a loaded config.
    pub fn from_config(
        config: &SyncConfig,
        source: Arc<S>,
        emitter: Arc<dyn ReconcileEventEmitter>,
    ) -> Self {
        Self::new(
            config.scheduler.clone(),
            SyncOperationChecker::new(config.reconcile.clone()),
            source,
            emitter,
        )
    }

    /// Spawns the background task. The first tick runs immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let gate = Arc::new(Gate::default());
        let status = Arc::new(RwLock::new(SchedulerStatus::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            period_ms = self.settings.period_ms,
            only_on_change = self.settings.only_on_change,
            "Starting reconcile scheduler"
        );

        let task = tokio::spawn(self.run(gate.clone(), status.clone(), shutdown_rx));

        SchedulerHandle {
            gate,
            status,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    async fn run(
        self,
        gate: Arc<Gate>,
        status: Arc<RwLock<SchedulerStatus>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(self.settings.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut previous: Option<Vec<EntryOperation>> = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    break;
                }

                _ = interval.tick() => {
                    if gate.is_cancelled() {
                        break;
                    }
                    self.tick(&gate, &status, &mut previous).await;
                }
            }
        }

        info!("Reconcile scheduler stopped");
    }

    async fn tick(
        &self,
        gate: &Gate,
        status: &RwLock<SchedulerStatus>,
        previous: &mut Option<Vec<EntryOperation>>,
    ) {
        status.write().await.ticks += 1;

        let ops = match self.calculate().await {
            Ok(ops) => ops,
            Err(e) => {
                let message = e.to_string();
                let retryable = e.is_retryable();
                warn!(error = %message, retryable, "Reconcile tick failed");

                gate.emit(|| self.emitter.emit_error(&message, retryable));
                status.write().await.last_error = Some(message);
                return;
            }
        };

        if self.settings.only_on_change {
            if let Some(last) = previous.as_deref() {
                if same_operation_set(last, &ops) {
                    trace!(operations = ops.len(), "Operations unchanged, skipping emission");
                    return;
                }
            }
        }

        let summary = OperationSummary::from_ops(&ops);
        if !gate.emit(|| self.emitter.emit_operations(&ops)) {
            debug!("Scheduler cancelled, dropping operations");
            return;
        }

        debug!(total = summary.total(), "Emitted operations");
        {
            let mut s = status.write().await;
            s.emissions += 1;
            s.last_emission = Some(Utc::now());
            s.last_error = None;
        }
        *previous = Some(ops);
    }

    async fn calculate(&self) -> SyncResult<Vec<EntryOperation>> {
        let remote = self.source.remote_snapshot().await?;
        let local = self.source.local_snapshot().await?;
        self.checker.calculate_operations(remote, local)
    }
}

// =============================================================================
// Scheduler Handle (for external control)
// =============================================================================

/// Handle for controlling a running scheduler.
pub struct SchedulerHandle {
    gate: Arc<Gate>,
    status: Arc<RwLock<SchedulerStatus>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SchedulerHandle {
    /// Stops the scheduler. No emitter call happens after this returns.
    ///
    /// Safe to call more than once, and from inside an emitter callback.
    pub fn cancel(&self) {
        self.gate.cancel();
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.is_cancelled()
    }

    /// Gets the current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Cancels and waits for the background task to finish.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.cancel();

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            task.await
                .map_err(|e| SyncError::ChannelError(format!("scheduler task failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================
