//! The synchronization service loop and its client handle.

use crate::domain::{Note, NoteId, iso_now};
use crate::store::Database;
use crate::sync::reconcile::{ReconcileReport, reconcile};
use crate::sync::{SyncError, SyncEvent, SyncOptions, TombstoneSet, WorkingSet};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Smallest accepted reconciliation interval.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// State shared between the service loop and reconciliation tasks.
struct Shared {
    db: Mutex<Database>,
    tombstones: TombstoneSet,
    working_set: WorkingSet,
    passes: AtomicU64,
}

enum Command {
    Load(oneshot::Sender<Result<Vec<Note>, SyncError>>),
    Save(Vec<Note>),
    SaveSync(Note, oneshot::Sender<Result<(), SyncError>>),
    Delete(NoteId),
    Reconcile(oneshot::Sender<Result<ReconcileReport, SyncError>>),
    Shutdown(oneshot::Sender<Result<ReconcileReport, SyncError>>),
}

/// Orchestrates the note store, tombstones and the periodic reconciliation pass.
///
/// Requests are processed one at a time in submission order. Database work
/// runs on the blocking pool behind a single lock. The reconciliation pass
/// runs on its own task so requests keep flowing while it works; a tick that
/// fires while a pass is still running is skipped.
pub struct SyncService {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<SyncEvent>,
    pass: Arc<tokio::sync::Mutex<()>>,
    interval: Duration,
}

impl SyncService {
    /// Loads the tombstone set and spawns the service on the current tokio runtime.
    ///
    /// A failure to load tombstones aborts startup: without them deleted
    /// notes could come back.
    pub fn start(db: Database, options: SyncOptions) -> Result<SyncHandle, SyncError> {
        let (service, handle) = Self::new(db, options)?;
        tokio::spawn(service.run());
        Ok(handle)
    }

    fn new(db: Database, options: SyncOptions) -> Result<(Self, SyncHandle), SyncError> {
        let tombstones = TombstoneSet::new(db.load_tombstones()?);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(options.event_capacity.max(1));

        let interval = options.reconcile_interval.max(MIN_INTERVAL);
        info!(
            interval_ms = interval.as_millis() as u64,
            tombstones = tombstones.len(),
            "starting sync service"
        );

        let service = SyncService {
            shared: Arc::new(Shared {
                db: Mutex::new(db),
                tombstones,
                working_set: WorkingSet::default(),
                passes: AtomicU64::new(0),
            }),
            commands: command_rx,
            events: event_tx.clone(),
            pass: Arc::new(tokio::sync::Mutex::new(())),
            interval,
        };
        let handle = SyncHandle {
            commands: command_tx,
            events: event_tx,
        };
        Ok((service, handle))
    }

    async fn run(mut self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.handle(command).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        debug!("all sync handles dropped");
                        break;
                    }
                },
                _ = ticker.tick() => self.spawn_reconcile(),
            }
        }

        info!("sync service stopped");
    }

    async fn handle(&self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Load(reply) => {
                let _ = reply.send(self.load().await);
            }
            Command::Save(notes) => self.save(notes).await,
            Command::SaveSync(note, reply) => {
                let _ = reply.send(self.save_sync(note).await);
            }
            Command::Delete(id) => self.delete(id).await,
            Command::Reconcile(reply) => {
                let _ = reply.send(self.reconcile_blocking().await);
            }
            Command::Shutdown(reply) => {
                let _ = reply.send(self.reconcile_blocking().await);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    // ===========================================
    // Request Handlers
    // ===========================================

    async fn load(&self) -> Result<Vec<Note>, SyncError> {
        let notes = with_db(&self.shared, |db, shared| {
            let mut notes = db.read_all()?;
            notes.retain(|note| !shared.tombstones.contains(note.id()));
            Ok(notes)
        })
        .await;

        match &notes {
            Ok(notes) => debug!(count = notes.len(), "loaded notes"),
            Err(e) => error!(error = %e, "failed to load notes"),
        }
        notes
    }

    async fn save(&self, notes: Vec<Note>) {
        let notes: Vec<Note> = notes
            .into_iter()
            .filter(|note| {
                let deleted = self.shared.tombstones.contains(note.id());
                if deleted {
                    debug!(id = %note.id(), "ignoring save for deleted note");
                }
                !deleted
            })
            .collect();
        if notes.is_empty() {
            return;
        }

        self.shared.working_set.stage(&notes);
        let count = notes.len();
        let result = with_db(&self.shared, move |db, _| Ok(db.upsert_notes(&notes)?)).await;

        match result {
            Ok(report) if report.is_complete() => debug!(count, "saved notes"),
            Ok(report) => warn!(
                written = report.written,
                failed = report.failed.len(),
                "some notes failed to save"
            ),
            Err(e) => error!(error = %e, count, "failed to save notes"),
        }
    }

    async fn save_sync(&self, note: Note) -> Result<(), SyncError> {
        if self.shared.tombstones.contains(note.id()) {
            warn!(id = %note.id(), "rejecting save for deleted note");
            return Err(SyncError::Deleted(note.id().clone()));
        }

        self.shared.working_set.stage([&note]);
        let id = note.id().clone();
        let result = with_db(&self.shared, move |db, _| Ok(db.upsert_note(&note)?)).await;

        match &result {
            Ok(()) => debug!(%id, "saved note"),
            Err(e) => error!(%id, error = %e, "failed to save note"),
        }
        result
    }

    async fn delete(&self, id: NoteId) {
        let deleted_at = iso_now();
        let target = id.clone();
        let result = with_db(&self.shared, move |db, shared| {
            let existed = db.delete_with_tombstone(&target, &deleted_at)?;
            // Durable rows have committed; memory follows while the lock is held
            shared.tombstones.insert(target.clone());
            shared.working_set.remove(&target);
            Ok(existed)
        })
        .await;

        match result {
            Ok(existed) => {
                info!(%id, existed, "deleted note");
                // No subscribers is fine
                let _ = self.events.send(SyncEvent::NoteDeleted(id));
            }
            Err(e) => error!(%id, error = %e, "failed to delete note, it stays live"),
        }
    }

    // ===========================================
    // Reconciliation
    // ===========================================

    /// Runs a pass now, waiting for any pass already in flight.
    async fn reconcile_blocking(&self) -> Result<ReconcileReport, SyncError> {
        let _guard = self.pass.lock().await;
        let result = run_pass(&self.shared).await;
        if let Err(e) = &result {
            error!(error = %e, "reconciliation pass failed");
        }
        result
    }

    /// Starts a timer-driven pass unless one is already running.
    fn spawn_reconcile(&self) {
        let Ok(guard) = Arc::clone(&self.pass).try_lock_owned() else {
            debug!("previous reconciliation pass still running, skipping tick");
            return;
        };
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            match run_pass(&shared).await {
                Ok(report) => debug!(?report, "reconciliation pass finished"),
                Err(e) => error!(error = %e, "reconciliation pass failed"),
            }
            drop(guard);
        });
    }
}

async fn run_pass(shared: &Arc<Shared>) -> Result<ReconcileReport, SyncError> {
    with_db(shared, |db, shared| {
        let pass = shared.passes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(pass, "starting reconciliation pass");
        Ok(reconcile(db, &shared.working_set, &shared.tombstones)?)
    })
    .await
}

/// Runs `f` on the blocking pool with exclusive access to the database.
async fn with_db<T, F>(shared: &Arc<Shared>, f: F) -> Result<T, SyncError>
where
    T: Send + 'static,
    F: FnOnce(&mut Database, &Shared) -> Result<T, SyncError> + Send + 'static,
{
    let shared = Arc::clone(shared);
    tokio::task::spawn_blocking(move || {
        let mut db = shared
            .db
            .lock()
            .map_err(|_| SyncError::Worker("database lock poisoned".to_string()))?;
        f(&mut *db, shared.as_ref())
    })
    .await
    .map_err(|e| SyncError::Worker(e.to_string()))?
}

/// Cloneable client for a running [`SyncService`].
///
/// Fire-and-forget methods return immediately; their failures are logged by
/// the service. Request/response methods resolve once the service has
/// finished the work.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncHandle {
    /// Returns every stored note except deleted ones.
    pub async fn load_notes(&self) -> Result<Vec<Note>, SyncError> {
        self.request(Command::Load).await?
    }

    /// Queues a batch save without waiting for it to be durable.
    pub fn save_notes(&self, notes: Vec<Note>) {
        self.send(Command::Save(notes));
    }

    /// Queues a single-note save without waiting for it to be durable.
    pub fn save_note(&self, note: Note) {
        self.send(Command::Save(vec![note]));
    }

    /// Saves one note and resolves once it is durable.
    ///
    /// Fails with [`SyncError::Deleted`] if the note has been deleted.
    pub async fn save_note_sync(&self, note: Note) -> Result<(), SyncError> {
        self.request(|reply| Command::SaveSync(note, reply)).await?
    }

    /// Queues a deletion. A [`SyncEvent::NoteDeleted`] follows once both the
    /// row delete and the tombstone write have committed.
    pub fn delete_note(&self, id: NoteId) {
        self.send(Command::Delete(id));
    }

    /// Runs a reconciliation pass now and returns what it did.
    pub async fn reconcile_now(&self) -> Result<ReconcileReport, SyncError> {
        self.request(Command::Reconcile).await?
    }

    /// Subscribes to deletion notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Flushes with a final reconciliation pass, then stops the service.
    pub async fn shutdown(&self) -> Result<ReconcileReport, SyncError> {
        self.request(Command::Shutdown).await?
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("sync service is not running, dropping request");
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .map_err(|_| SyncError::Closed)?;
        reply_rx.await.map_err(|_| SyncError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn passes(shared: &Shared) -> u64 {
        shared.passes.load(Ordering::Relaxed)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_a_running_pass_are_skipped_not_queued() {
        let options = SyncOptions {
            reconcile_interval: Duration::from_secs(1),
            ..SyncOptions::default()
        };
        let (service, handle) =
            SyncService::new(Database::open_in_memory().unwrap(), options).unwrap();
        let shared = Arc::clone(&service.shared);
        let pass = Arc::clone(&service.pass);

        // Stand in for a pass that outlives two ticks
        let running = pass.lock().await;
        tokio::spawn(service.run());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(passes(&shared), 0);

        drop(running);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(passes(&shared), 0, "skipped ticks must not run later");

        handle.reconcile_now().await.unwrap();
        assert_eq!(passes(&shared), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.reconcile_now().await.unwrap();
        assert_eq!(passes(&shared), 3, "the next tick runs normally");

        handle.shutdown().await.unwrap();
    }
}
