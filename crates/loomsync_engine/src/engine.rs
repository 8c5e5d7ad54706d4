//! The engine facade: state container and mutation router.

use crate::config::EngineConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::queue::{PendingOp, PendingQueue};
use crate::remote::RemoteStore;
use crate::scheduler::DrainScheduler;
use loomsync_core::{Record, RecordDraft, RecordId, Settings, SettingsPatch};
use loomsync_store::{keys, CacheBackend, LocalCache};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Counters describing what the engine has done this session.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Initial merges completed (one per successful connect).
    pub merges_completed: u64,
    /// Pending operations confirmed by the remote store.
    pub operations_drained: u64,
    /// Pending operations dropped after a non-retryable rejection.
    pub operations_dropped: u64,
    /// Realtime events applied to local state.
    pub events_applied: u64,
    /// Realtime events ignored because of a pending local operation.
    pub events_suppressed: u64,
    /// Most recent error message, if any.
    pub last_error: Option<String>,
}

/// The offline-first synchronization engine.
///
/// `SyncEngine` is the single state container of the application: it
/// owns the in-memory working set (records + settings), the pending
/// operation queue, the local cache, and the remote connection. All
/// mutation goes through its router methods - there are no ambient
/// singletons.
///
/// Local mutations never fail: they apply to memory and cache
/// immediately and propagate to the remote store when a connection
/// exists, queueing otherwise. Remote failures surface asynchronously
/// through [`SyncEngine::pending_count`] and [`SyncEngine::stats`].
///
/// # Example
///
/// ```rust
/// use loomsync_engine::{EngineConfig, InMemoryRemote, SyncEngine};
/// use loomsync_store::{InMemoryBackend, LocalCache};
///
/// let engine = SyncEngine::open(
///     EngineConfig::default(),
///     InMemoryRemote::new(),
///     LocalCache::new(InMemoryBackend::new()),
/// );
/// assert!(engine.records().is_empty());
/// ```
pub struct SyncEngine<R: RemoteStore, B: CacheBackend> {
    pub(crate) weak: Weak<Self>,
    pub(crate) remote: R,
    pub(crate) cache: LocalCache<B>,
    pub(crate) config: EngineConfig,
    pub(crate) records: RwLock<BTreeMap<RecordId, Record>>,
    pub(crate) settings: RwLock<Settings>,
    pub(crate) queue: Mutex<PendingQueue>,
    pub(crate) connection: ConnectionManager,
    pub(crate) draining: AtomicBool,
    pub(crate) stats: RwLock<EngineStats>,
    pub(crate) scheduler: Mutex<Option<DrainScheduler>>,
}

impl<R, B> SyncEngine<R, B>
where
    R: RemoteStore + 'static,
    B: CacheBackend + 'static,
{
    /// Opens the engine, reconstructing all state from the cache.
    ///
    /// A missing or damaged cache yields first-run state; opening never
    /// fails.
    pub fn open(config: EngineConfig, remote: R, cache: LocalCache<B>) -> Arc<Self> {
        let records: Vec<Record> = cache.load(keys::RECORDS, Vec::new());
        let settings: Settings = cache.load(keys::SETTINGS, Settings::default());
        let pending: Vec<PendingOp> = cache.load(keys::PENDING, Vec::new());

        info!(
            records = records.len(),
            pending = pending.len(),
            "engine state loaded from cache"
        );

        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            remote,
            cache,
            config,
            records: RwLock::new(records.into_iter().map(|r| (r.id, r)).collect()),
            settings: RwLock::new(settings),
            queue: Mutex::new(PendingQueue::from_ops(pending)),
            connection: ConnectionManager::new(),
            draining: AtomicBool::new(false),
            stats: RwLock::new(EngineStats::default()),
            scheduler: Mutex::new(None),
        })
    }

    // --- read surface ---

    /// Returns all records, ordered by id.
    pub fn records(&self) -> Vec<Record> {
        self.records.read().values().cloned().collect()
    }

    /// Returns the record with the given id, if present.
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.records.read().get(&id).cloned()
    }

    /// Returns the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Returns the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns the number of unconfirmed pending operations.
    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns a snapshot of the queued operations, front first.
    pub fn pending_ops(&self) -> Vec<PendingOp> {
        self.queue.lock().ops()
    }

    /// Returns the session statistics.
    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    /// Returns the remote store handle.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    // --- mutation router ---

    /// Creates a record with a fresh id and schedules its upload.
    pub fn add_record(&self, draft: RecordDraft) -> Record {
        let record = Record::from_draft(RecordId::new(), draft);
        debug!(id = %record.id, machine = %record.machine_no, "record added");

        self.records.write().insert(record.id, record.clone());
        self.persist_records();
        self.submit(PendingOp::Add(record.clone()));
        record
    }

    /// Replaces the record with the same id and schedules its upload.
    pub fn update_record(&self, record: Record) {
        debug!(id = %record.id, "record updated");

        self.records.write().insert(record.id, record.clone());
        self.persist_records();
        self.submit(PendingOp::Update(record));
    }

    /// Removes the record and schedules the remote delete.
    pub fn delete_record(&self, id: RecordId) {
        debug!(id = %id, "record deleted");

        self.records.write().remove(&id);
        self.persist_records();
        self.submit(PendingOp::Delete(id));
    }

    /// Merges a partial update into the settings singleton.
    ///
    /// Settings are persisted locally and, when connected, upserted
    /// directly to the remote store - they are never queued while
    /// offline; the next initial merge propagates them instead. A change
    /// to the remote endpoint or credential tears the connection down
    /// and, when the new values are complete, re-establishes it.
    pub fn update_settings(&self, patch: SettingsPatch) {
        let remote_config_changed = patch.changes_remote_config();
        let updated = {
            let mut settings = self.settings.write();
            *settings = settings.merged(patch);
            settings.clone()
        };
        self.cache.save(keys::SETTINGS, &updated);

        if remote_config_changed {
            self.disconnect();
            if updated.has_remote_config() {
                if let Err(e) = self.connect() {
                    debug!(error = %e, "reconnect after settings change failed");
                }
            }
            return;
        }

        if self.connection.state().is_connected() {
            match self.remote.upsert_settings(&updated) {
                Ok(()) => {}
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "settings upsert lost the connection");
                    self.stats.write().last_error = Some(e.to_string());
                    self.connection.transport_lost();
                }
                Err(e) => {
                    warn!(error = %e, "remote rejected settings upsert");
                    self.stats.write().last_error = Some(e.to_string());
                }
            }
        }
    }

    /// Erases all records and the pending queue, resets settings to
    /// defaults, and - when connected - issues a best-effort remote bulk
    /// delete. Destructive, non-queued: a wipe is never replayed after
    /// the fact.
    pub fn delete_all_data(&self) {
        if self.connection.state().is_connected() {
            if let Err(e) = self.remote.delete_all_records() {
                warn!(error = %e, "remote bulk delete failed, local erase continues");
                self.stats.write().last_error = Some(e.to_string());
            }
        }

        self.records.write().clear();
        self.persist_records();

        self.queue.lock().clear();
        self.persist_queue();

        let defaults = Settings::default();
        *self.settings.write() = defaults.clone();
        self.cache.save(keys::SETTINGS, &defaults);

        info!("all local data erased");
        self.disconnect();
    }

    // --- internals shared with the reconciler ---

    /// Queues an operation (superseding any older one for the same id)
    /// and, when connected, propagates immediately.
    fn submit(&self, op: PendingOp) {
        self.queue.lock().enqueue(op);
        self.persist_queue();

        if self.connection.state().is_connected() {
            self.drain();
        }
    }

    pub(crate) fn persist_records(&self) {
        let snapshot: Vec<Record> = self.records.read().values().cloned().collect();
        self.cache.save(keys::RECORDS, &snapshot);
    }

    pub(crate) fn persist_queue(&self) {
        let snapshot = self.queue.lock().ops();
        self.cache.save(keys::PENDING, &snapshot);
    }
}
