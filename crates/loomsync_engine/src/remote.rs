//! Remote store abstraction and the in-memory test remote.

use crate::error::{RemoteError, RemoteResult};
use loomsync_core::boundary::{self, RemoteRow};
use loomsync_core::{Record, RecordId, Settings};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// A change event pushed by the remote store after subscription.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    /// A row was inserted.
    Insert(RemoteRow),
    /// A row was updated.
    Update(RemoteRow),
    /// A row was deleted; only the id is delivered.
    Delete(RecordId),
}

/// Result of polling a [`Subscription`].
#[derive(Debug)]
pub enum Pulled {
    /// An event was delivered.
    Event(RemoteEvent),
    /// No event is pending right now.
    Empty,
    /// The remote closed the feed; the subscription is dead.
    Closed,
}

/// A live realtime subscription.
///
/// Events arrive over a channel and are polled non-blocking with
/// [`Subscription::pull`]. Dropping the subscription unsubscribes - the
/// remote prunes the dead channel on its next emit.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<RemoteEvent>,
}

impl Subscription {
    /// Creates a subscription over a channel receiver.
    #[must_use]
    pub fn new(receiver: Receiver<RemoteEvent>) -> Self {
        Self { receiver }
    }

    /// Polls for the next event without blocking.
    pub fn pull(&self) -> Pulled {
        match self.receiver.try_recv() {
            Ok(event) => Pulled::Event(event),
            Err(TryRecvError::Empty) => Pulled::Empty,
            Err(TryRecvError::Disconnected) => Pulled::Closed,
        }
    }
}

/// The remote system of record, as consumed by the engine.
///
/// Implementations translate these calls to whatever wire protocol the
/// backing store speaks. All mutating calls must be idempotent: an
/// upsert of an already-present row and a delete of an absent row both
/// succeed, because the engine may re-apply an operation whose first
/// confirmation was lost.
pub trait RemoteStore: Send + Sync {
    /// Fetches the settings singleton row, if the remote has one.
    fn fetch_settings(&self) -> RemoteResult<Option<RemoteRow>>;

    /// Creates or replaces the settings singleton.
    fn upsert_settings(&self, settings: &Settings) -> RemoteResult<()>;

    /// Fetches the complete record set.
    fn fetch_all_records(&self) -> RemoteResult<Vec<RemoteRow>>;

    /// Creates or replaces one record.
    fn upsert_record(&self, record: &Record) -> RemoteResult<()>;

    /// Deletes one record. Deleting an absent record succeeds.
    fn delete_record(&self, id: RecordId) -> RemoteResult<()>;

    /// Deletes every record.
    fn delete_all_records(&self) -> RemoteResult<()>;

    /// Opens a realtime subscription delivering one event per remote
    /// mutation, including echoes of this device's own writes.
    fn subscribe(&self) -> RemoteResult<Subscription>;
}

/// An in-memory remote store for tests.
///
/// Holds rows the way a real backend would - loosely typed - and offers
/// failure injection so tests can script offline windows, transport
/// drops, and rejections.
///
/// # Example
///
/// ```rust
/// use loomsync_engine::{InMemoryRemote, RemoteStore};
///
/// let remote = InMemoryRemote::new();
/// remote.set_online(false);
/// assert!(remote.fetch_all_records().is_err());
/// ```
pub struct InMemoryRemote {
    records: RwLock<BTreeMap<RecordId, RemoteRow>>,
    settings: RwLock<Option<RemoteRow>>,
    online: AtomicBool,
    reject_next: Mutex<Option<String>>,
    transport_failures: Mutex<u32>,
    subscribers: Mutex<Vec<Sender<RemoteEvent>>>,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemote {
    /// Creates an empty, online remote.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            settings: RwLock::new(None),
            online: AtomicBool::new(true),
            reject_next: Mutex::new(None),
            transport_failures: Mutex::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Sets the simulated link state. While offline every call returns a
    /// transport error and all live subscriptions are closed.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        if !online {
            self.subscribers.lock().clear();
        }
    }

    /// Makes the next record mutation fail with a non-retryable
    /// rejection.
    pub fn reject_next(&self, message: impl Into<String>) {
        *self.reject_next.lock() = Some(message.into());
    }

    /// Makes the next `n` record mutations fail with a retryable
    /// transport error while the link otherwise stays up.
    pub fn fail_transport(&self, n: u32) {
        *self.transport_failures.lock() = n;
    }

    /// Seeds a record directly, as if another device had uploaded it.
    pub fn seed_record(&self, record: &Record) {
        self.records
            .write()
            .insert(record.id, boundary::record_to_row(record));
    }

    /// Seeds the settings row directly.
    pub fn seed_settings(&self, settings: &Settings) {
        *self.settings.write() = Some(boundary::settings_to_row(settings));
    }

    /// Returns the stored record with the given id, typed.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.records
            .read()
            .get(&id)
            .and_then(|row| boundary::record_from_row(row).ok())
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    /// Returns the stored settings, typed, if present.
    #[must_use]
    pub fn settings(&self) -> Option<Settings> {
        self.settings
            .read()
            .as_ref()
            .and_then(|row| boundary::settings_from_row(row).ok())
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Emits an event to all subscribers, simulating a mutation made by
    /// another device.
    pub fn push_event(&self, event: RemoteEvent) {
        // Keep the row store consistent with what the event claims.
        match &event {
            RemoteEvent::Insert(row) | RemoteEvent::Update(row) => {
                if let Ok(id) = boundary::id_from_row(row) {
                    self.records.write().insert(id, row.clone());
                }
            }
            RemoteEvent::Delete(id) => {
                self.records.write().remove(id);
            }
        }
        self.emit(event);
    }

    fn emit(&self, event: RemoteEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn check_link(&self) -> RemoteResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("remote unreachable"));
        }
        Ok(())
    }

    fn check_injected(&self) -> RemoteResult<()> {
        if let Some(message) = self.reject_next.lock().take() {
            return Err(RemoteError::rejected(message));
        }
        let mut failures = self.transport_failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(RemoteError::transport("injected transport failure"));
        }
        Ok(())
    }
}

impl RemoteStore for InMemoryRemote {
    fn fetch_settings(&self) -> RemoteResult<Option<RemoteRow>> {
        self.check_link()?;
        Ok(self.settings.read().clone())
    }

    fn upsert_settings(&self, settings: &Settings) -> RemoteResult<()> {
        self.check_link()?;
        *self.settings.write() = Some(boundary::settings_to_row(settings));
        Ok(())
    }

    fn fetch_all_records(&self) -> RemoteResult<Vec<RemoteRow>> {
        self.check_link()?;
        Ok(self.records.read().values().cloned().collect())
    }

    fn upsert_record(&self, record: &Record) -> RemoteResult<()> {
        self.check_link()?;
        self.check_injected()?;

        let row = boundary::record_to_row(record);
        let existed = self
            .records
            .write()
            .insert(record.id, row.clone())
            .is_some();

        self.emit(if existed {
            RemoteEvent::Update(row)
        } else {
            RemoteEvent::Insert(row)
        });
        Ok(())
    }

    fn delete_record(&self, id: RecordId) -> RemoteResult<()> {
        self.check_link()?;
        self.check_injected()?;

        if self.records.write().remove(&id).is_some() {
            self.emit(RemoteEvent::Delete(id));
        }
        Ok(())
    }

    fn delete_all_records(&self) -> RemoteResult<()> {
        self.check_link()?;
        self.check_injected()?;
        self.records.write().clear();
        Ok(())
    }

    fn subscribe(&self) -> RemoteResult<Subscription> {
        self.check_link()?;
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        Ok(Subscription::new(rx))
    }
}
