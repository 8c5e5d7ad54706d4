//! Reconciliation: initial merge, queue drain, realtime application.

use crate::connection::PumpOutcome;
use crate::engine::SyncEngine;
use crate::error::{EngineError, EngineResult};
use crate::queue::PendingOp;
use crate::remote::{RemoteEvent, RemoteStore, Subscription};
use crate::scheduler::DrainScheduler;
use loomsync_core::boundary::{self, RemoteRow};
use loomsync_store::{keys, CacheBackend};
use std::sync::atomic::Ordering;
use tracing::{debug, error, info, warn};

/// Outcome of a drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The queue drained to empty.
    Drained {
        /// Operations confirmed by the remote store.
        confirmed: usize,
        /// Operations dropped after a non-retryable rejection.
        dropped: usize,
    },
    /// The pass stopped early on a transport failure; the remaining
    /// operations stay queued and the connection is down.
    ConnectionLost {
        /// Operations confirmed before the failure.
        confirmed: usize,
        /// Operations dropped before the failure.
        dropped: usize,
    },
    /// Not connected; nothing was attempted.
    Offline,
    /// Another drain pass is already in progress.
    AlreadyDraining,
}

/// Resets the draining flag even when an apply call panics.
struct DrainGuard<'a>(&'a std::sync::atomic::AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<R, B> SyncEngine<R, B>
where
    R: RemoteStore + 'static,
    B: CacheBackend + 'static,
{
    /// Establishes the remote connection.
    ///
    /// Fetches the remote settings and full record set, opens the
    /// realtime subscription, performs the initial merge, then drains
    /// the queue. One failed attempt lands back in `Disconnected`; there
    /// is no internal retry loop - reconnection is an explicit caller
    /// (or scheduler-independent timer) action.
    ///
    /// Calling while already connected or mid-attempt is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RemoteNotConfigured`] without an attempt
    /// when settings carry no endpoint or credential, or the underlying
    /// remote error when the initial fetch or subscription fails.
    pub fn connect(&self) -> EngineResult<()> {
        if !self.settings.read().has_remote_config() {
            return Err(EngineError::RemoteNotConfigured);
        }
        if !self.connection.begin_attempt() {
            return Ok(());
        }

        match self.establish() {
            Ok(subscription) => {
                self.connection.established(subscription);
                self.stats.write().merges_completed += 1;
                info!("connected to remote store");

                self.start_scheduler();
                self.drain();
                self.pump_events();
                Ok(())
            }
            Err(e) => {
                self.connection.attempt_failed();
                self.stats.write().last_error = Some(e.to_string());
                warn!(error = %e, "connection attempt failed");
                Err(e)
            }
        }
    }

    /// Tears the connection down explicitly.
    ///
    /// The subscription is released before any later connect attempt, so
    /// a credential change can never double-deliver events.
    pub fn disconnect(&self) {
        self.stop_scheduler();
        self.connection.teardown();
        debug!("connection torn down");
    }

    fn establish(&self) -> EngineResult<Subscription> {
        let settings_row = self.remote.fetch_settings()?;
        let record_rows = self.remote.fetch_all_records()?;
        let subscription = self.remote.subscribe()?;

        self.merge_remote(settings_row, record_rows);
        Ok(subscription)
    }

    /// Merges remote state into the working set, remote-wins per id.
    ///
    /// Local-only records are retained - their pending operations are
    /// already queued, the merge never invents new queue entries. The
    /// settings singleton takes the remote copy wholesale when one
    /// exists; otherwise the local copy seeds the remote.
    fn merge_remote(&self, settings_row: Option<RemoteRow>, record_rows: Vec<RemoteRow>) {
        match settings_row {
            Some(row) => match boundary::settings_from_row(&row) {
                Ok(remote_settings) => {
                    *self.settings.write() = remote_settings.clone();
                    self.cache.save(keys::SETTINGS, &remote_settings);
                }
                Err(e) => warn!(error = %e, "ignoring malformed remote settings row"),
            },
            None => {
                let local = self.settings.read().clone();
                if let Err(e) = self.remote.upsert_settings(&local) {
                    warn!(error = %e, "failed to seed remote settings");
                }
            }
        }

        let mut merged = 0usize;
        {
            let mut records = self.records.write();
            for row in &record_rows {
                match boundary::record_from_row(row) {
                    Ok(record) => {
                        records.insert(record.id, record);
                        merged += 1;
                    }
                    Err(e) => warn!(error = %e, "skipping malformed remote record row"),
                }
            }
        }
        self.persist_records();

        info!(
            remote_records = merged,
            working_set = self.records.read().len(),
            "initial merge complete"
        );
    }

    /// Drains the pending queue against the remote store.
    ///
    /// Operations are submitted front-to-back. A confirmed operation is
    /// removed; a retryable failure stops the pass and drops the
    /// connection; a non-retryable rejection drops only the offending
    /// operation and continues. At most one pass runs at a time -
    /// mutations keep queueing freely while a pass is in flight.
    pub fn drain(&self) -> DrainOutcome {
        if !self.connection.state().is_connected() {
            return DrainOutcome::Offline;
        }
        if self.draining.swap(true, Ordering::SeqCst) {
            return DrainOutcome::AlreadyDraining;
        }
        let _guard = DrainGuard(&self.draining);

        let mut confirmed = 0usize;
        let mut dropped = 0usize;

        loop {
            let Some(op) = self.queue.lock().peek() else {
                if confirmed > 0 || dropped > 0 {
                    debug!(confirmed, dropped, "queue drained");
                }
                return DrainOutcome::Drained { confirmed, dropped };
            };

            match self.apply_op(&op) {
                Ok(()) => {
                    // Only confirm if the op was not superseded while in
                    // flight; a newer value stays queued and goes next.
                    if self.queue.lock().remove_front(&op) {
                        confirmed += 1;
                        self.stats.write().operations_drained += 1;
                    }
                    self.persist_queue();
                }
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "drain interrupted by transport failure");
                    self.stats.write().last_error = Some(e.to_string());
                    self.connection.transport_lost();
                    return DrainOutcome::ConnectionLost { confirmed, dropped };
                }
                Err(e) => {
                    error!(
                        op = op.kind(),
                        id = %op.record_id(),
                        error = %e,
                        "pending operation rejected, dropping"
                    );
                    if self.queue.lock().remove_front(&op) {
                        dropped += 1;
                        self.stats.write().operations_dropped += 1;
                    }
                    self.stats.write().last_error = Some(e.to_string());
                    self.persist_queue();
                }
            }
        }
    }

    fn apply_op(&self, op: &PendingOp) -> crate::error::RemoteResult<()> {
        match op {
            PendingOp::Add(record) | PendingOp::Update(record) => {
                self.remote.upsert_record(record)
            }
            PendingOp::Delete(id) => self.remote.delete_record(*id),
        }
    }

    /// Applies pending realtime events to local state.
    ///
    /// Returns the number of events taken off the feed. A closed feed
    /// counts as a transport failure and drops the connection.
    pub fn pump_events(&self) -> usize {
        match self.connection.pump(self.config.pump_batch) {
            PumpOutcome::Live(events) => {
                let taken = events.len();
                for event in events {
                    self.apply_event(event);
                }
                taken
            }
            PumpOutcome::Closed(events) => {
                let taken = events.len();
                for event in events {
                    self.apply_event(event);
                }
                warn!("realtime feed closed by remote");
                self.stats.write().last_error = Some("realtime feed closed".into());
                self.connection.transport_lost();
                taken
            }
            PumpOutcome::NotSubscribed => 0,
        }
    }

    /// Applies one realtime event, honoring the suppression window: an
    /// event for a record id with a queued local operation is ignored so
    /// a stale echo can never overwrite local intent. The window lifts
    /// when the pending operation confirms and leaves the queue.
    fn apply_event(&self, event: RemoteEvent) {
        match event {
            RemoteEvent::Insert(row) | RemoteEvent::Update(row) => {
                match boundary::record_from_row(&row) {
                    Ok(record) => {
                        if self.queue.lock().contains(record.id) {
                            debug!(id = %record.id, "event suppressed by pending local edit");
                            self.stats.write().events_suppressed += 1;
                            return;
                        }
                        self.records.write().insert(record.id, record);
                        self.persist_records();
                        self.stats.write().events_applied += 1;
                    }
                    Err(e) => warn!(error = %e, "ignoring malformed realtime row"),
                }
            }
            RemoteEvent::Delete(id) => {
                if self.queue.lock().contains(id) {
                    debug!(id = %id, "delete event suppressed by pending local edit");
                    self.stats.write().events_suppressed += 1;
                    return;
                }
                if self.records.write().remove(&id).is_some() {
                    self.persist_records();
                }
                self.stats.write().events_applied += 1;
            }
        }
    }

    /// One scheduler step: pump the realtime feed, then drain leftovers.
    pub fn tick(&self) {
        self.pump_events();

        if self.connection.state().is_connected() && !self.queue.lock().is_empty() {
            self.drain();
        }
    }

    fn start_scheduler(&self) {
        let scheduler = DrainScheduler::start(self.weak.clone(), self.config.drain_interval);
        let old = self.scheduler.lock().replace(scheduler);
        // Join the previous scheduler outside the lock.
        drop(old);
    }

    fn stop_scheduler(&self) {
        let old = self.scheduler.lock().take();
        drop(old);
    }
}
