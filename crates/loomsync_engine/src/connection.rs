//! Connection lifecycle management.

use crate::remote::{Pulled, RemoteEvent, Subscription};
use parking_lot::{Mutex, RwLock};

/// The current state of the remote connection.
///
/// Owned exclusively by the [`ConnectionManager`]; every other component
/// only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; mutations queue locally.
    Disconnected,
    /// A connection attempt (initial fetch + subscribe) is in progress.
    Reconnecting,
    /// Connected; the queue drains and realtime events flow.
    Connected,
}

impl ConnectionState {
    /// Returns true when the engine may talk to the remote store.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Outcome of pumping the realtime feed.
#[derive(Debug)]
pub(crate) enum PumpOutcome {
    /// Events delivered (possibly zero); the feed stays live.
    Live(Vec<RemoteEvent>),
    /// The feed is closed; the caller must treat this as a transport
    /// error.
    Closed(Vec<RemoteEvent>),
    /// No subscription is held.
    NotSubscribed,
}

/// Owns the connection state machine and the realtime subscription.
///
/// Transitions:
///
/// - `Disconnected → Reconnecting` on a connect attempt
/// - `Reconnecting → Connected` when the initial fetch and the
///   subscription both succeed
/// - `Reconnecting → Disconnected` when either fails; one failed attempt
///   is terminal, re-connection is an explicit caller action
/// - `Connected → Disconnected` on transport error or teardown
///
/// Teardown always releases the previous subscription before a new
/// attempt starts, so a credential change can never double-deliver
/// events.
pub(crate) struct ConnectionManager {
    state: RwLock<ConnectionState>,
    subscription: Mutex<Option<Subscription>>,
}

impl ConnectionManager {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            subscription: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Starts a connect attempt. Returns false when the manager is not
    /// in `Disconnected` (an attempt is running or a connection is up).
    pub(crate) fn begin_attempt(&self) -> bool {
        let mut state = self.state.write();
        if *state != ConnectionState::Disconnected {
            return false;
        }
        *state = ConnectionState::Reconnecting;
        true
    }

    /// Completes a connect attempt successfully.
    pub(crate) fn established(&self, subscription: Subscription) {
        *self.subscription.lock() = Some(subscription);
        *self.state.write() = ConnectionState::Connected;
    }

    /// Fails the in-progress connect attempt.
    pub(crate) fn attempt_failed(&self) {
        *self.subscription.lock() = None;
        *self.state.write() = ConnectionState::Disconnected;
    }

    /// Drops the connection after a transport-level failure.
    pub(crate) fn transport_lost(&self) {
        *self.subscription.lock() = None;
        *self.state.write() = ConnectionState::Disconnected;
    }

    /// Tears the connection down: unsubscribes and goes `Disconnected`.
    pub(crate) fn teardown(&self) {
        *self.subscription.lock() = None;
        *self.state.write() = ConnectionState::Disconnected;
    }

    /// Pulls up to `max` pending realtime events off the subscription.
    pub(crate) fn pump(&self, max: usize) -> PumpOutcome {
        let guard = self.subscription.lock();
        let Some(subscription) = guard.as_ref() else {
            return PumpOutcome::NotSubscribed;
        };

        let mut events = Vec::new();
        while events.len() < max {
            match subscription.pull() {
                Pulled::Event(event) => events.push(event),
                Pulled::Empty => return PumpOutcome::Live(events),
                Pulled::Closed => return PumpOutcome::Closed(events),
            }
        }
        PumpOutcome::Live(events)
    }
}
