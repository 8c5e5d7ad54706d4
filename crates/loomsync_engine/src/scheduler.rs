//! Periodic fallback drain scheduler.

use crate::engine::SyncEngine;
use crate::remote::RemoteStore;
use loomsync_store::CacheBackend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Runs [`SyncEngine::tick`] on a fixed interval while connected.
///
/// Started when the engine enters `Connected` and dropped when it
/// leaves; the thread also exits on its own once the engine is gone or
/// no longer connected. The scheduler exists to catch apply paths that
/// fail without flipping the connection state - the normal drain runs
/// inline after each mutation and reconnect.
pub(crate) struct DrainScheduler {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DrainScheduler {
    /// Spawns the scheduler thread.
    ///
    /// Holds only a weak engine reference, so the scheduler never keeps
    /// a dropped engine alive.
    pub(crate) fn start<R, B>(engine: Weak<SyncEngine<R, B>>, interval: Duration) -> Self
    where
        R: RemoteStore + 'static,
        B: CacheBackend + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("loomsync-drain".into())
            .spawn(move || run_loop(engine, flag, interval));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn drain scheduler");
                None
            }
        };

        Self { stop, handle }
    }
}

impl Drop for DrainScheduler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            // The last engine reference can die on the scheduler thread
            // itself; a thread must not join itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn run_loop<R, B>(engine: Weak<SyncEngine<R, B>>, stop: Arc<AtomicBool>, interval: Duration)
where
    R: RemoteStore + 'static,
    B: CacheBackend + 'static,
{
    // Sleep in short slices so stop requests are honored promptly.
    const SLICE: Duration = Duration::from_millis(25);

    loop {
        let mut slept = Duration::ZERO;
        while slept < interval {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            let nap = SLICE.min(interval - slept);
            thread::sleep(nap);
            slept += nap;
        }

        if stop.load(Ordering::SeqCst) {
            return;
        }
        let Some(engine) = engine.upgrade() else {
            return;
        };
        if !engine.connection_state().is_connected() {
            return;
        }
        engine.tick();
    }
}
