//! Shared screen buffer
//!
//! The reader thread and any sender threads meet here: one mutex around the
//! [`Display3270`], plus two condition variables. The EOR condition fires when
//! a host reply completes the current response cycle; the update condition
//! fires on every processed record and on negotiation end markers.
//!
//! [`HostWriter`] is the matching outbound half: a cloneable handle that
//! serialises writes to the host from the reader thread and senders.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex, MutexGuard};

use super::cycle::CompletionReason;
use super::display::Display3270;
use crate::error::{Result, TN3270Error};

pub type DisplayGuard<'a> = MutexGuard<'a, Display3270>;

/// Screen buffer guarded by a timed lock and two condition variables
#[derive(Debug)]
pub struct SharedDisplay {
    display: Mutex<Display3270>,
    eor: Condvar,
    update: Condvar,
    lock_timeout: Duration,
}

impl SharedDisplay {
    pub fn new(display: Display3270, lock_timeout: Duration) -> Self {
        Self {
            display: Mutex::new(display),
            eor: Condvar::new(),
            update: Condvar::new(),
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Acquire the buffer lock with the configured timeout
    pub fn lock(&self) -> Result<DisplayGuard<'_>> {
        self.lock_for(self.lock_timeout)
    }

    /// Acquire the buffer lock, giving up after `timeout`
    pub fn lock_for(&self, timeout: Duration) -> Result<DisplayGuard<'_>> {
        self.display.try_lock_for(timeout).ok_or_else(|| {
            warn!("screen buffer lock not acquired within {:?}", timeout);
            TN3270Error::LockTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        })
    }

    /// Close out one processed record and wake EOR waiters if it completes
    /// the cycle. Must be called before the guard is released.
    pub fn finish_record(&self, guard: &mut DisplayGuard<'_>) -> Option<CompletionReason> {
        let reason = guard.cycle_mut().complete_record();
        match reason {
            Some(reason) => {
                debug!("response cycle complete: {:?}", reason);
                self.eor.notify_all();
            }
            None => debug!("record processed, reply not complete yet"),
        }
        reason
    }

    /// Wait on the EOR condition until the cycle completes or `timeout`
    /// elapses. Returns false on timeout. The lock is released while waiting.
    pub fn wait_for_completion(&self, guard: &mut DisplayGuard<'_>, timeout: Duration) -> bool {
        let baseline = guard.cycle().completions();
        let deadline = Instant::now() + timeout;
        while guard.cycle().completions() == baseline {
            if self.eor.wait_until(guard, deadline).timed_out() {
                return guard.cycle().completions() != baseline;
            }
        }
        true
    }

    /// Raise a screen update notification
    pub fn notify_update(&self, guard: &mut DisplayGuard<'_>) {
        guard.mark_updated();
        self.update.notify_all();
    }

    /// Wait on the update condition. Returns false on timeout.
    pub fn wait_for_update(&self, guard: &mut DisplayGuard<'_>, timeout: Duration) -> bool {
        let baseline = guard.updates();
        let deadline = Instant::now() + timeout;
        while guard.updates() == baseline {
            if self.update.wait_until(guard, deadline).timed_out() {
                return guard.updates() != baseline;
            }
        }
        true
    }
}

impl Default for SharedDisplay {
    fn default() -> Self {
        Self::new(Display3270::new(), Duration::from_secs(5))
    }
}

/// Shared write half of the host connection
#[derive(Clone)]
pub struct HostWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl HostWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write all of `bytes` and flush
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.inner.lock();
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Debug for HostWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostWriter").finish_non_exhaustive()
    }
}
