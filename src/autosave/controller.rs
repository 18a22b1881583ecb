use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::debounce::Debounce;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    /// Everything the caller edited has been written.
    Clean,
    /// Edits are waiting for the debounce to elapse.
    DirtyPending,
    /// A write has been handed out and not completed yet.
    Flushing,
}

/// A write the caller has to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush<T> {
    pub version: u64,
    /// State as it was when the write was scheduled.
    pub state: T,
}

/// What a finished write did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The written version was the latest edit; the controller is clean.
    Saved,
    /// The write landed but newer edits are still waiting.
    SavedNewerPending,
    /// The write failed; the state stays dirty and will be written again.
    Failed(String),
    /// Completion for a version that was already superseded.
    Stale,
}

impl Completion {
    pub fn is_saved(&self) -> bool {
        matches!(self, Completion::Saved | Completion::SavedNewerPending)
    }
}

/// Dirty-state tracker that debounces edits into versioned writes.
///
/// Does no IO itself: callers feed it edits and the current time, perform the
/// [`Flush`] it hands back and report the outcome through
/// [`AutosaveController::complete`]. At most one write is in flight at a time.
#[derive(Debug, Clone)]
pub struct AutosaveController<T> {
    current: T,
    /// Version of the latest edit.
    version: u64,
    /// Highest version known to be written.
    saved_version: u64,
    in_flight: Option<u64>,
    /// `flush_now` was called while a write was in flight.
    flush_requested: bool,
    debounce: Debounce,
}

impl<T: Clone> AutosaveController<T> {
    /// Start clean with an already persisted state.
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            current: initial,
            version: 0,
            saved_version: 0,
            in_flight: None,
            flush_requested: false,
            debounce: Debounce::new(delay),
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn saved_version(&self) -> u64 {
        self.saved_version
    }

    pub fn is_dirty(&self) -> bool {
        self.version > self.saved_version
    }

    pub fn state(&self) -> AutosaveState {
        if self.in_flight.is_some() {
            AutosaveState::Flushing
        } else if self.is_dirty() {
            AutosaveState::DirtyPending
        } else {
            AutosaveState::Clean
        }
    }

    /// When the pending write becomes due, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Replace the state with an edited one and restart the quiet period.
    pub fn mark_dirty(&mut self, state: T, now: Instant) {
        self.current = state;
        self.version += 1;
        self.debounce.arm(now);
        debug!("Autosave: edit {} scheduled", self.version);
    }

    /// Hand out the debounced write once it is due, or right away when an
    /// immediate flush was requested during the previous write.
    ///
    /// Returns `None` while a write is in flight; the newer edit waits for
    /// its completion.
    pub fn poll(&mut self, now: Instant) -> Option<Flush<T>> {
        if self.in_flight.is_some() {
            return None;
        }
        if !self.flush_requested && !self.debounce.is_due(now) {
            return None;
        }
        self.debounce.cancel();
        self.flush_requested = false;
        if !self.is_dirty() {
            return None;
        }
        Some(self.issue())
    }

    /// Skip the debounce and write the latest state right away.
    ///
    /// Returns `None` when that version is already written. While another
    /// write is in flight the request is queued: `poll` hands out the latest
    /// state as soon as that write completes.
    pub fn flush_now(&mut self) -> Option<Flush<T>> {
        self.debounce.cancel();
        if !self.is_dirty() {
            return None;
        }
        if self.in_flight.is_some() {
            self.flush_requested = true;
            return None;
        }
        Some(self.issue())
    }

    fn issue(&mut self) -> Flush<T> {
        self.in_flight = Some(self.version);
        Flush {
            version: self.version,
            state: self.current.clone(),
        }
    }

    /// Report the outcome of a write handed out by `poll` or `flush_now`.
    pub fn complete<E: fmt::Display>(
        &mut self,
        version: u64,
        outcome: Result<(), E>,
        now: Instant,
    ) -> Completion {
        if self.in_flight == Some(version) {
            self.in_flight = None;
        }

        match outcome {
            Ok(()) => {
                if version <= self.saved_version {
                    return Completion::Stale;
                }
                self.saved_version = version;
                if self.is_dirty() {
                    if !self.flush_requested && !self.debounce.is_armed() {
                        self.debounce.arm(now);
                    }
                    Completion::SavedNewerPending
                } else {
                    Completion::Saved
                }
            }
            Err(e) => {
                if version <= self.saved_version || self.in_flight.is_some() {
                    return Completion::Stale;
                }
                warn!("Autosave: write of version {} failed: {}", version, e);
                self.flush_requested = false;
                self.debounce.arm(now);
                Completion::Failed(e.to_string())
            }
        }
    }
}
