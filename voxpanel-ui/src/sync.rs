//! Optimistic-update state machine shared by every editable setting.
//!
//! One `SettingSync` instance exists per setting (and per toggle). The
//! machine is pure: it never touches a channel or the wall clock on its
//! own, it only reacts to edits, timer polls, and acknowledgments the
//! owner feeds it. Dispatching the commits it emits is the owner's job.

use std::time::{Duration, Instant};

/// Quiescence window for debounced (high-frequency-write) settings.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(450);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Displayed value matches the last engine-confirmed value.
    Idle,
    /// An edit is outstanding: debouncing or awaiting acknowledgment.
    Pending,
    /// The last commit failed and the display was rolled back.
    Failed,
}

/// A value ready to be sent to the engine, tagged with the edit
/// sequence number it reconciles against.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit<T> {
    pub value: T,
    pub seq: u64,
}

#[derive(Debug)]
struct DebounceTimer {
    deadline: Instant,
    seq: u64,
}

/// Optimistic/debounce/reconcile machine for one setting.
#[derive(Debug)]
pub struct SettingSync<T> {
    displayed: Option<T>,
    last_confirmed: Option<T>,
    status: SyncStatus,
    seq: u64,
    debounce: Option<Duration>,
    timer: Option<DebounceTimer>,
}

impl<T: Clone + PartialEq> SettingSync<T> {
    /// A setting that commits on every edit (devices, effects, toggles).
    pub fn immediate() -> Self {
        Self::with_debounce(None)
    }

    /// A setting that commits only after the value has been quiescent
    /// for `window` (latency).
    pub fn debounced(window: Duration) -> Self {
        Self::with_debounce(Some(window))
    }

    fn with_debounce(debounce: Option<Duration>) -> Self {
        Self {
            displayed: None,
            last_confirmed: None,
            status: SyncStatus::Idle,
            seq: 0,
            debounce,
            timer: None,
        }
    }

    pub fn displayed(&self) -> Option<&T> {
        self.displayed.as_ref()
    }

    pub fn last_confirmed(&self) -> Option<&T> {
        self.last_confirmed.as_ref()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Land the one-time reconciling fetch. A value the user has already
    /// edited wins over the fetched one, so this is a no-op once any
    /// edit has happened.
    pub fn adopt(&mut self, value: T) {
        if self.seq > 0 {
            return;
        }
        self.displayed = Some(value.clone());
        self.last_confirmed = Some(value);
        self.status = SyncStatus::Idle;
    }

    /// Apply a user edit: the display updates unconditionally, any armed
    /// timer is cancelled, and either a commit is emitted (immediate
    /// settings) or the debounce timer restarts.
    ///
    /// Editing back to the confirmed value while nothing is in flight
    /// short-circuits: there is nothing to commit.
    pub fn edit(&mut self, value: T, now: Instant) -> Option<Commit<T>> {
        if self.status == SyncStatus::Idle && self.last_confirmed.as_ref() == Some(&value) {
            self.displayed = Some(value);
            self.timer = None;
            return None;
        }

        self.seq += 1;
        self.displayed = Some(value.clone());
        self.status = SyncStatus::Pending;
        self.timer = None;

        match self.debounce {
            None => Some(Commit {
                value,
                seq: self.seq,
            }),
            Some(window) => {
                self.timer = Some(DebounceTimer {
                    deadline: now + window,
                    seq: self.seq,
                });
                None
            }
        }
    }

    /// Show a value the user typed without ever committing it. Used for
    /// input that fails client-side validation (e.g. non-positive
    /// latency): the display follows the user, the engine never hears
    /// about it, and any in-flight acknowledgment becomes stale.
    pub fn preview(&mut self, value: T) {
        self.seq += 1;
        self.displayed = Some(value);
        self.timer = None;
    }

    /// Fire the debounce timer if its window has elapsed. At most one
    /// commit is emitted per armed timer.
    pub fn poll(&mut self, now: Instant) -> Option<Commit<T>> {
        match &self.timer {
            Some(timer) if now >= timer.deadline => {}
            _ => return None,
        }
        let timer = self.timer.take()?;
        let value = self.displayed.clone()?;
        self.status = SyncStatus::Pending;
        Some(Commit {
            value,
            seq: timer.seq,
        })
    }

    /// Acknowledgment for the commit carrying `seq`. Stale acks — a
    /// newer edit has happened since the commit was issued — are
    /// discarded so they can never overwrite a newer optimistic value.
    pub fn confirm(&mut self, seq: u64) {
        if seq != self.seq {
            return;
        }
        self.last_confirmed = self.displayed.clone();
        self.status = SyncStatus::Idle;
    }

    /// Failed commit: roll the display back to the last confirmed value.
    /// The stale guard applies here too — a failure for a superseded
    /// edit must not clobber the newer optimistic value. Returns whether
    /// a rollback actually happened.
    pub fn fail(&mut self, seq: u64) -> bool {
        if seq != self.seq {
            return false;
        }
        self.displayed = self.last_confirmed.clone();
        self.status = SyncStatus::Failed;
        true
    }
}
