//! The three engine subsystem toggles.
//!
//! Each toggle is driven by explicit intent: the widget asks for a
//! desired state, the boolean updates optimistically, and a failed
//! start/stop rolls it back — the same discipline every other setting
//! uses, via the same `SettingSync` machine.

use std::time::Instant;

use voxpanel_messages::{Command, Subsystem};

use crate::sync::{Commit, SettingSync, SyncStatus};

pub struct Toggles {
    loopback: SettingSync<bool>,
    throughput: SettingSync<bool>,
    modulation: SettingSync<bool>,
}

impl Toggles {
    pub fn new() -> Self {
        Self {
            loopback: SettingSync::immediate(),
            throughput: SettingSync::immediate(),
            modulation: SettingSync::immediate(),
        }
    }

    fn sync(&self, subsystem: Subsystem) -> &SettingSync<bool> {
        match subsystem {
            Subsystem::Loopback => &self.loopback,
            Subsystem::Throughput => &self.throughput,
            Subsystem::Modulation => &self.modulation,
        }
    }

    fn sync_mut(&mut self, subsystem: Subsystem) -> &mut SettingSync<bool> {
        match subsystem {
            Subsystem::Loopback => &mut self.loopback,
            Subsystem::Throughput => &mut self.throughput,
            Subsystem::Modulation => &mut self.modulation,
        }
    }

    pub fn is_on(&self, subsystem: Subsystem) -> bool {
        self.sync(subsystem).displayed().copied().unwrap_or(false)
    }

    pub fn status(&self, subsystem: Subsystem) -> SyncStatus {
        self.sync(subsystem).status()
    }

    /// Land the startup status query for one subsystem.
    pub fn adopt(&mut self, subsystem: Subsystem, running: bool) {
        self.sync_mut(subsystem).adopt(running);
    }

    /// Request a state change; the returned commit carries the desired
    /// boolean and must be dispatched as `command_for` says.
    pub fn set(&mut self, subsystem: Subsystem, desired: bool, now: Instant) -> Option<Commit<bool>> {
        self.sync_mut(subsystem).edit(desired, now)
    }

    pub fn confirm(&mut self, subsystem: Subsystem, seq: u64) {
        self.sync_mut(subsystem).confirm(seq);
    }

    pub fn fail(&mut self, subsystem: Subsystem, seq: u64) -> bool {
        self.sync_mut(subsystem).fail(seq)
    }

    /// The start/stop command a desired state maps to.
    pub fn command_for(subsystem: Subsystem, desired: bool) -> Command {
        if desired {
            Command::StartSubsystem(subsystem)
        } else {
            Command::StopSubsystem(subsystem)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_start_off_until_status_lands() {
        let mut toggles = Toggles::new();
        assert!(!toggles.is_on(Subsystem::Loopback));

        toggles.adopt(Subsystem::Loopback, true);
        assert!(toggles.is_on(Subsystem::Loopback));
        assert!(!toggles.is_on(Subsystem::Throughput));
    }

    #[test]
    fn flipping_on_emits_a_start_commit() {
        let mut toggles = Toggles::new();
        toggles.adopt(Subsystem::Throughput, false);

        let commit = toggles
            .set(Subsystem::Throughput, true, Instant::now())
            .expect("state change should commit");
        assert!(commit.value);
        assert_eq!(
            Toggles::command_for(Subsystem::Throughput, commit.value),
            Command::StartSubsystem(Subsystem::Throughput)
        );

        toggles.confirm(Subsystem::Throughput, commit.seq);
        assert!(toggles.is_on(Subsystem::Throughput));
        assert_eq!(toggles.status(Subsystem::Throughput), SyncStatus::Idle);
    }

    #[test]
    fn failed_start_rolls_the_boolean_back() {
        let mut toggles = Toggles::new();
        toggles.adopt(Subsystem::Modulation, false);

        let commit = toggles.set(Subsystem::Modulation, true, Instant::now()).unwrap();
        assert!(toggles.is_on(Subsystem::Modulation), "optimistic flip");

        assert!(toggles.fail(Subsystem::Modulation, commit.seq));
        assert!(!toggles.is_on(Subsystem::Modulation));
        assert_eq!(toggles.status(Subsystem::Modulation), SyncStatus::Failed);
    }

    #[test]
    fn subsystems_are_independent() {
        let mut toggles = Toggles::new();
        toggles.adopt(Subsystem::Loopback, false);
        toggles.adopt(Subsystem::Modulation, false);

        let commit = toggles.set(Subsystem::Loopback, true, Instant::now()).unwrap();
        toggles.confirm(Subsystem::Loopback, commit.seq);

        assert!(toggles.is_on(Subsystem::Loopback));
        assert!(!toggles.is_on(Subsystem::Modulation));
        assert_eq!(toggles.status(Subsystem::Modulation), SyncStatus::Idle);
    }
}
