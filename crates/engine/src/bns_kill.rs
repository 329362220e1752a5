//! Structural kill machines for the four rhythm patterns in BNS.
//!
//! While OZ, AP5, PP, or ST sits in the bait-and-switch bucket, a small
//! sub-machine watches completed runs for violations of the rhythm that
//! defines the pattern. A violation kills the BNS regardless of profit.
//! Checks are suppressed on the block a switch was just played.

use pattern_bet_core::Pattern;
use pattern_bet_patterns::RunBreak;
use serde::{Deserialize, Serialize};

/// Rhythm monitor for one pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillMachine {
    /// Block at which monitoring started (BNS entry); `None` when idle.
    pub monitoring_start_block: Option<u32>,
    /// Block of the most recently played switch trade.
    pub last_switch_block: Option<u32>,
    /// Length of the previous completed run inside the window.
    last_completed: Option<u32>,
}

impl KillMachine {
    fn reset(&mut self) {
        self.monitoring_start_block = None;
        self.last_switch_block = None;
        self.last_completed = None;
    }
}

/// The four rhythm monitors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BnsKillMachines {
    pub oz: KillMachine,
    pub ap5: KillMachine,
    pub pp: KillMachine,
    pub st: KillMachine,
}

impl BnsKillMachines {
    pub const MONITORED: [Pattern; 4] = [Pattern::Ap5, Pattern::Oz, Pattern::Pp, Pattern::St];

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn machine_mut(&mut self, base: Pattern) -> Option<&mut KillMachine> {
        match base {
            Pattern::Oz => Some(&mut self.oz),
            Pattern::Ap5 => Some(&mut self.ap5),
            Pattern::Pp => Some(&mut self.pp),
            Pattern::St => Some(&mut self.st),
            _ => None,
        }
    }

    #[must_use]
    pub fn machine(&self, base: Pattern) -> Option<&KillMachine> {
        match base {
            Pattern::Oz => Some(&self.oz),
            Pattern::Ap5 => Some(&self.ap5),
            Pattern::Pp => Some(&self.pp),
            Pattern::St => Some(&self.st),
            _ => None,
        }
    }

    /// Starts monitoring when a monitored pattern enters BNS.
    pub fn begin_monitoring(&mut self, pattern: Pattern, block_index: u32) {
        if let Some(machine) = self.machine_mut(pattern.base()) {
            machine.monitoring_start_block = Some(block_index);
            machine.last_switch_block = None;
            machine.last_completed = None;
        }
    }

    /// Stops monitoring when the pattern leaves BNS.
    pub fn end_monitoring(&mut self, pattern: Pattern) {
        if let Some(machine) = self.machine_mut(pattern.base()) {
            machine.reset();
        }
    }

    /// Records that a switch trade was played on the given block.
    pub fn note_switch(&mut self, pattern: Pattern, block_index: u32) {
        if let Some(machine) = self.machine_mut(pattern.base()) {
            machine.last_switch_block = Some(block_index);
        }
    }

    /// Observes a completed run and returns the monitored base patterns
    /// whose rhythm it violates.
    #[must_use]
    pub fn observe_run_break(&mut self, run_break: &RunBreak) -> Vec<Pattern> {
        let block_index = run_break.break_block.index;
        let length = run_break.completed.length;
        let mut killed = Vec::new();

        for base in Self::MONITORED {
            let Some(machine) = self.machine_mut(base) else {
                continue;
            };
            if machine.monitoring_start_block.is_none() {
                continue;
            }
            if machine.last_switch_block == Some(block_index) {
                continue;
            }
            let previous = machine.last_completed.replace(length);
            if Self::violates(base, length, previous) {
                killed.push(base);
            }
        }
        killed
    }

    /// Rhythm violations per pattern:
    /// OZ alternates singletons with 3-runs, AP5 rides trends (two chopped
    /// singletons break it), PP alternates singletons with 2-runs, ST
    /// climbs in 2-runs.
    #[must_use]
    pub fn rhythm_violated(base: Pattern, length: u32, previous: Option<u32>) -> bool {
        Self::violates(base, length, previous)
    }

    fn violates(base: Pattern, length: u32, previous: Option<u32>) -> bool {
        match base {
            Pattern::Oz => length == 2 || length > 3,
            Pattern::Ap5 => length == 1 && previous == Some(1),
            Pattern::Pp => length >= 3,
            Pattern::St => length != 2,
            _ => false,
        }
    }
}
