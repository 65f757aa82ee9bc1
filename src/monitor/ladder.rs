//! Charge-stall escalation ladder.
//!
//! A plugged-in vehicle that stops charging below the full-charge cutoff is
//! nudged with resume-charging commands, then one HVAC cycle, then a human
//! is told. Each rung fires at most once per stall.

// ---

/// Position on the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscalationLadder {
    #[default]
    Idle,
    /// Resume-charging commands issued so far.
    ResumeAttempts(u32),
    HvacKicked,
    Notified,
}

/// What the ladder wants done for one stalled sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    ResumeCharging,
    KickHvac,
    NotifyHuman,
}

impl EscalationLadder {
    /// Advance one rung for a stalled sample.
    ///
    /// Returns `None` once the human has been notified; the ladder then stays
    /// put until [`reset`](Self::reset).
    pub fn on_stall(&mut self, max_tries: u32) -> Option<LadderStep> {
        // ---
        let attempts = match *self {
            EscalationLadder::Idle => 0,
            EscalationLadder::ResumeAttempts(n) => n,
            EscalationLadder::HvacKicked => {
                *self = EscalationLadder::Notified;
                return Some(LadderStep::NotifyHuman);
            }
            EscalationLadder::Notified => return None,
        };

        if attempts < max_tries {
            *self = EscalationLadder::ResumeAttempts(attempts + 1);
            Some(LadderStep::ResumeCharging)
        } else {
            *self = EscalationLadder::HvacKicked;
            Some(LadderStep::KickHvac)
        }
    }

    pub fn reset(&mut self) {
        *self = EscalationLadder::Idle;
    }

    pub fn attempts(&self) -> u32 {
        match self {
            EscalationLadder::ResumeAttempts(n) => *n,
            _ => 0,
        }
    }
}
