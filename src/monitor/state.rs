//! Per-vehicle alert state and the evaluation step that drives it.
//!
//! Evaluation is pure: it updates the state and returns the actions the
//! monitor must perform, in order. The monitor owns the only instance.

use crate::alerts::{AlertKind, LowBatteryTier};
use crate::config::VehicleConfig;
use crate::models::BatterySample;

use super::ladder::{EscalationLadder, LadderStep};

/// Temperature must fall this far below the threshold before another
/// overheat alert can fire.
pub const OVERHEAT_HYSTERESIS: f64 = 3.0;

// ---

/// Alert thresholds for one vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warn_percentage: u8,
    pub min_percentage: u8,
    pub max_temperature: f64,
    pub max_tries: u32,
    pub full_charge_percentage: u8,
}

impl From<&VehicleConfig> for Thresholds {
    fn from(cfg: &VehicleConfig) -> Self {
        Self {
            warn_percentage: cfg.warn_battery_percentage,
            min_percentage: cfg.min_battery_percentage,
            max_temperature: cfg.max_battery_temperature,
            max_tries: cfg.max_tries,
            full_charge_percentage: cfg.full_charge_percentage,
        }
    }
}

/// Low-battery tiers already notified since the last plug-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LowBatteryAlerts {
    warn: bool,
    min: bool,
}

impl LowBatteryAlerts {
    pub fn contains(&self, tier: LowBatteryTier) -> bool {
        match tier {
            LowBatteryTier::Warn => self.warn,
            LowBatteryTier::Min => self.min,
        }
    }

    pub fn insert(&mut self, tier: LowBatteryTier) {
        match tier {
            LowBatteryTier::Warn => self.warn = true,
            LowBatteryTier::Min => self.min = true,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        !self.warn && !self.min
    }
}

/// Something the monitor must do after evaluating a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartCharging,
    StartHvac,
    Alert(AlertKind),
}

/// Alert and escalation state of one vehicle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    pub low_battery_alerts: LowBatteryAlerts,
    pub escalation: EscalationLadder,
    pub overheat_notified: bool,
    pub fully_charged_notified: bool,
}

impl MonitorState {
    // ---
    /// Run the three independent checks, in order, against one sample.
    pub fn evaluate(&mut self, sample: &BatterySample, limits: &Thresholds) -> Vec<Action> {
        // ---
        let mut actions = Vec::new();
        self.check_low_battery(sample, limits, &mut actions);
        self.check_charging(sample, limits, &mut actions);
        self.check_temperature(sample, limits, &mut actions);
        actions
    }

    fn check_low_battery(
        &mut self,
        sample: &BatterySample,
        limits: &Thresholds,
        out: &mut Vec<Action>,
    ) {
        // ---
        // Plugging in is the reset trigger, whatever the percentage.
        if sample.plugged {
            self.low_battery_alerts.clear();
            return;
        }
        if sample.percentage > limits.warn_percentage {
            return;
        }

        let tier = if sample.percentage <= limits.min_percentage {
            LowBatteryTier::Min
        } else {
            LowBatteryTier::Warn
        };
        if self.low_battery_alerts.contains(tier) {
            return;
        }

        self.low_battery_alerts.insert(tier);
        // A critical alert supersedes the warning tier.
        if tier == LowBatteryTier::Min {
            self.low_battery_alerts.insert(LowBatteryTier::Warn);
        }
        out.push(Action::Alert(AlertKind::LowBattery {
            tier,
            percentage: sample.percentage,
        }));
    }

    fn check_charging(
        &mut self,
        sample: &BatterySample,
        limits: &Thresholds,
        out: &mut Vec<Action>,
    ) {
        // ---
        if sample.percentage >= limits.full_charge_percentage {
            self.escalation.reset();
            if sample.plugged && !self.fully_charged_notified {
                self.fully_charged_notified = true;
                out.push(Action::Alert(AlertKind::FullyCharged {
                    percentage: sample.percentage,
                }));
            }
            return;
        }

        self.fully_charged_notified = false;
        if !sample.plugged {
            return;
        }
        if sample.charging {
            self.escalation.reset();
            return;
        }

        match self.escalation.on_stall(limits.max_tries) {
            Some(LadderStep::ResumeCharging) => out.push(Action::StartCharging),
            Some(LadderStep::KickHvac) => out.push(Action::StartHvac),
            Some(LadderStep::NotifyHuman) => {
                out.push(Action::Alert(AlertKind::RefusesToCharge {
                    percentage: sample.percentage,
                }))
            }
            None => {}
        }
    }

    fn check_temperature(
        &mut self,
        sample: &BatterySample,
        limits: &Thresholds,
        out: &mut Vec<Action>,
    ) {
        // ---
        let Some(temperature) = sample.temperature else {
            return;
        };

        if temperature > limits.max_temperature {
            if !self.overheat_notified {
                self.overheat_notified = true;
                out.push(Action::Alert(AlertKind::Overheat { temperature }));
            }
        } else if temperature <= limits.max_temperature - OVERHEAT_HYSTERESIS {
            self.overheat_notified = false;
        }
    }
}
