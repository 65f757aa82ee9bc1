//! Alert kinds and how each one is presented.
//!
//! The priority of every alert is fixed by its kind; callers never pick one.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---

/// Push priority, ordered from least to most intrusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Min,
    Default,
    High,
    Urgent,
}

impl Priority {
    /// Header value understood by the push transport.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// Low-battery tiers tracked between plug-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowBatteryTier {
    Warn,
    Min,
}

/// Every condition that produces a push notification.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertKind {
    LowBattery { tier: LowBatteryTier, percentage: u8 },
    RefusesToCharge { percentage: u8 },
    Overheat { temperature: f64 },
    FullyCharged { percentage: u8 },
    HvacDenied { percentage: u8 },
    ServerStarted { vehicles: usize },
    ServerStopped { error: String, at: DateTime<Utc> },
}

/// A rendered notification ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub tags: &'static str,
    pub priority: Priority,
}

impl AlertKind {
    pub fn priority(&self) -> Priority {
        // ---
        match self {
            AlertKind::LowBattery {
                tier: LowBatteryTier::Min,
                ..
            } => Priority::Urgent,
            AlertKind::LowBattery {
                tier: LowBatteryTier::Warn,
                ..
            } => Priority::High,
            AlertKind::RefusesToCharge { .. } => Priority::Urgent,
            AlertKind::Overheat { .. } => Priority::Urgent,
            AlertKind::FullyCharged { .. } => Priority::Default,
            AlertKind::HvacDenied { .. } => Priority::Default,
            AlertKind::ServerStarted { .. } => Priority::Min,
            AlertKind::ServerStopped { .. } => Priority::Urgent,
        }
    }

    /// Emoji shortcodes shown before the title.
    pub fn tags(&self) -> &'static str {
        // ---
        match self {
            AlertKind::LowBattery {
                tier: LowBatteryTier::Min,
                ..
            } => "red_square",
            AlertKind::LowBattery {
                tier: LowBatteryTier::Warn,
                ..
            } => "warning",
            AlertKind::RefusesToCharge { .. } => "electric_plug",
            AlertKind::Overheat { .. } => "stop_sign",
            AlertKind::FullyCharged { .. } => "white_check_mark",
            AlertKind::HvacDenied { .. } => "battery",
            AlertKind::ServerStarted { .. } => "rocket",
            AlertKind::ServerStopped { .. } => "skull",
        }
    }

    /// Render the alert for a vehicle nickname (or the server name for
    /// lifecycle alerts).
    pub fn render(&self, subject: &str) -> Alert {
        // ---
        let (title, body) = match self {
            AlertKind::LowBattery {
                tier: LowBatteryTier::Min,
                percentage,
            } => (
                format!("[{subject}] CRITICAL BATTERY LEVEL!"),
                format!("Battery level of '{subject}' is critical - {percentage}%"),
            ),
            AlertKind::LowBattery {
                tier: LowBatteryTier::Warn,
                percentage,
            } => (
                format!("[{subject}] Low battery level"),
                format!("Battery level of '{subject}' is low - {percentage}%"),
            ),
            AlertKind::RefusesToCharge { percentage } => (
                format!("[{subject}] VEHICLE REFUSES TO CHARGE!"),
                format!(
                    "'{subject}' is plugged in but will not charge after resume attempts and an HVAC cycle - {percentage}%"
                ),
            ),
            AlertKind::Overheat { temperature } => (
                format!("[{subject}] HIGH BATTERY TEMPERATURE!"),
                format!("Battery temperature of '{subject}' is very high - {temperature}"),
            ),
            AlertKind::FullyCharged { percentage } => (
                format!("[{subject}] Fully charged"),
                format!("'{subject}' has finished charging - {percentage}%"),
            ),
            AlertKind::HvacDenied { percentage } => (
                format!("[{subject}] AC did not start"),
                format!(
                    "'{subject}' does not have enough battery to start the AC - {percentage}%"
                ),
            ),
            AlertKind::ServerStarted { vehicles } => (
                format!("[{subject}] Server started"),
                format!("Monitoring {vehicles} vehicle(s)"),
            ),
            AlertKind::ServerStopped { error, at } => (
                format!("[{subject}] SERVER STOPPED!"),
                format!("Fatal error at {}: {error}", at.to_rfc3339()),
            ),
        };

        Alert {
            title,
            body,
            tags: self.tags(),
            priority: self.priority(),
        }
    }
}
