//! Telemetry data models for the battery monitor.

use serde::{Deserialize, Serialize};

// ---

/// Raw battery status as reported by the vehicle backend.
///
/// Every field may be missing; the backend omits readings it could not take.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBatteryStatus {
    // ---
    pub battery_level: Option<i64>,
    /// 1 plugged, 0 unplugged, negative values are plug sensor errors.
    pub plug_status: Option<i64>,
    pub battery_temperature: Option<f64>,
    /// 1.0 while a charge is in progress; other values mean not charging.
    pub charging_status: Option<f64>,
}

/// A sanitized sample with every required field present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySample {
    // ---
    pub percentage: u8,
    pub plugged: bool,
    pub temperature: Option<f64>,
    pub charging: bool,
}

impl RawBatteryStatus {
    // ---
    /// Validate the raw reading.
    ///
    /// Returns `None` when a required field is unavailable or out of range.
    /// Such a sample is a sampling fault, never a valid zero.
    pub fn sanitize(&self) -> Option<BatterySample> {
        // ---
        let percentage = self.battery_level.filter(|p| (0..=100).contains(p))? as u8;
        let plugged = match self.plug_status? {
            0 => false,
            1 => true,
            _ => return None,
        };
        let charging = self.charging_status.filter(|c| c.is_finite())? >= 1.0;
        let temperature = self.battery_temperature.filter(|t| t.is_finite());

        Some(BatterySample {
            percentage,
            plugged,
            temperature,
            charging,
        })
    }
}
