//! `zegra`: an unattended battery watchdog for a small electric vehicle fleet.
//!
//! Module boundaries:
//! - `config`     – environment settings and the JSON fleet file
//! - `models`     – raw and sanitized battery telemetry
//! - `alerts`     – alert kinds, their fixed priorities and wording
//! - `notify`     – push transport seam and log-and-swallow dispatch
//! - `client`     – vehicle backend seam and the HTTP gateway client
//! - `monitor`    – per-vehicle task, alert state and escalation ladder
//! - `routes`     – command trigger listener (climate control, health)
//! - `supervisor` – connection epochs, fault classification and backoff
//!
//! `main.rs` only wires these together.

pub mod alerts;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod routes;
pub mod supervisor;

pub use config::{FleetConfig, Settings, VehicleConfig};
pub use error::{ApiError, EpochFault, FaultKind, NotifyError, SupervisorError};
pub use models::{BatterySample, RawBatteryStatus};
pub use supervisor::{Supervisor, SupervisorTimings};
