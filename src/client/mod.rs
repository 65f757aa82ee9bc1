//! Seam to the vehicle telemetry/command backend.
//!
//! The daemon only needs a handful of remote operations. They are expressed
//! as traits so the supervisor and monitors can run against the HTTP gateway
//! client in production and against scripted fakes in tests.

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::ApiError;
use crate::models::RawBatteryStatus;

mod http;

pub use http::{HttpAccount, HttpVehicle, HttpVehicleApi};

// ---

/// Result of listing the account's vehicles.
///
/// The backend can answer with an error payload instead of failing the call;
/// that case is recoverable and is not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleListing {
    Vehicles(Vec<String>),
    SoftError(String),
}

#[async_trait]
pub trait VehicleApi: Send + Sync + 'static {
    type Account: AccountSession;

    async fn login(&self, credentials: &Credentials) -> Result<Self::Account, ApiError>;
}

/// An authenticated account. Shared read-only by every task of one epoch.
#[async_trait]
pub trait AccountSession: Send + Sync + 'static {
    type Vehicle: VehicleHandle;

    async fn list_vehicles(&self) -> Result<VehicleListing, ApiError>;

    async fn vehicle(&self, vin: &str) -> Result<Self::Vehicle, ApiError>;
}

#[async_trait]
pub trait VehicleHandle: Send + Sync + 'static {
    async fn battery_status(&self) -> Result<RawBatteryStatus, ApiError>;

    async fn start_charging(&self) -> Result<(), ApiError>;

    async fn start_hvac(&self) -> Result<(), ApiError>;
}
