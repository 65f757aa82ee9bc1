//! Scripted backend and recording notifier shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use zegra::alerts::{Alert, Priority};
use zegra::client::{AccountSession, VehicleApi, VehicleHandle, VehicleListing};
use zegra::config::{Credentials, FleetConfig, NtfyChannel};
use zegra::{ApiError, NotifyError, RawBatteryStatus};

// ---

/// Which battery read is being answered: `epoch` counts logins (from 1),
/// `n` counts reads on one vehicle handle (from 0).
#[derive(Debug, Clone, Copy)]
pub struct Call {
    pub epoch: usize,
    pub n: usize,
}

pub type BatteryScript =
    Arc<dyn Fn(&str, Call) -> Result<RawBatteryStatus, ApiError> + Send + Sync>;

pub struct Backend {
    pub account_vins: Vec<String>,
    pub battery: BatteryScript,
    pub listings: Mutex<VecDeque<VehicleListing>>,
    pub login_errors: Mutex<VecDeque<ApiError>>,
    pub logins: Mutex<Vec<Instant>>,
    pub battery_reads: AtomicUsize,
    /// (epoch, vin, command)
    pub commands: Mutex<Vec<(usize, String, &'static str)>>,
}

impl Backend {
    pub fn new<F>(account_vins: &[&str], battery: F) -> Arc<Self>
    where
        F: Fn(&str, Call) -> Result<RawBatteryStatus, ApiError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            account_vins: account_vins.iter().map(|v| v.to_string()).collect(),
            battery: Arc::new(battery),
            listings: Mutex::default(),
            login_errors: Mutex::default(),
            logins: Mutex::default(),
            battery_reads: AtomicUsize::new(0),
            commands: Mutex::default(),
        })
    }

    pub fn account(self: &Arc<Self>, epoch: usize) -> MockAccount {
        MockAccount {
            backend: self.clone(),
            epoch,
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.lock().unwrap().len()
    }

    pub fn commands(&self, command: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, c)| *c == command)
            .count()
    }
}

pub struct MockApi(pub Arc<Backend>);

#[async_trait]
impl VehicleApi for MockApi {
    type Account = MockAccount;

    async fn login(&self, _credentials: &Credentials) -> Result<MockAccount, ApiError> {
        let epoch = {
            let mut logins = self.0.logins.lock().unwrap();
            logins.push(Instant::now());
            logins.len()
        };
        if let Some(e) = self.0.login_errors.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(self.0.account(epoch))
    }
}

pub struct MockAccount {
    backend: Arc<Backend>,
    epoch: usize,
}

#[async_trait]
impl AccountSession for MockAccount {
    type Vehicle = MockVehicle;

    async fn list_vehicles(&self) -> Result<VehicleListing, ApiError> {
        if let Some(listing) = self.backend.listings.lock().unwrap().pop_front() {
            return Ok(listing);
        }
        Ok(VehicleListing::Vehicles(self.backend.account_vins.clone()))
    }

    async fn vehicle(&self, vin: &str) -> Result<MockVehicle, ApiError> {
        Ok(MockVehicle {
            backend: self.backend.clone(),
            epoch: self.epoch,
            vin: vin.to_string(),
            reads: AtomicUsize::new(0),
        })
    }
}

pub struct MockVehicle {
    backend: Arc<Backend>,
    epoch: usize,
    vin: String,
    reads: AtomicUsize,
}

impl MockVehicle {
    fn record(&self, command: &'static str) {
        self.backend
            .commands
            .lock()
            .unwrap()
            .push((self.epoch, self.vin.clone(), command));
    }
}

#[async_trait]
impl VehicleHandle for MockVehicle {
    async fn battery_status(&self) -> Result<RawBatteryStatus, ApiError> {
        self.backend.battery_reads.fetch_add(1, Ordering::SeqCst);
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        (self.backend.battery)(&self.vin, Call { epoch: self.epoch, n })
    }

    async fn start_charging(&self) -> Result<(), ApiError> {
        self.record("charging-start");
        Ok(())
    }

    async fn start_hvac(&self) -> Result<(), ApiError> {
        self.record("hvac-start");
        Ok(())
    }
}

/// Keeps every delivered alert together with the topic it was sent to.
/// A failing sink rejects every alert and only counts the attempts.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, Alert)>>,
    failing: AtomicBool,
    failed: AtomicUsize,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            failing: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn failures(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn to_topic(&self, topic: &str) -> Vec<Alert> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub fn priorities(&self, topic: &str) -> Vec<Priority> {
        self.to_topic(topic).iter().map(|a| a.priority).collect()
    }
}

#[async_trait]
impl zegra::notify::AlertSink for RecordingSink {
    async fn notify(&self, channel: &NtfyChannel, alert: &Alert) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            self.failed.fetch_add(1, Ordering::SeqCst);
            return Err(NotifyError::Status(503));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.topic.clone(), alert.clone()));
        Ok(())
    }
}

pub fn status(level: i64, plugged: bool, charging: bool) -> RawBatteryStatus {
    RawBatteryStatus {
        battery_level: Some(level),
        plug_status: Some(plugged as i64),
        battery_temperature: Some(20.0),
        charging_status: Some(if charging { 1.0 } else { 0.0 }),
    }
}

pub fn unavailable() -> RawBatteryStatus {
    RawBatteryStatus {
        battery_level: None,
        ..status(0, false, false)
    }
}

/// Fleet of `(nickname, vin, poll minutes)`; each car posts to topic
/// `topic-<nickname>`, the admin channel is `admin`. The listener binds an
/// ephemeral port.
pub fn fleet(cars: &[(&str, &str, u64)]) -> FleetConfig {
    let cars = cars
        .iter()
        .map(|(nickname, vin, minutes)| {
            format!(
                r#""{nickname}": {{
                    "vin": "{vin}",
                    "warn_battery_percentage": 50,
                    "min_battery_percentage": 20,
                    "max_battery_temperature": 45,
                    "check_time": {minutes},
                    "max_tries": 3,
                    "ntfy_topic": "topic-{nickname}",
                    "ntfy_auth": {{"username": "u", "password": "p"}}
                }}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    FleetConfig::from_json(&format!(
        r#"{{
            "api_url": "http://gateway.invalid",
            "account": {{"email": "fleet@example.com", "password": "pw"}},
            "admin_ntfy": {{"topic": "admin", "auth": {{"username": "a", "password": "b"}}}},
            "listener_port": 0,
            "cars": {{ {cars} }}
        }}"#
    ))
    .unwrap()
}
