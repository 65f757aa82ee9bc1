//! Top-level control loop.
//!
//! The supervisor logs in, checks the configured fleet against the account,
//! and runs one connection epoch: a monitor task per vehicle plus the command
//! listener, all in a single [`JoinSet`]. The first task to finish ends the
//! epoch; every other task is cancelled and awaited before the fault is
//! classified into a short backoff, a long backoff, or a fatal shutdown.
//!
//! ```text
//! Connecting ──► Running ──► BackoffTransient ──► Connecting
//!     │  ▲                 ├► BackoffQuota ──────► Connecting
//!     └──┘ soft error      └► FatalShutdown (admin alert, exit)
//! ```

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::alerts::AlertKind;
use crate::client::{AccountSession, VehicleApi, VehicleListing};
use crate::config::{FleetConfig, VehicleConfig};
use crate::error::{ApiError, EpochFault, FaultKind, SupervisorError};
use crate::monitor::VehicleMonitor;
use crate::notify::{dispatch, AlertSink};
use crate::routes::{self, CommandState};

/// Subject used in admin-channel alerts.
pub const SERVER_NAME: &str = "Zegra";

// ---

/// Cooldowns between connection epochs.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorTimings {
    /// After network or transport faults.
    pub transient_backoff: Duration,
    /// After the backend reports rate-limit exhaustion.
    pub quota_backoff: Duration,
    /// After the account answers with a soft error payload.
    pub soft_error_cooldown: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            transient_backoff: Duration::from_secs(60),
            quota_backoff: Duration::from_secs(300),
            soft_error_cooldown: Duration::from_secs(60),
        }
    }
}

enum Phase<S> {
    Connecting,
    Running(Arc<S>),
    BackoffTransient(EpochFault),
    BackoffQuota(EpochFault),
    FatalShutdown(EpochFault),
}

impl<S> Phase<S> {
    fn after(fault: EpochFault) -> Self {
        // ---
        match fault.fault_kind() {
            FaultKind::Transient => Phase::BackoffTransient(fault),
            FaultKind::Quota => Phase::BackoffQuota(fault),
            FaultKind::Fatal => Phase::FatalShutdown(fault),
        }
    }
}

enum Connected<S> {
    Ready(Arc<S>),
    SoftError(String),
}

enum ConnectError {
    Api(ApiError),
    UnknownVehicles(Vec<String>),
}

impl From<ApiError> for ConnectError {
    fn from(e: ApiError) -> Self {
        ConnectError::Api(e)
    }
}

pub struct Supervisor<C, N: ?Sized> {
    api: C,
    notifier: Arc<N>,
    config: Arc<FleetConfig>,
    timings: SupervisorTimings,
}

impl<C, N> Supervisor<C, N>
where
    C: VehicleApi,
    N: AlertSink + ?Sized,
{
    pub fn new(api: C, notifier: Arc<N>, config: Arc<FleetConfig>) -> Self {
        Self {
            api,
            notifier,
            config,
            timings: SupervisorTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: SupervisorTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Supervise the fleet. Only returns on a fatal condition; the caller
    /// should exit non-zero.
    pub async fn run(self) -> SupervisorError {
        // ---
        let started = AlertKind::ServerStarted {
            vehicles: self.config.cars.len(),
        };
        self.notify_admin(started).await;

        let mut phase = Phase::Connecting;
        loop {
            phase = match phase {
                Phase::Connecting => match self.connect().await {
                    Ok(Connected::Ready(account)) => Phase::Running(account),
                    Ok(Connected::SoftError(message)) => {
                        warn!(
                            "Account returned an error ({}), retrying in {:?}",
                            message, self.timings.soft_error_cooldown
                        );
                        tokio::time::sleep(self.timings.soft_error_cooldown).await;
                        Phase::Connecting
                    }
                    Err(ConnectError::UnknownVehicles(vins)) => {
                        return SupervisorError::UnknownVehicles(vins);
                    }
                    Err(ConnectError::Api(e)) => Phase::after(EpochFault::Api(e)),
                },
                Phase::Running(account) => Phase::after(self.run_epoch(account).await),
                Phase::BackoffTransient(fault) => {
                    warn!(
                        "Transient fault ({}), reconnecting in {:?}",
                        fault, self.timings.transient_backoff
                    );
                    tokio::time::sleep(self.timings.transient_backoff).await;
                    Phase::Connecting
                }
                Phase::BackoffQuota(fault) => {
                    warn!(
                        "Rate limit exhausted ({}), reconnecting in {:?}",
                        fault, self.timings.quota_backoff
                    );
                    tokio::time::sleep(self.timings.quota_backoff).await;
                    Phase::Connecting
                }
                Phase::FatalShutdown(fault) => {
                    error!("Fatal fault: {}", fault);
                    let stopped = AlertKind::ServerStopped {
                        error: fault.to_string(),
                        at: Utc::now(),
                    };
                    self.notify_admin(stopped).await;
                    return SupervisorError::Fatal(fault.to_string());
                }
            };
        }
    }

    /// Log in, resolve the account's vehicles and check the fleet against them.
    async fn connect(&self) -> Result<Connected<C::Account>, ConnectError> {
        // ---
        info!("Logging in as {}", self.config.account.email);
        let account = self.api.login(&self.config.account).await?;

        let vins = match account.list_vehicles().await? {
            VehicleListing::Vehicles(vins) => vins,
            VehicleListing::SoftError(message) => return Ok(Connected::SoftError(message)),
        };

        let missing = missing_vehicles(&self.config, &vins);
        if !missing.is_empty() {
            for vin in &missing {
                error!("'{}' is missing in the vehicle account!", vin);
            }
            return Err(ConnectError::UnknownVehicles(missing));
        }

        info!("Account resolved with {} vehicle(s)", vins.len());
        Ok(Connected::Ready(Arc::new(account)))
    }

    /// Run every task of one epoch until the first one ends, then cancel and
    /// await the rest. The task set is local, so nothing outlives the epoch.
    async fn run_epoch(&self, account: Arc<C::Account>) -> EpochFault {
        // ---
        let mut tasks: JoinSet<(String, Result<(), EpochFault>)> = JoinSet::new();

        for (nickname, car) in &self.config.cars {
            let account = account.clone();
            let notifier = self.notifier.clone();
            let nickname = nickname.clone();
            let car = car.clone();
            tasks.spawn(async move {
                let result = monitor_vehicle(account, notifier, &nickname, &car).await;
                (nickname, result.map_err(EpochFault::from))
            });
        }

        let state = CommandState {
            account,
            config: self.config.clone(),
            notifier: self.notifier.clone(),
        };
        let addr = self.config.listen_addr();
        tasks.spawn(async move {
            let result = routes::serve(addr, state).await;
            ("command listener".to_string(), result.map_err(EpochFault::from))
        });

        let fault = match tasks.join_next().await {
            Some(Ok((name, Err(fault)))) => {
                error!(task = %name, "Task failed: {}", fault);
                fault
            }
            Some(Ok((name, Ok(())))) => EpochFault::Exited(name),
            Some(Err(e)) => EpochFault::Panicked(e.to_string()),
            None => EpochFault::Exited("epoch".to_string()),
        };

        tasks.shutdown().await;
        info!("All tasks stopped");
        fault
    }

    async fn notify_admin(&self, kind: AlertKind) {
        // ---
        let alert = kind.render(SERVER_NAME);
        dispatch(self.notifier.as_ref(), &self.config.admin_ntfy, &alert).await;
    }
}

async fn monitor_vehicle<S, N>(
    account: Arc<S>,
    notifier: Arc<N>,
    nickname: &str,
    car: &VehicleConfig,
) -> Result<(), ApiError>
where
    S: AccountSession,
    N: AlertSink + ?Sized,
{
    // ---
    let vehicle = account.vehicle(&car.vin).await?;
    VehicleMonitor::new(nickname, car, vehicle, notifier)
        .run()
        .await
}

/// Configured VINs absent from the account, in configuration order.
pub fn missing_vehicles(config: &FleetConfig, account_vins: &[String]) -> Vec<String> {
    // ---
    config
        .cars
        .values()
        .filter(|car| !account_vins.contains(&car.vin))
        .map(|car| car.vin.clone())
        .collect()
}
