//! Per-vehicle monitoring task.
//!
//! One [`VehicleMonitor`] runs per configured vehicle: sample, sanitize,
//! evaluate, act, sleep. Remote failures propagate to the supervisor
//! untouched; an unavailable reading is the only fault absorbed here.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info, info_span, warn, Instrument};

use crate::client::VehicleHandle;
use crate::config::{NtfyChannel, VehicleConfig};
use crate::error::ApiError;
use crate::notify::{dispatch, AlertSink};

mod ladder;
mod state;

pub use ladder::{EscalationLadder, LadderStep};
pub use state::{Action, LowBatteryAlerts, MonitorState, Thresholds, OVERHEAT_HYSTERESIS};

/// Poll intervals to wait after an unavailable reading.
pub const UNAVAILABLE_COOLDOWN_INTERVALS: u32 = 3;

// ---

pub struct VehicleMonitor<V, N: ?Sized> {
    nickname: String,
    vehicle: V,
    notifier: Arc<N>,
    channel: NtfyChannel,
    thresholds: Thresholds,
    poll_interval: Duration,
}

impl<V, N> VehicleMonitor<V, N>
where
    V: VehicleHandle,
    N: AlertSink + ?Sized,
{
    pub fn new(nickname: &str, cfg: &VehicleConfig, vehicle: V, notifier: Arc<N>) -> Self {
        // ---
        Self {
            nickname: nickname.to_string(),
            vehicle,
            notifier,
            channel: cfg.ntfy.clone(),
            thresholds: Thresholds::from(cfg),
            poll_interval: cfg.poll_interval(),
        }
    }

    /// Run until a remote call fails or the task is cancelled.
    ///
    /// State starts empty on every call; nothing carries over from a
    /// previous run.
    pub async fn run(self) -> Result<(), ApiError> {
        // ---
        let span = info_span!("monitor", vehicle = %self.nickname);
        self.run_loop().instrument(span).await
    }

    async fn run_loop(self) -> Result<(), ApiError> {
        // ---
        info!(every = ?self.poll_interval, "Monitoring started");
        let mut state = MonitorState::default();

        loop {
            let raw = self.vehicle.battery_status().await?;

            let delay = match raw.sanitize() {
                Some(sample) => {
                    debug!(?sample, "Battery sample");
                    for action in state.evaluate(&sample, &self.thresholds) {
                        self.perform(action).await?;
                    }
                    self.poll_interval
                }
                None => {
                    warn!(?raw, "Battery reading unavailable, backing off");
                    self.poll_interval.saturating_mul(UNAVAILABLE_COOLDOWN_INTERVALS)
                }
            };

            tokio::time::sleep(delay).await;
        }
    }

    async fn perform(&self, action: Action) -> Result<(), ApiError> {
        // ---
        match action {
            Action::StartCharging => {
                info!("Charging stalled, sending resume-charging command");
                self.vehicle.start_charging().await
            }
            Action::StartHvac => {
                info!("Charging still stalled, cycling HVAC");
                self.vehicle.start_hvac().await
            }
            Action::Alert(kind) => {
                info!(?kind, "Raising alert");
                let alert = kind.render(&self.nickname);
                dispatch(self.notifier.as_ref(), &self.channel, &alert).await;
                Ok(())
            }
        }
    }
}
