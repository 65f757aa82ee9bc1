use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::CommandState;
use crate::alerts::AlertKind;
use crate::client::{AccountSession, VehicleHandle};
use crate::config::VehicleConfig;
use crate::error::ApiError;
use crate::notify::{dispatch, AlertSink};

// ---

pub fn router<A, N>() -> Router<CommandState<A, N>>
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    // ---
    Router::new().route("/", post(handler::<A, N>))
}

/// Body of a climate control trigger.
#[derive(Debug, Deserialize, Serialize)]
pub struct HvacRequest {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
        })
    }

    fn failure(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: Some(message.into()),
        })
    }
}

enum Outcome {
    Started,
    Denied(u8),
}

async fn handler<A, N>(
    State(state): State<CommandState<A, N>>,
    payload: Result<Json<HvacRequest>, JsonRejection>,
) -> (StatusCode, Json<CommandResponse>)
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    // ---
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected climate request: {}", rejection.body_text());
            return (rejection.status(), CommandResponse::failure(rejection.body_text()));
        }
    };
    info!("POST / - climate control requested for '{}'", request.name);

    let Some(car) = state.config.vehicle(&request.name) else {
        return (
            StatusCode::NOT_FOUND,
            CommandResponse::failure("Car name not found in the config file!"),
        );
    };

    match start_climate(&state, &request.name, car).await {
        Ok(Outcome::Started) => (StatusCode::OK, CommandResponse::ok()),
        Ok(Outcome::Denied(percentage)) => (
            StatusCode::FORBIDDEN,
            CommandResponse::failure(format!(
                "Insufficient battery to start the AC ({percentage}%)"
            )),
        ),
        Err(e) => {
            error!("Climate request for '{}' failed: {}", request.name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, CommandResponse::failure(e.to_string()))
        }
    }
}

/// Start the HVAC if the battery allows it, otherwise tell the owner why not.
async fn start_climate<A, N>(
    state: &CommandState<A, N>,
    nickname: &str,
    car: &VehicleConfig,
) -> Result<Outcome, ApiError>
where
    A: AccountSession,
    N: AlertSink + ?Sized,
{
    // ---
    let vehicle = state.account.vehicle(&car.vin).await?;
    let percentage = vehicle
        .battery_status()
        .await?
        .battery_level
        .filter(|p| (0..=100).contains(p))
        .ok_or_else(|| ApiError::Payload("battery level unavailable".to_string()))?
        as u8;

    if percentage > car.hvac_min_battery_percentage {
        vehicle.start_hvac().await?;
        info!("HVAC started for '{}' at {}%", nickname, percentage);
        return Ok(Outcome::Started);
    }

    let alert = AlertKind::HvacDenied { percentage }.render(nickname);
    dispatch(state.notifier.as_ref(), &car.ntfy, &alert).await;
    Ok(Outcome::Denied(percentage))
}
