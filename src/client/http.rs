//! HTTP client for a Kamereon-style vehicle gateway.
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{AccountSession, VehicleApi, VehicleHandle, VehicleListing};
use crate::config::Credentials;
use crate::error::ApiError;
use crate::models::RawBatteryStatus;

// ---

#[derive(Debug, Clone)]
pub struct HttpVehicleApi {
    http: Client,
    base_url: String,
    locale: String,
}

impl HttpVehicleApi {
    pub fn new(http: Client, base_url: &str, locale: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            locale: locale.to_string(),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    locale: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    account_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehiclesResponse {
    #[serde(default)]
    vehicle_links: Vec<VehicleLink>,
    #[serde(default)]
    errors: Vec<GatewayError>,
}

#[derive(Deserialize)]
struct VehicleLink {
    vin: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayError {
    error_code: String,
    #[serde(default)]
    error_message: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: AttributesEnvelope<T>,
}

#[derive(Deserialize)]
struct AttributesEnvelope<T> {
    attributes: T,
}

/// Map non-2xx statuses onto the fault taxonomy.
async fn check(response: Response) -> Result<Response, ApiError> {
    // ---
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::QuotaExceeded(message),
        StatusCode::UNAUTHORIZED => ApiError::Auth(message),
        _ => ApiError::Response {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl VehicleApi for HttpVehicleApi {
    type Account = HttpAccount;

    async fn login(&self, credentials: &Credentials) -> Result<HttpAccount, ApiError> {
        // ---
        let url = format!("{}/auth/login", self.base_url);
        debug!("Logging in as {} at {}", credentials.email, url);

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
                locale: &self.locale,
            })
            .send()
            .await?;
        let login: LoginResponse = check(response).await?.json().await?;

        Ok(HttpAccount {
            inner: Arc::new(AccountInner {
                http: self.http.clone(),
                account_url: format!("{}/accounts/{}", self.base_url, login.account_id),
                token: login.token,
            }),
        })
    }
}

#[derive(Debug)]
struct AccountInner {
    http: Client,
    account_url: String,
    token: String,
}

impl AccountInner {
    async fn get(&self, url: &str) -> Result<Response, ApiError> {
        // ---
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        check(response).await
    }

    async fn post_action(&self, url: &str, action_type: &str) -> Result<(), ApiError> {
        // ---
        let body = json!({
            "data": {
                "type": action_type,
                "attributes": { "action": "start" }
            }
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

/// Authenticated gateway account.
#[derive(Debug, Clone)]
pub struct HttpAccount {
    inner: Arc<AccountInner>,
}

#[async_trait]
impl AccountSession for HttpAccount {
    type Vehicle = HttpVehicle;

    async fn list_vehicles(&self) -> Result<VehicleListing, ApiError> {
        // ---
        let url = format!("{}/vehicles", self.inner.account_url);
        let listing: VehiclesResponse = self.inner.get(&url).await?.json().await?;

        if let Some(err) = listing.errors.first() {
            return Ok(VehicleListing::SoftError(format!(
                "{}: {}",
                err.error_code, err.error_message
            )));
        }
        Ok(VehicleListing::Vehicles(
            listing.vehicle_links.into_iter().map(|l| l.vin).collect(),
        ))
    }

    async fn vehicle(&self, vin: &str) -> Result<HttpVehicle, ApiError> {
        // ---
        Ok(HttpVehicle {
            account: self.inner.clone(),
            car_url: format!("{}/kamereon/kca/car-adapter", self.inner.account_url),
            vin: vin.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpVehicle {
    account: Arc<AccountInner>,
    car_url: String,
    vin: String,
}

#[async_trait]
impl VehicleHandle for HttpVehicle {
    async fn battery_status(&self) -> Result<RawBatteryStatus, ApiError> {
        // ---
        let url = format!("{}/v2/cars/{}/battery-status", self.car_url, self.vin);
        let envelope: DataEnvelope<RawBatteryStatus> = self.account.get(&url).await?.json().await?;
        Ok(envelope.data.attributes)
    }

    async fn start_charging(&self) -> Result<(), ApiError> {
        // ---
        let url = format!("{}/v1/cars/{}/actions/charging-start", self.car_url, self.vin);
        self.account.post_action(&url, "ChargingStart").await
    }

    async fn start_hvac(&self) -> Result<(), ApiError> {
        // ---
        let url = format!("{}/v1/cars/{}/actions/hvac-start", self.car_url, self.vin);
        self.account.post_action(&url, "HvacStart").await
    }
}
