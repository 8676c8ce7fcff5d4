use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

use crate::domain::{measurement::MeasurementRecord, window::MeasurementRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote source of measurement records.
pub trait MeasurementClient: Send + Sync {
    fn fetch_measurements(
        &self,
        request: MeasurementRequest,
    ) -> BoxFuture<'_, Result<Vec<MeasurementRecord>>>;
}

/// Static credential pair sent as HTTP basic auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct HttpMeasurementClient {
    client: Client,
    endpoint: String,
    credentials: Option<Credentials>,
}

impl HttpMeasurementClient {
    pub fn new(endpoint: impl Into<String>, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building measurement HTTP client failed")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch(&self, request: &MeasurementRequest) -> Result<Vec<MeasurementRecord>> {
        let mut builder = self.client.post(&self.endpoint).json(&request.to_wire());
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.login, Some(&credentials.password));
        }

        let response = builder
            .send()
            .await
            .context("measurement request failed")?
            .error_for_status()
            .context("measurement request returned non-success status")?;

        let payload: Value = response
            .json()
            .await
            .context("failed to parse measurement payload")?;
        let records = decode_payload(payload)?;
        debug!("measurement service returned {} records", records.len());
        Ok(records)
    }
}

impl MeasurementClient for HttpMeasurementClient {
    fn fetch_measurements(
        &self,
        request: MeasurementRequest,
    ) -> BoxFuture<'_, Result<Vec<MeasurementRecord>>> {
        async move { self.fetch(&request).await }.boxed()
    }
}

/// The service answers either with a bare array or with the array under
/// `data`. Any other shape is an error, so a failure body never reads as an
/// empty batch. Records that do not decode are skipped.
fn decode_payload(payload: Value) -> Result<Vec<MeasurementRecord>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut fields) => match fields.remove("data") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => {
                let message = fields
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("no data array");
                bail!("measurement payload carries no data: {message}")
            }
            Some(_) => bail!("measurement payload `data` is not an array"),
        },
        _ => bail!("measurement payload is neither an array nor an object"),
    };

    let total = items.len();
    let records: Vec<MeasurementRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("skipping measurement record {idx}: {err}");
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!("kept {} of {total} measurement records", records.len());
    }
    Ok(records)
}
