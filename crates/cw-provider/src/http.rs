use crate::backend::{CallDirection, CallProvider, CallRecord, ProviderError, TimeWindow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct HttpCallProvider {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallsPage {
    calls: Vec<CallRecord>,
}

impl HttpCallProvider {
    pub fn new(base_url: String, token: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| ProviderError::Unavailable {
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = std::env::var("CALLWATCH_PROVIDER_URL").map_err(|_| {
            ProviderError::Unavailable {
                message: "CALLWATCH_PROVIDER_URL not set".to_string(),
            }
        })?;
        let token = std::env::var("CALLWATCH_PROVIDER_TOKEN").ok();
        Self::new(base_url, token)
    }
}

#[async_trait]
impl CallProvider for HttpCallProvider {
    async fn list_call_records(
        &self,
        window: TimeWindow,
        direction: Option<CallDirection>,
    ) -> Result<Vec<CallRecord>, ProviderError> {
        let mut request = self
            .client
            .get(format!("{}/calls", self.base_url))
            .query(&[
                ("start_time", window.since.to_rfc3339()),
                ("end_time", window.until.to_rfc3339()),
            ]);
        if let Some(direction) = direction {
            let value = match direction {
                CallDirection::Inbound => "inbound",
                CallDirection::Outbound => "outbound",
            };
            request = request.query(&[("direction", value)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ProviderError::Unavailable {
                message: err.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable {
                message: format!("provider returned {}", response.status()),
            });
        }
        let page: CallsPage =
            response
                .json()
                .await
                .map_err(|err| ProviderError::InvalidResponse {
                    message: err.to_string(),
                })?;
        Ok(page.calls)
    }
}
