use crate::http::error::FetchError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Query string and header pairs. Keys may repeat (`datatypeid=TMAX&datatypeid=TMIN`).
pub type Pairs = [(String, String)];

/// A single GET that yields a JSON document.
///
/// The pipeline only talks to the outside world through this trait, which lets the
/// whole fetch/reshape/persist path run against canned responses.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(
        &self,
        url: &str,
        params: &Pairs,
        headers: &Pairs,
        timeout: Duration,
    ) -> Result<Value, FetchError>;
}

/// [`JsonTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("grid-weather/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JsonTransport for ReqwestTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &Pairs,
        headers: &Pairs,
        timeout: Duration,
    ) -> Result<Value, FetchError> {
        debug!("GET {} with {} query parameters", url, params.len());

        let mut request = self.client.get(url).query(params).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        serde_json::from_str(&body).map_err(|e| FetchError::MalformedBody {
            url: url.to_string(),
            source: e,
        })
    }
}
