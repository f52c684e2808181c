//! HTTP access to HBase info servers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{FetchError, MetricsFetcher};

/// Configuration key holding the region server info port on the master.
pub const REGIONSERVER_INFO_PORT_KEY: &str = "hbase.regionserver.info.port";

/// Fetches JSON documents from info servers over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`, connection
    /// setup included.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch `/conf?format=json` from the master info server at `address`.
    pub async fn fetch_conf(&self, address: &str) -> Result<Value, FetchError> {
        self.get_json(&format!("http://{}/conf?format=json", address))
            .await
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MetricsFetcher for HttpFetcher {
    async fn fetch(&self, address: &str) -> Result<Value, FetchError> {
        self.get_json(&format!("http://{}/metrics?format=json", address))
            .await
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// Look up `key` in a `/conf?format=json` document.
///
/// The servlet answers `{"properties": [{"key": ..., "value": ...}, ...]}`.
pub fn conf_property<'a>(conf: &'a Value, key: &str) -> Option<&'a str> {
    conf.get("properties")?
        .as_array()?
        .iter()
        .find(|p| p.get("key").and_then(Value::as_str) == Some(key))?
        .get("value")?
        .as_str()
}
