//! ClickHouse HTTP client
//!
//! Statements are sent as the body of `POST /` with the target database and
//! bound parameters in the query string. Liveness is checked with `GET /ping`.
//! Both paths are relative to the configured URL, so a reverse proxy prefix
//! such as `https://proxy/clickhouse` is kept.

use super::statement::Statement;
use super::traits::{AnalyticalStore, StoreConnector};
use crate::config::schema::ClickHouseConfig;
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

const USER_HEADER: &str = "X-ClickHouse-User";
const KEY_HEADER: &str = "X-ClickHouse-Key";
const PING_RESPONSE: &str = "Ok.";
const NULL_VALUE: &str = "\\N";

/// Session with a ClickHouse server over HTTP
pub struct ClickHouseClient {
    /// HTTP client for making requests
    client: Client,

    /// Base URL of the HTTP interface
    base_url: Url,

    /// ClickHouse configuration
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Create a new client from configuration
    ///
    /// No request is made; use [`AnalyticalStore::is_alive`] to probe the server.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] for an invalid URL and
    /// [`ExportError::Connection`] if the HTTP client cannot be built.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url).map_err(|e| {
            ExportError::Configuration(format!("Invalid ClickHouse URL '{}': {}", config.url, e))
        })?;

        // Endpoints are joined relative to the base, so it must end in a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            ExportError::Connection(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Base URL of the HTTP interface
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ExportError::Configuration(format!("Invalid ClickHouse URL: {e}")))
    }

    async fn post(&self, statement: &Statement, format: Option<&str>) -> Result<String> {
        let url = self.endpoint("")?;

        let mut request = self
            .client
            .post(url)
            .header(USER_HEADER, &self.config.user)
            .query(&[("database", self.config.database.as_str())]);

        if let Some(format) = format {
            request = request.query(&[("default_format", format)]);
        }

        if let Some(ref password) = self.config.password {
            let key: &str = password.expose_secret().as_ref();
            request = request.header(KEY_HEADER, key);
        }

        let params: Vec<(String, &str)> = statement
            .params()
            .map(|(name, value)| (format!("param_{name}"), value))
            .collect();
        request = request.query(&params);

        tracing::debug!(sql = %statement.sql(), "Sending statement to ClickHouse");

        let response = request
            .body(statement.sql().to_string())
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_request_error)?;

        if !status.is_success() {
            return Err(ExportError::Query(format!(
                "ClickHouse returned status {status}: {}",
                body.trim()
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl AnalyticalStore for ClickHouseClient {
    async fn is_alive(&self) -> bool {
        let url = match self.endpoint("ping") {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response
                .text()
                .await
                .map(|body| body.trim() == PING_RESPONSE)
                .unwrap_or(false),
            Ok(response) => {
                tracing::warn!(
                    base_url = %self.base_url,
                    status = %response.status(),
                    "ClickHouse liveness probe failed"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    base_url = %self.base_url,
                    error = %e,
                    "ClickHouse liveness probe failed"
                );
                false
            }
        }
    }

    async fn fetch_count(&self, statement: &Statement) -> Result<Option<u64>> {
        let body = self.post(statement, Some("TabSeparated")).await?;
        parse_count(&body)
    }

    async fn execute(&self, statement: &Statement) -> Result<()> {
        self.post(statement, None).await.map(|_| ())
    }
}

/// Opens [`ClickHouseClient`] sessions from configuration
#[derive(Debug, Clone)]
pub struct ClickHouseConnector {
    config: ClickHouseConfig,
}

impl ClickHouseConnector {
    /// Create a connector for the configured server
    pub fn new(config: ClickHouseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreConnector for ClickHouseConnector {
    async fn connect(&self) -> Result<Box<dyn AnalyticalStore>> {
        Ok(Box::new(ClickHouseClient::new(self.config.clone())?))
    }
}

fn map_request_error(e: reqwest::Error) -> ExportError {
    if e.is_timeout() {
        ExportError::Timeout(format!("ClickHouse request timed out: {e}"))
    } else {
        ExportError::Query(format!("ClickHouse request failed: {e}"))
    }
}

/// Parses a single-value `TabSeparated` result
fn parse_count(body: &str) -> Result<Option<u64>> {
    let value = body.lines().next().unwrap_or("").trim();

    if value.is_empty() || value == NULL_VALUE {
        return Ok(None);
    }

    value.parse::<u64>().map(Some).map_err(|e| {
        ExportError::Query(format!("Unexpected count result '{value}': {e}"))
    })
}
