//! Fleet-control client.
//!
//! # Responsibilities
//! - Read project status and the connector/proxy listing
//! - Change the project mode
//! - Ask the fleet to remove proxies
//!
//! Each operation is exactly one HTTP round-trip with no retry.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::config::validation::validate_api;
use crate::config::{ApiConfig, ConfigError};
use crate::pool::model::{ConnectorView, ProjectMode, ProjectView, ProxyToRemove};
use crate::pool::types::{PoolError, PoolResult};

/// Operations the pipeline needs from the fleet-control service.
#[async_trait]
pub trait PoolControl: Send + Sync {
    async fn get_project(&self) -> PoolResult<ProjectView>;

    async fn set_project_status(&self, status: ProjectMode) -> PoolResult<()>;

    async fn get_all_connectors_and_proxies(&self) -> PoolResult<Vec<ConnectorView>>;

    async fn ask_proxies_to_remove(&self, items: &[ProxyToRemove]) -> PoolResult<()>;
}

#[derive(Serialize)]
struct StatusBody {
    status: ProjectMode,
}

/// HTTP implementation of [`PoolControl`] for the fleet's scraper API.
#[derive(Clone)]
pub struct ScrapoxyClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl ScrapoxyClient {
    /// Build a client from the `[api]` configuration section.
    ///
    /// Fails with [`PoolError::Config`] when the section does not validate.
    pub fn new(config: &ApiConfig) -> PoolResult<Self> {
        validate_api(config).map_err(ConfigError::from)?;

        // Url::join drops the last segment unless the base ends with '/'
        let mut raw = config.url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| PoolError::InvalidUrl(format!("'{}': {}", config.url, e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        tracing::debug!(base_url = %base_url, "Fleet client initialized");

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> PoolResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PoolError::InvalidUrl(format!("'{}' + '{}': {}", self.base_url, path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PoolResult<T> {
        let resp = self
            .http
            .get(self.endpoint(path)?)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let text = check_status(resp).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| PoolError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> PoolResult<()> {
        let resp = self
            .http
            .post(self.endpoint(path)?)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await?;

        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: Response) -> PoolResult<Response> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(PoolError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PoolError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

#[async_trait]
impl PoolControl for ScrapoxyClient {
    async fn get_project(&self) -> PoolResult<ProjectView> {
        self.get_json("scraper/project").await
    }

    async fn set_project_status(&self, status: ProjectMode) -> PoolResult<()> {
        self.post_json("scraper/project/status", &StatusBody { status })
            .await
    }

    async fn get_all_connectors_and_proxies(&self) -> PoolResult<Vec<ConnectorView>> {
        self.get_json("scraper/project/connectors").await
    }

    async fn ask_proxies_to_remove(&self, items: &[ProxyToRemove]) -> PoolResult<()> {
        self.post_json("scraper/project/proxies/remove", items)
            .await
    }
}
