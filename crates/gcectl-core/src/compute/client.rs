//! HTTP client for the Compute Engine v1 REST API
//!
//! Authentication is a pre-minted bearer token (for example the output of
//! `gcloud auth print-access-token`); minting and refreshing tokens is left to
//! the caller.

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use super::api::ComputeApi;
use super::types::{Firewall, Image, Instance, InstanceList, Operation, Snapshot};
use crate::config::resilience::RetryConfig;
use crate::error::{CoreError, Result};
use crate::retry::with_retry;

pub const DEFAULT_API_URL: &str = "https://compute.googleapis.com/compute/v1";

/// User agent string for gcectl HTTP requests
const GCECTL_USER_AGENT: &str = concat!("gcectl/", env!("CARGO_PKG_VERSION"));

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Compute Engine client bound to one project
#[derive(Clone)]
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: String,
    project: String,
    access_token: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for ComputeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeClient")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .field("access_token", &"***")
            .finish()
    }
}

/// Builder for [`ComputeClient`]
#[derive(Debug, Clone)]
pub struct ComputeClientBuilder {
    base_url: String,
    project: Option<String>,
    access_token: Option<String>,
    timeout: Duration,
    retry: RetryConfig,
}

impl Default for ComputeClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            project: None,
            access_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

impl ComputeClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<ComputeClient> {
        let project = self
            .project
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| CoreError::Configuration("project is required".to_string()))?;
        let access_token = self
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CoreError::Configuration("access token is required".to_string()))?;

        url::Url::parse(&self.base_url).map_err(|e| {
            CoreError::Configuration(format!("invalid API URL '{}': {}", self.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .user_agent(GCECTL_USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| CoreError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(ComputeClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            project,
            access_token,
            retry: self.retry,
        })
    }
}

impl ComputeClient {
    pub fn builder() -> ComputeClientBuilder {
        ComputeClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.base_url,
            urlencoding::encode(&self.project),
            path
        )
    }

    fn zone_url(&self, zone: &str, path: &str) -> String {
        self.project_url(&format!("zones/{}/{}", urlencoding::encode(zone), path))
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        self.send(Method::GET, url, None).await
    }

    /// POST a body; a fresh `requestId` makes retries of the same call idempotent
    async fn post<B: Serialize>(&self, url: String, body: &B) -> Result<Operation> {
        let body = serde_json::to_value(body)
            .map_err(|e| CoreError::Configuration(format!("failed to encode request: {}", e)))?;
        let url = format!("{}?requestId={}", url, uuid::Uuid::new_v4());
        self.send(Method::POST, url, Some(&body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<&Value>,
    ) -> Result<T> {
        let what = format!("{} {}", method, url);
        debug!("{}", what);

        with_retry(&self.retry, &what, || {
            let mut request = self
                .http
                .request(method.clone(), url.as_str())
                .bearer_auth(&self.access_token);
            if let Some(body) = body {
                request = request.json(body);
            }
            async move {
                let response = request.send().await?;
                handle_response(response).await
            }
        })
        .await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        let text = response.text().await?;
        trace!("Response body: {}", text);
        return serde_json::from_str(&text).map_err(|e| CoreError::InvalidResponse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = provider_message(&text).unwrap_or_else(|| {
        if text.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            text
        }
    });
    debug!("Provider returned {}: {}", status, message);
    Err(CoreError::from_status(status.as_u16(), message))
}

/// Extract `error.message` from the provider's JSON error envelope
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[async_trait]
impl ComputeApi for ComputeClient {
    fn project(&self) -> &str {
        &self.project
    }

    async fn list_instances(&self, zone: &str) -> Result<Vec<Instance>> {
        let mut instances = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.zone_url(zone, "instances");
            if let Some(token) = &page_token {
                url = format!("{}?pageToken={}", url, urlencoding::encode(token));
            }
            let page: InstanceList = self.get(url).await?;
            instances.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(instances)
    }

    async fn get_instance(&self, zone: &str, name: &str) -> Result<Instance> {
        self.get(self.zone_url(zone, &format!("instances/{}", urlencoding::encode(name))))
            .await
    }

    async fn insert_instance(&self, zone: &str, instance: &Instance) -> Result<Operation> {
        self.post(self.zone_url(zone, "instances"), instance).await
    }

    async fn get_image_from_family(&self, image_project: &str, family: &str) -> Result<Image> {
        let url = format!(
            "{}/projects/{}/global/images/family/{}",
            self.base_url,
            urlencoding::encode(image_project),
            urlencoding::encode(family)
        );
        self.get(url).await
    }

    async fn create_snapshot(
        &self,
        zone: &str,
        disk: &str,
        snapshot: &Snapshot,
    ) -> Result<Operation> {
        let url = self.zone_url(
            zone,
            &format!("disks/{}/createSnapshot", urlencoding::encode(disk)),
        );
        self.post(url, snapshot).await
    }

    async fn get_snapshot(&self, name: &str) -> Result<Snapshot> {
        self.get(self.project_url(&format!(
            "global/snapshots/{}",
            urlencoding::encode(name)
        )))
        .await
    }

    async fn get_firewall(&self, name: &str) -> Result<Firewall> {
        self.get(self.project_url(&format!(
            "global/firewalls/{}",
            urlencoding::encode(name)
        )))
        .await
    }

    async fn insert_firewall(&self, firewall: &Firewall) -> Result<Operation> {
        self.post(self.project_url("global/firewalls"), firewall)
            .await
    }

    async fn get_zone_operation(&self, zone: &str, operation: &str) -> Result<Operation> {
        self.get(self.zone_url(
            zone,
            &format!("operations/{}", urlencoding::encode(operation)),
        ))
        .await
    }

    async fn get_global_operation(&self, operation: &str) -> Result<Operation> {
        self.get(self.project_url(&format!(
            "global/operations/{}",
            urlencoding::encode(operation)
        )))
        .await
    }
}
