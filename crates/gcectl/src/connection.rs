//! Connection management for the Compute Engine client

use crate::error::Result as CliResult;
use anyhow::Context;
use gcectl_core::config::{Config, DEFAULT_ZONE, RetryConfig, WaitConfig};
use gcectl_core::{ComputeClient, config::ACCESS_TOKEN_ENV};
use std::path::PathBuf;
use tracing::{debug, info, trace};

/// Project used when no profile is involved
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Base URL override, mostly for pointing at a local mock
pub const API_URL_ENV: &str = "GCECTL_API_URL";

/// Per-invocation overrides taken from global flags
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub profile: Option<String>,
    pub zone: Option<String>,
    pub no_retry: bool,
    pub retry_attempts: Option<u32>,
}

/// An authenticated client plus the scope it was built for
#[derive(Debug)]
pub struct Session {
    pub client: ComputeClient,
    /// `None` when credentials came from the environment
    pub profile_name: Option<String>,
    pub project: String,
    pub zone: String,
    pub wait: WaitConfig,
}

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Config file in use, explicit or the platform default
    pub fn resolved_config_path(&self) -> Option<PathBuf> {
        self.config_path
            .clone()
            .or_else(|| Config::config_path().ok())
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Build a client from the environment or a profile
    ///
    /// `GCECTL_ACCESS_TOKEN` plus `GOOGLE_CLOUD_PROJECT` is a complete
    /// credential set and skips profile resolution unless `--profile` was
    /// given. When --config-file is explicitly specified, environment
    /// variables are ignored so the file alone decides.
    pub fn connect(&self, options: &ConnectOptions) -> CliResult<Session> {
        debug!("Creating Compute Engine client");
        trace!("Connect options: {:?}", options);

        let use_env_vars = self.config_path.is_none();
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env = |name: &str| {
            if use_env_vars {
                std::env::var(name).ok().filter(|v| !v.is_empty())
            } else {
                None
            }
        };
        let env_token = env(ACCESS_TOKEN_ENV);
        let env_project = env(PROJECT_ENV);
        let env_api_url = env(API_URL_ENV);

        let (profile_name, project, zone, token, api_url, resilience) =
            match (&env_token, &env_project, &options.profile) {
                (Some(token), Some(project), None) => {
                    info!("Using credentials from environment variables");
                    (
                        None,
                        project.clone(),
                        DEFAULT_ZONE.to_string(),
                        token.clone(),
                        None,
                        Default::default(),
                    )
                }
                _ => {
                    let name = self.config.resolve_profile(options.profile.as_deref())?;
                    info!("Using profile: {}", name);
                    let profile = self.config.profile(&name)?;
                    let token = profile.resolve_access_token(&name)?;
                    (
                        Some(name),
                        profile.project.clone(),
                        profile.zone.clone(),
                        token,
                        Some(profile.api_url.clone()),
                        profile.resilience(),
                    )
                }
            };

        let zone = options.zone.clone().unwrap_or(zone);
        let retry = apply_retry_overrides(resilience.retry, options);
        debug!(project = %project, zone = %zone, retry_enabled = retry.enabled, "Client scope");

        let mut builder = ComputeClient::builder()
            .project(&project)
            .access_token(token)
            .retry(retry);
        if let Some(url) = env_api_url.or(api_url) {
            builder = builder.base_url(url);
        }
        let client = builder.build()?;

        Ok(Session {
            client,
            profile_name,
            project,
            zone,
            wait: resilience.wait,
        })
    }
}

fn apply_retry_overrides(mut retry: RetryConfig, options: &ConnectOptions) -> RetryConfig {
    if let Some(attempts) = options.retry_attempts {
        retry.enabled = true;
        retry.max_attempts = attempts;
    }
    if options.no_retry {
        retry.enabled = false;
    }
    retry
}
