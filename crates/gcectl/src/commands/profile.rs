//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::GceCtlError;
use crate::output;
use colored::Colorize;
use gcectl_core::config::{CredentialStore, DEFAULT_ZONE, Profile};
use serde_json::json;
use tracing::{debug, info};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &mut ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), GceCtlError> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            project,
            default_zone,
            access_token,
            api_url,
            #[cfg(feature = "secure-storage")]
            use_keyring,
            default,
        } => {
            #[cfg(feature = "secure-storage")]
            let keyring = *use_keyring;
            #[cfg(not(feature = "secure-storage"))]
            let keyring = false;

            let mut profile = Profile::new(project, default_zone.as_deref().unwrap_or(DEFAULT_ZONE));
            profile.access_token = match access_token {
                Some(token) if keyring => Some(store_in_keyring(name, token)?),
                other => other.clone(),
            };
            if let Some(url) = api_url {
                profile.api_url = url.clone();
            }
            // keep resilience settings from an earlier definition
            if let Some(existing) = conn_mgr.config.profiles.get(name) {
                profile.resilience = existing.resilience.clone();
            }

            conn_mgr.config.set_profile(name.clone(), profile);
            if *default || conn_mgr.config.profiles.len() == 1 {
                conn_mgr.config.default_profile = Some(name.clone());
            }
            conn_mgr.save_config()?;
            info!("Saved profile {}", name);
            println!("Profile '{}' saved", name);
            Ok(())
        }
        Remove { name } => {
            if conn_mgr.config.remove_profile(name).is_none() {
                return Err(GceCtlError::ProfileNotFound { name: name.clone() });
            }
            conn_mgr.save_config()?;
            println!("Profile '{}' removed", name);
            Ok(())
        }
        Default { name } => {
            if !conn_mgr.config.profiles.contains_key(name) {
                return Err(GceCtlError::ProfileNotFound { name: name.clone() });
            }
            conn_mgr.config.default_profile = Some(name.clone());
            conn_mgr.save_config()?;
            println!("Default profile set to '{}'", name);
            Ok(())
        }
    }
}

#[cfg(feature = "secure-storage")]
fn store_in_keyring(name: &str, token: &str) -> Result<String, GceCtlError> {
    let reference = CredentialStore::new().store(&format!("{}-access-token", name), token)?;
    debug!("Stored access token for {} in keyring", name);
    Ok(reference)
}

#[cfg(not(feature = "secure-storage"))]
fn store_in_keyring(_name: &str, _token: &str) -> Result<String, GceCtlError> {
    Err(GceCtlError::Configuration(
        "keyring storage requires the secure-storage feature".to_string(),
    ))
}

/// Token as shown to the user: references are safe, literals are masked
fn display_token(token: Option<&str>) -> String {
    match token {
        None => "(not set)".to_string(),
        Some(t) if t.starts_with("${") || CredentialStore::is_keyring_reference(t) => t.to_string(),
        Some(t) if t.len() > 8 => format!("{}...", t.chars().take(4).collect::<String>()),
        Some(_) => "***".to_string(),
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<(), GceCtlError> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    let default = conn_mgr.config.default_profile.as_deref();

    match output_format {
        OutputFormat::Auto => {
            if profiles.is_empty() {
                println!("No profiles configured.");
                println!("Use 'gcectl profile set' to create a profile.");
                return Ok(());
            }
            for (name, profile) in profiles {
                let marker = if Some(name.as_str()) == default {
                    "*".green().bold().to_string()
                } else {
                    " ".to_string()
                };
                println!(
                    "{} {:<16} {:<24} {}",
                    marker,
                    name.bold(),
                    profile.project,
                    profile.zone
                );
            }
            Ok(())
        }
        format => {
            let rows: Vec<_> = profiles
                .iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "project": profile.project,
                        "zone": profile.zone,
                        "default": Some(name.as_str()) == default,
                    })
                })
                .collect();
            output::print_output(rows, format.into())?;
            Ok(())
        }
    }
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<(), GceCtlError> {
    let path = conn_mgr
        .resolved_config_path()
        .map(|p| p.display().to_string())
        .ok_or_else(|| GceCtlError::Configuration("Failed to determine config directory".to_string()))?;

    match output_format {
        OutputFormat::Json | OutputFormat::Yaml => {
            output::print_output(json!({ "path": path }), output_format.into())?;
        }
        _ => println!("{}", path),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> Result<(), GceCtlError> {
    let profile = conn_mgr.config.profile(name)?;
    let resilience = profile.resilience();
    let data = json!({
        "name": name,
        "project": profile.project,
        "zone": profile.zone,
        "api_url": profile.api_url,
        "access_token": display_token(profile.access_token.as_deref()),
        "default": conn_mgr.config.default_profile.as_deref() == Some(name),
        "poll_interval_secs": resilience.wait.poll_interval_secs,
        "wait_timeout_secs": resilience.wait.timeout_secs,
        "retry_enabled": resilience.retry.enabled,
        "retry_attempts": resilience.retry.max_attempts,
    });

    match output_format {
        OutputFormat::Auto => {
            println!("Profile: {}", name.bold());
            println!("Project:      {}", profile.project);
            println!("Zone:         {}", profile.zone);
            println!("API URL:      {}", profile.api_url);
            println!(
                "Access token: {}",
                display_token(profile.access_token.as_deref())
            );
            Ok(())
        }
        format => {
            output::print_output(data, format.into())?;
            Ok(())
        }
    }
}
