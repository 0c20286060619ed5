//! Firewall rule creation

use tracing::info;

use crate::compute::{ComputeApi, Firewall, FirewallAllowed, spec::DEFAULT_NETWORK};
use crate::error::Result;
use crate::progress::{WaitOptions, wait_for_operation};

/// Ingress rule opening ports to instances carrying a network tag
#[derive(Debug, Clone)]
pub struct FirewallRule {
    pub name: String,
    pub target_tag: String,
    pub protocol: String,
    pub ports: Vec<u16>,
    pub source_ranges: Vec<String>,
    pub description: Option<String>,
}

impl FirewallRule {
    /// Allow TCP on `ports` from anywhere to instances tagged `target_tag`
    pub fn allow_tcp(name: impl Into<String>, target_tag: impl Into<String>, ports: &[u16]) -> Self {
        Self {
            name: name.into(),
            target_tag: target_tag.into(),
            protocol: "tcp".to_string(),
            ports: ports.to_vec(),
            source_ranges: vec!["0.0.0.0/0".to_string()],
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn source_ranges(mut self, ranges: Vec<String>) -> Self {
        if !ranges.is_empty() {
            self.source_ranges = ranges;
        }
        self
    }

    pub fn to_firewall(&self) -> Firewall {
        Firewall {
            name: self.name.clone(),
            description: self.description.clone(),
            network: Some(DEFAULT_NETWORK.to_string()),
            target_tags: vec![self.target_tag.clone()],
            source_ranges: self.source_ranges.clone(),
            allowed: vec![FirewallAllowed {
                ip_protocol: self.protocol.clone(),
                ports: self.ports.iter().map(u16::to_string).collect(),
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallOutcome {
    Created,
    AlreadyExists,
}

/// Insert the rule and wait for it; an existing rule of the same name counts as success
pub async fn ensure_firewall_rule(
    api: &dyn ComputeApi,
    rule: &FirewallRule,
    options: &WaitOptions,
) -> Result<FirewallOutcome> {
    crate::compute::spec::validate_resource_name(&rule.name)?;

    match api.insert_firewall(&rule.to_firewall()).await {
        Ok(operation) => {
            wait_for_operation(api, &operation.handle(), options).await?;
            info!("Created firewall rule {}", rule.name);
            Ok(FirewallOutcome::Created)
        }
        Err(e) if e.is_conflict() => {
            info!("Firewall rule {} already exists", rule.name);
            Ok(FirewallOutcome::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_body() {
        let fw = FirewallRule::allow_tcp("allow-web-5000", "web", &[5000, 8080])
            .description("web ports")
            .to_firewall();
        assert_eq!(fw.target_tags, vec!["web".to_string()]);
        assert_eq!(fw.allowed[0].ip_protocol, "tcp");
        assert_eq!(fw.allowed[0].ports, vec!["5000".to_string(), "8080".to_string()]);
        assert_eq!(fw.source_ranges, vec!["0.0.0.0/0".to_string()]);
        assert_eq!(fw.description.as_deref(), Some("web ports"));
    }

    #[test]
    fn test_empty_source_ranges_keep_default() {
        let rule = FirewallRule::allow_tcp("r", "t", &[22]).source_ranges(vec![]);
        assert_eq!(rule.source_ranges, vec!["0.0.0.0/0".to_string()]);
    }
}
