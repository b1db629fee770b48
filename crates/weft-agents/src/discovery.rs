//! Agent discovery: load every role's spec and report readiness
//!
//! Discovery never fails because an agent is disabled or its project spec is
//! absent; use [`AgentManager::health_check`] to see what is usable.

use std::path::{Path, PathBuf};

use weft_core::{WeftEnv, WeftRc, agents};

use crate::error::Result;
use crate::spec::SpecAgent;
use crate::types::{AgentInfo, HealthReport};

/// Holds a loaded [`SpecAgent`] for every role, in execution order.
#[derive(Debug)]
pub struct AgentManager {
    /// Project root, if inside a project
    root: Option<PathBuf>,
    agents: Vec<SpecAgent>,
    enabled: Vec<&'static str>,
}

impl AgentManager {
    /// Load all agents, ordered by stage then position within the stage.
    ///
    /// With a project config, only its active agents count as enabled;
    /// without one, all are.
    pub fn discover(project_root: Option<&Path>, config: Option<&WeftRc>) -> Result<Self> {
        let ordered = agents::execution_order();
        let mut loaded = Vec::with_capacity(ordered.len());
        for descriptor in &ordered {
            loaded.push(SpecAgent::load(descriptor, project_root)?);
        }

        let enabled = match config {
            Some(rc) => rc.active_agents().iter().map(|a| a.id).collect(),
            None => ordered.iter().map(|a| a.id).collect(),
        };

        Ok(Self {
            root: project_root.map(Path::to_path_buf),
            agents: loaded,
            enabled,
        })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// All agents in execution order.
    pub fn agents(&self) -> &[SpecAgent] {
        &self.agents
    }

    /// Enabled agents in execution order.
    pub fn enabled_agents(&self) -> Vec<&SpecAgent> {
        self.agents
            .iter()
            .filter(|a| self.enabled.contains(&a.id()))
            .collect()
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.contains(&id)
    }

    /// Look up by id or short name.
    pub fn get(&self, name: &str) -> Option<&SpecAgent> {
        let descriptor = agents::find(name)?;
        self.agents.iter().find(|a| a.id() == descriptor.id)
    }

    pub fn agent_info(&self) -> Vec<AgentInfo> {
        self.agents
            .iter()
            .map(|a| AgentInfo {
                id: a.id().to_string(),
                name: a.descriptor().display_name.to_string(),
                stage: a.descriptor().stage.to_string(),
                spec_version: a.spec_version().to_string(),
                spec_source: a.source().clone(),
                enabled: self.is_enabled(a.id()),
            })
            .collect()
    }

    /// Check the API key and every enabled agent's spec.
    pub fn health_check(&self, env: &WeftEnv) -> HealthReport {
        let mut messages = Vec::new();

        let api_key_present = env.anthropic_api_key().is_some();
        if api_key_present {
            messages.push("Anthropic API key found".to_string());
        } else {
            messages.push(
                "Anthropic API key not set. Export WEFT_ANTHROPIC_API_KEY to run agents.".to_string(),
            );
        }

        let mut specs_ok = true;
        for agent in self.enabled_agents() {
            if agent.spec().trim().is_empty() {
                specs_ok = false;
                messages.push(format!("Agent {} has an empty prompt spec", agent.id()));
            } else {
                messages.push(format!(
                    "Agent {} ready (spec {} from {})",
                    agent.id(),
                    agent.spec_version(),
                    agent.source()
                ));
            }
        }

        HealthReport {
            available: api_key_present && specs_ok,
            api_key_present,
            agents: self.agent_info(),
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_core::ProjectType;

    #[test]
    fn backend_project_enables_subset() {
        let rc = WeftRc::new("demo", ProjectType::Backend);
        let manager = AgentManager::discover(None, Some(&rc)).unwrap();

        let enabled: Vec<_> = manager.enabled_agents().iter().map(|a| a.id()).collect();
        assert_eq!(enabled, vec!["00-meta", "01-architect", "02-openapi", "05-test"]);
        assert_eq!(manager.agents().len(), 6);
    }

    #[test]
    fn lookup_by_short_name() {
        let manager = AgentManager::discover(None, None).unwrap();
        assert_eq!(manager.get("integration").unwrap().id(), "04-integration");
        assert!(manager.get("reviewer").is_none());
    }

    #[test]
    fn health_needs_api_key() {
        let manager = AgentManager::discover(None, None).unwrap();

        let report = manager.health_check(&WeftEnv::default());
        assert!(!report.available);

        let env = WeftEnv::from_pairs([("WEFT_ANTHROPIC_API_KEY", "k")]);
        let report = manager.health_check(&env);
        assert!(report.available);
        assert_eq!(report.agents.len(), 6);
    }
}
