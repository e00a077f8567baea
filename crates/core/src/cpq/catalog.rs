use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::{
    Agent, AgentCategory, AgentId, Deliverable, DeliverableId, Dependency, DependencyId,
    Resource, Service, ServiceId, ServiceLayer,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl CatalogViolation {
    pub fn new(code: &str, message: impl Into<String>, suggestion: Option<&str>) -> Self {
        Self {
            code: code.to_owned(),
            message: message.into(),
            suggestion: suggestion.map(str::to_owned),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog failed validation with {} violation(s)", .0.len())]
    Invalid(Vec<CatalogViolation>),
}

/// Snapshot shape accepted from a catalog provider. Deliverables may arrive
/// already grouped into layers or as flat records carrying a `layer` field.
#[derive(Debug, Default, Deserialize)]
struct CatalogSnapshot {
    #[serde(default)]
    agents: Vec<Agent>,
    #[serde(default)]
    service_layers: Vec<ServiceLayer>,
    #[serde(default)]
    deliverables: Vec<Deliverable>,
}

/// Read-only collection of agents and service layers. All id lookups used by
/// selection and aggregation go through here.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Catalog {
    agents: Vec<Agent>,
    service_layers: Vec<ServiceLayer>,
}

impl Catalog {
    pub fn new(agents: Vec<Agent>, service_layers: Vec<ServiceLayer>) -> Self {
        Self { agents, service_layers }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let snapshot = serde_json::from_str::<CatalogSnapshot>(raw)?;
        let mut service_layers = snapshot.service_layers;
        for layer in ServiceLayer::group(snapshot.deliverables) {
            match service_layers.iter_mut().find(|known| known.layer_name == layer.layer_name) {
                Some(known) => known.deliverables.extend(layer.deliverables),
                None => service_layers.push(layer),
            }
        }

        let catalog = Self::new(snapshot.agents, service_layers);
        let violations = catalog.validate();
        if !violations.is_empty() {
            return Err(CatalogError::Invalid(violations));
        }

        Ok(catalog)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn service_layers(&self) -> &[ServiceLayer] {
        &self.service_layers
    }

    pub fn find_agent(&self, agent_id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| &agent.id == agent_id)
    }

    pub fn find_service(&self, agent_id: &AgentId, service_id: &ServiceId) -> Option<&Service> {
        self.find_agent(agent_id)?.service(service_id)
    }

    pub fn find_dependency(
        &self,
        agent_id: &AgentId,
        dependency_id: &DependencyId,
    ) -> Option<&Dependency> {
        self.find_agent(agent_id)?.dependency(dependency_id)
    }

    pub fn find_deliverable(&self, deliverable_id: &DeliverableId) -> Option<&Deliverable> {
        self.all_deliverables().find(|deliverable| &deliverable.id == deliverable_id)
    }

    pub fn all_deliverables(&self) -> impl Iterator<Item = &Deliverable> {
        self.service_layers.iter().flat_map(|layer| layer.deliverables.iter())
    }

    pub fn deliverables_by_layer(&self, layer_name: &str) -> &[Deliverable] {
        self.service_layers
            .iter()
            .find(|layer| layer.layer_name == layer_name)
            .map(|layer| layer.deliverables.as_slice())
            .unwrap_or(&[])
    }

    pub fn required_dependency_ids(&self, agent_id: &AgentId) -> Vec<DependencyId> {
        self.find_agent(agent_id)
            .map(|agent| agent.required_dependency_ids().cloned().collect())
            .unwrap_or_default()
    }

    pub fn agents_by_category(&self, category: AgentCategory) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(move |agent| agent.category == category)
    }

    pub fn agents_by_type<'a>(&'a self, agent_type: &'a str) -> impl Iterator<Item = &'a Agent> {
        self.agents.iter().filter(move |agent| agent.agent_type == agent_type)
    }

    /// Distinct agent types in catalog order.
    pub fn agent_types(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.agents
            .iter()
            .map(|agent| agent.agent_type.as_str())
            .filter(|agent_type| seen.insert(*agent_type))
            .collect()
    }

    pub fn validate(&self) -> Vec<CatalogViolation> {
        let mut violations = Vec::new();
        let mut agent_ids = HashSet::new();

        for agent in &self.agents {
            let agent_id = agent.id.as_str().trim();
            if agent_id.is_empty() {
                violations.push(CatalogViolation::new(
                    "MISSING_AGENT_ID",
                    format!("agent `{}` is missing an id", agent.name),
                    Some("Give every agent a stable, non-empty id"),
                ));
            } else if !agent_ids.insert(agent_id) {
                violations.push(CatalogViolation::new(
                    "DUPLICATE_AGENT_ID",
                    format!("duplicate agent id: {agent_id}"),
                    Some("Agent ids must be unique across categories"),
                ));
            }

            let mut item_ids = HashSet::new();
            for service in &agent.services {
                check_item(
                    &mut violations,
                    &mut item_ids,
                    agent_id,
                    service.id.as_str(),
                    service.cost,
                    service.time_in_weeks,
                );
                check_resources(&mut violations, service.id.as_str(), &service.resources);
            }
            for dependency in &agent.dependencies {
                check_item(
                    &mut violations,
                    &mut item_ids,
                    agent_id,
                    dependency.id.as_str(),
                    dependency.cost,
                    dependency.time_in_weeks,
                );
                check_resources(&mut violations, dependency.id.as_str(), &dependency.resources);
            }
        }

        let mut deliverable_ids = HashSet::new();
        for deliverable in self.all_deliverables() {
            let deliverable_id = deliverable.id.as_str().trim();
            if deliverable_id.is_empty() {
                violations.push(CatalogViolation::new(
                    "MISSING_DELIVERABLE_ID",
                    format!("deliverable `{}` is missing an id", deliverable.name),
                    None,
                ));
            } else if !deliverable_ids.insert(deliverable_id) {
                violations.push(CatalogViolation::new(
                    "DUPLICATE_DELIVERABLE_ID",
                    format!("duplicate deliverable id: {deliverable_id}"),
                    None,
                ));
            }
            if deliverable.price < Decimal::ZERO {
                violations.push(CatalogViolation::new(
                    "NEGATIVE_COST",
                    format!("deliverable {deliverable_id} has negative price"),
                    Some("Use a non-negative price"),
                ));
            }
            if !(deliverable.time_in_weeks >= 0.0) {
                violations.push(CatalogViolation::new(
                    "NEGATIVE_TIME",
                    format!("deliverable {deliverable_id} has negative or undefined duration"),
                    None,
                ));
            }
            for resource in &deliverable.resources {
                if !(0.0..=1.0).contains(&resource.time_share) {
                    violations.push(CatalogViolation::new(
                        "TIME_SHARE_OUT_OF_RANGE",
                        format!(
                            "deliverable {deliverable_id} gives role `{}` a time share of {}",
                            resource.role, resource.time_share
                        ),
                        Some("Deliverable time shares are fractions between 0 and 1"),
                    ));
                }
            }
        }

        violations
    }
}

fn check_item<'a>(
    violations: &mut Vec<CatalogViolation>,
    seen: &mut HashSet<&'a str>,
    agent_id: &str,
    item_id: &'a str,
    cost: Decimal,
    time_in_weeks: f64,
) {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        violations.push(CatalogViolation::new(
            "MISSING_ITEM_ID",
            format!("agent {agent_id} has a service or dependency without an id"),
            None,
        ));
        return;
    }
    if !seen.insert(item_id) {
        violations.push(CatalogViolation::new(
            "DUPLICATE_ITEM_ID",
            format!("agent {agent_id} repeats service/dependency id {item_id}"),
            Some("Service and dependency ids must be unique within an agent"),
        ));
    }
    if cost < Decimal::ZERO {
        violations.push(CatalogViolation::new(
            "NEGATIVE_COST",
            format!("{item_id} in agent {agent_id} has negative cost"),
            Some("Use a non-negative cost"),
        ));
    }
    if !(time_in_weeks >= 0.0) {
        violations.push(CatalogViolation::new(
            "NEGATIVE_TIME",
            format!("{item_id} in agent {agent_id} has negative or undefined duration"),
            None,
        ));
    }
}

fn check_resources(violations: &mut Vec<CatalogViolation>, item_id: &str, resources: &[Resource]) {
    for resource in resources {
        if !(0.0..=100.0).contains(&resource.percentage) {
            violations.push(CatalogViolation::new(
                "PERCENTAGE_OUT_OF_RANGE",
                format!(
                    "{item_id} gives role `{}` a percentage of {}",
                    resource.role, resource.percentage
                ),
                Some("Service resource percentages are between 0 and 100"),
            ));
        }
    }
}
