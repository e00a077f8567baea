//! Best-effort grouping of catalog items for display.
//!
//! These are keyword heuristics over free text, not domain data: a service
//! whose name happens to contain "ui" lands in the interface layer whether or
//! not it has anything to do with user interfaces. Nothing in selection or
//! pricing depends on the result.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Agent, Service};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLayerKind {
    Data,
    Interface,
    Logic,
    Core,
}

impl ServiceLayerKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Data => "Data Layer",
            Self::Interface => "Interface Layer",
            Self::Logic => "Logic Layer",
            Self::Core => "Core Layer",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableCategory {
    Deployment,
    DataIngestion,
    Inference,
    Rag,
    Integrations,
    Frontend,
    Other,
}

impl DeliverableCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::DataIngestion => "Data Ingestion",
            Self::Inference => "Inference",
            Self::Rag => "RAG",
            Self::Integrations => "Integrations",
            Self::Frontend => "Frontend",
            Self::Other => "Other",
        }
    }
}

/// Rows are tried top to bottom against the lower-cased name and description.
pub const SERVICE_LAYER_KEYWORDS: &[(ServiceLayerKind, &[&str])] = &[
    (ServiceLayerKind::Data, &["data", "database", "ingestion"]),
    (ServiceLayerKind::Interface, &["interface", "ui", "frontend", "dashboard"]),
    (ServiceLayerKind::Logic, &["logic", "processing", "analysis", "automation"]),
];

/// Rows are tried top to bottom against the lower-cased layer name.
pub const DELIVERABLE_CATEGORY_KEYWORDS: &[(DeliverableCategory, &[&str])] = &[
    (DeliverableCategory::Deployment, &["deployment", "infrastructure", "cloud"]),
    (DeliverableCategory::DataIngestion, &["data", "ingestion"]),
    (DeliverableCategory::Inference, &["inference", "llm"]),
    (DeliverableCategory::Rag, &["rag", "retrieval"]),
    (DeliverableCategory::Integrations, &["integration", "api"]),
    (DeliverableCategory::Frontend, &["frontend", "ui"]),
];

pub fn classify_service(name: &str, description: &str) -> ServiceLayerKind {
    let name = name.to_lowercase();
    let description = description.to_lowercase();

    first_match(SERVICE_LAYER_KEYWORDS, |keyword| {
        name.contains(keyword) || description.contains(keyword)
    })
    .unwrap_or(ServiceLayerKind::Core)
}

pub fn classify_deliverable_layer(layer: &str) -> DeliverableCategory {
    let layer = layer.to_lowercase();
    first_match(DELIVERABLE_CATEGORY_KEYWORDS, |keyword| layer.contains(keyword))
        .unwrap_or(DeliverableCategory::Other)
}

/// Services of an agent grouped by heuristic layer, in first-seen layer order.
pub fn group_services_by_layer(agent: &Agent) -> Vec<(ServiceLayerKind, Vec<&Service>)> {
    let mut groups: Vec<(ServiceLayerKind, Vec<&Service>)> = Vec::new();
    for service in &agent.services {
        let kind = classify_service(&service.name, &service.description);
        match groups.iter_mut().find(|(known, _)| *known == kind) {
            Some((_, services)) => services.push(service),
            None => groups.push((kind, vec![service])),
        }
    }
    groups
}

fn first_match<K: Copy>(table: &[(K, &[&str])], matches: impl Fn(&str) -> bool) -> Option<K> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| matches(keyword)))
        .map(|(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::{
        classify_deliverable_layer, classify_service, group_services_by_layer,
        DeliverableCategory, ServiceLayerKind,
    };
    use crate::domain::catalog::AgentId;
    use crate::fixtures::demo_catalog;

    #[test]
    fn earlier_rows_win_over_later_rows() {
        assert_eq!(classify_service("Data Dashboard", ""), ServiceLayerKind::Data);
        assert_eq!(
            classify_service("Agent Console", "Frontend for data analysis"),
            ServiceLayerKind::Data
        );
        assert_eq!(classify_service("Workflow Automation", ""), ServiceLayerKind::Logic);
        assert_eq!(classify_service("Onboarding", "Kickoff workshop"), ServiceLayerKind::Core);
    }

    #[test]
    fn substring_matching_is_heuristic() {
        // "guide" contains "ui"
        assert_eq!(classify_service("Style Guide", ""), ServiceLayerKind::Interface);
    }

    #[test]
    fn deliverable_layers_map_to_categories() {
        assert_eq!(
            classify_deliverable_layer("Infrastructure & Cloud"),
            DeliverableCategory::Deployment
        );
        assert_eq!(
            classify_deliverable_layer("Data Ingestion"),
            DeliverableCategory::DataIngestion
        );
        assert_eq!(classify_deliverable_layer("LLM Training"), DeliverableCategory::Inference);
        assert_eq!(classify_deliverable_layer("RAG Pipelines"), DeliverableCategory::Rag);
        assert_eq!(classify_deliverable_layer("Observability"), DeliverableCategory::Other);
        assert_eq!(DeliverableCategory::Rag.label(), "RAG");
    }

    #[test]
    fn groups_demo_agent_services() {
        let catalog = demo_catalog();
        let agent = catalog.find_agent(&AgentId::from("customer-support")).expect("agent");

        let groups = group_services_by_layer(agent);
        let kinds = groups.iter().map(|(kind, _)| *kind).collect::<Vec<_>>();

        assert_eq!(
            kinds,
            vec![ServiceLayerKind::Logic, ServiceLayerKind::Data, ServiceLayerKind::Interface]
        );
        assert!(groups.iter().all(|(_, services)| services.len() == 1));
    }
}
