//! Deterministic demo catalog used by the CLI when no catalog file is
//! configured, and by tests.

use rust_decimal::Decimal;

use crate::cpq::catalog::Catalog;
use crate::domain::catalog::{
    Agent, AgentCategory, AgentId, Deliverable, DeliverableId, DeliverableResource, Dependency,
    DependencyId, Resource, Service, ServiceId, ServiceLayer,
};

struct ItemSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    weeks: f64,
    cost: i64,
    resources: &'static [(&'static str, f64)],
}

const SUPPORT_SERVICES: &[ItemSeed] = &[
    ItemSeed {
        id: "cs-intake",
        name: "Ticket Intake Automation",
        description: "Automated triage of inbound tickets",
        weeks: 2.0,
        cost: 8_000,
        resources: &[("AI Engineer", 60.0), ("Product Manager", 40.0)],
    },
    ItemSeed {
        id: "cs-knowledge",
        name: "Knowledge Base Ingestion",
        description: "Ingest help center articles into a searchable store",
        weeks: 3.0,
        cost: 12_000,
        resources: &[("Data Engineer", 70.0), ("AI Engineer", 30.0)],
    },
    ItemSeed {
        id: "cs-dashboard",
        name: "Agent Dashboard",
        description: "Frontend dashboard for support leads",
        weeks: 2.0,
        cost: 6_000,
        resources: &[("Frontend Engineer", 100.0)],
    },
];

const SUPPORT_DEPENDENCIES: &[(ItemSeed, bool)] = &[
    (
        ItemSeed {
            id: "cs-crm-connector",
            name: "CRM Connector",
            description: "Two-way sync with the customer record system",
            weeks: 1.0,
            cost: 3_000,
            resources: &[("Integration Engineer", 100.0)],
        },
        true,
    ),
    (
        ItemSeed {
            id: "cs-voice",
            name: "Voice Channel",
            description: "Telephony bridge for spoken requests",
            weeks: 2.0,
            cost: 5_000,
            resources: &[("AI Engineer", 50.0), ("Integration Engineer", 50.0)],
        },
        false,
    ),
];

const CLAIMS_SERVICES: &[ItemSeed] = &[
    ItemSeed {
        id: "cp-document-analysis",
        name: "Claims Document Analysis",
        description: "Extraction and analysis of submitted claim documents",
        weeks: 4.0,
        cost: 20_000,
        resources: &[("AI Engineer", 50.0), ("Data Scientist", 50.0)],
    },
    ItemSeed {
        id: "cp-fraud-signals",
        name: "Fraud Signal Scoring",
        description: "Risk logic for suspicious claims",
        weeks: 3.0,
        cost: 15_000,
        resources: &[("Data Scientist", 100.0)],
    },
];

const CLAIMS_DEPENDENCIES: &[(ItemSeed, bool)] = &[(
    ItemSeed {
        id: "cp-policy-db",
        name: "Policy Database Sync",
        description: "Nightly sync of active policies",
        weeks: 2.0,
        cost: 4_000,
        resources: &[("Data Engineer", 100.0)],
    },
    true,
)];

struct DeliverableSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    layer: &'static str,
    weeks: f64,
    price: i64,
    resources: &'static [(&'static str, f64)],
}

const DELIVERABLES: &[DeliverableSeed] = &[
    DeliverableSeed {
        id: "di-connectors",
        name: "Source Connectors",
        description: "Connectors for the first three enterprise data sources",
        layer: "Data Ingestion",
        weeks: 2.0,
        price: 5_000,
        resources: &[("Data Engineer", 0.8), ("DevOps Engineer", 0.2)],
    },
    DeliverableSeed {
        id: "inf-landing-zone",
        name: "Cloud Landing Zone",
        description: "Baseline accounts, networking and guardrails",
        layer: "Infrastructure & Cloud",
        weeks: 3.0,
        price: 9_000,
        resources: &[("DevOps Engineer", 1.0)],
    },
    DeliverableSeed {
        id: "obs-tracing",
        name: "LLM Tracing",
        description: "Trace every model call with cost and latency",
        layer: "Observability",
        weeks: 1.0,
        price: 2_500,
        resources: &[("DevOps Engineer", 0.5), ("AI Engineer", 0.5)],
    },
];

pub fn demo_catalog() -> Catalog {
    let agents = vec![
        Agent {
            id: AgentId::from("customer-support"),
            name: "Customer Support Agent".to_owned(),
            category: AgentCategory::Horizontal,
            agent_type: "Customer Experience".to_owned(),
            description: "Resolves customer requests across chat and email".to_owned(),
            services: SUPPORT_SERVICES.iter().map(service).collect(),
            dependencies: SUPPORT_DEPENDENCIES
                .iter()
                .map(|(seed, required)| dependency(seed, *required))
                .collect(),
            tasks: vec!["Answer tier-one questions".to_owned(), "Escalation routing".to_owned()],
        },
        Agent {
            id: AgentId::from("claims-processing"),
            name: "Claims Processing Agent".to_owned(),
            category: AgentCategory::Industry,
            agent_type: "Insurance".to_owned(),
            description: "Speeds up first notice of loss through settlement".to_owned(),
            services: CLAIMS_SERVICES.iter().map(service).collect(),
            dependencies: CLAIMS_DEPENDENCIES
                .iter()
                .map(|(seed, required)| dependency(seed, *required))
                .collect(),
            tasks: vec!["Document intake".to_owned(), "Adjuster hand-off".to_owned()],
        },
    ];

    Catalog::new(agents, ServiceLayer::group(DELIVERABLES.iter().map(deliverable)))
}

fn resources(seed: &ItemSeed) -> Vec<Resource> {
    seed.resources
        .iter()
        .map(|(role, percentage)| Resource { role: (*role).to_owned(), percentage: *percentage })
        .collect()
}

fn service(seed: &ItemSeed) -> Service {
    Service {
        id: ServiceId::from(seed.id),
        name: seed.name.to_owned(),
        description: seed.description.to_owned(),
        time_in_weeks: seed.weeks,
        cost: Decimal::new(seed.cost, 0),
        resources: resources(seed),
    }
}

fn dependency(seed: &ItemSeed, required: bool) -> Dependency {
    Dependency {
        id: DependencyId::from(seed.id),
        name: seed.name.to_owned(),
        description: seed.description.to_owned(),
        time_in_weeks: seed.weeks,
        cost: Decimal::new(seed.cost, 0),
        resources: resources(seed),
        required,
    }
}

fn deliverable(seed: &DeliverableSeed) -> Deliverable {
    Deliverable {
        id: DeliverableId::from(seed.id),
        name: seed.name.to_owned(),
        description: seed.description.to_owned(),
        time_in_weeks: seed.weeks,
        price: Decimal::new(seed.price, 0),
        layer: seed.layer.to_owned(),
        resources: seed
            .resources
            .iter()
            .map(|(role, time_share)| DeliverableResource {
                role: (*role).to_owned(),
                time_share: *time_share,
                weekly_rate: None,
            })
            .collect(),
    }
}
