use agentquote_core::cpq::aggregation::summarize_agent;
use agentquote_core::cpq::catalog::Catalog;
use agentquote_core::cpq::classifier::{classify_deliverable_layer, group_services_by_layer};
use agentquote_core::cpq::search::{search_agents, search_deliverables, AgentFilter};
use agentquote_core::domain::catalog::{Agent, AgentCategory, Deliverable};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{load_context, to_pretty_json, CommandResult, EXIT_INVALID_ARGUMENT};

#[derive(Clone, Debug, Default)]
pub struct CatalogArgs {
    pub search: Option<String>,
    pub category: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct CatalogReport {
    currency: String,
    agents: Vec<AgentCard>,
    service_layers: Vec<LayerCard>,
}

#[derive(Debug, Serialize)]
struct AgentCard {
    id: String,
    name: String,
    category: AgentCategory,
    agent_type: String,
    total_cost: Decimal,
    total_time_weeks: f64,
    required_dependencies: Vec<String>,
    service_groups: Vec<ServiceGroup>,
}

#[derive(Debug, Serialize)]
struct ServiceGroup {
    layer: &'static str,
    service_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LayerCard {
    layer_name: String,
    category: &'static str,
    deliverables: Vec<DeliverableCard>,
}

#[derive(Debug, Serialize)]
struct DeliverableCard {
    id: String,
    name: String,
    price: Decimal,
    time_in_weeks: f64,
}

pub fn run(args: CatalogArgs) -> CommandResult {
    let context = match load_context("catalog") {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let category = match args.category.as_deref().map(str::parse::<AgentCategory>).transpose() {
        Ok(category) => category,
        Err(message) => {
            return CommandResult::failure(
                "catalog",
                "invalid_argument",
                message,
                EXIT_INVALID_ARGUMENT,
            )
        }
    };

    let query = args.search.unwrap_or_default();
    let filter = AgentFilter { category, agent_type: None };
    let report = build_report(&context.catalog, &query, &filter, &context.config.quote.currency);

    if args.json {
        return to_pretty_json("catalog", &report);
    }
    CommandResult::report(render_human(&report))
}

fn build_report(
    catalog: &Catalog,
    query: &str,
    filter: &AgentFilter,
    currency: &str,
) -> CatalogReport {
    let agents = search_agents(catalog, query, filter).into_iter().map(agent_card).collect();

    let mut service_layers: Vec<LayerCard> = Vec::new();
    for deliverable in search_deliverables(catalog, query) {
        let card = deliverable_card(deliverable);
        match service_layers.iter_mut().find(|layer| layer.layer_name == deliverable.layer) {
            Some(layer) => layer.deliverables.push(card),
            None => service_layers.push(LayerCard {
                layer_name: deliverable.layer.clone(),
                category: classify_deliverable_layer(&deliverable.layer).label(),
                deliverables: vec![card],
            }),
        }
    }

    CatalogReport { currency: currency.to_string(), agents, service_layers }
}

fn agent_card(agent: &Agent) -> AgentCard {
    let summary = summarize_agent(agent);
    AgentCard {
        id: agent.id.to_string(),
        name: agent.name.clone(),
        category: agent.category,
        agent_type: agent.agent_type.clone(),
        total_cost: summary.total_cost,
        total_time_weeks: summary.total_time_weeks,
        required_dependencies: agent.required_dependency_ids().map(ToString::to_string).collect(),
        service_groups: group_services_by_layer(agent)
            .into_iter()
            .map(|(kind, services)| ServiceGroup {
                layer: kind.label(),
                service_ids: services.iter().map(|service| service.id.to_string()).collect(),
            })
            .collect(),
    }
}

fn deliverable_card(deliverable: &Deliverable) -> DeliverableCard {
    DeliverableCard {
        id: deliverable.id.to_string(),
        name: deliverable.name.clone(),
        price: deliverable.price,
        time_in_weeks: deliverable.time_in_weeks,
    }
}

fn render_human(report: &CatalogReport) -> String {
    let mut lines = vec![format!("agents ({}):", report.agents.len())];
    for agent in &report.agents {
        lines.push(format!(
            "- {} [{}] {} / {}: {} {} over {} weeks",
            agent.id,
            agent.category.as_str(),
            agent.name,
            agent.agent_type,
            agent.total_cost,
            report.currency,
            agent.total_time_weeks
        ));
        for group in &agent.service_groups {
            lines.push(format!("    {}: {}", group.layer, group.service_ids.join(", ")));
        }
        if !agent.required_dependencies.is_empty() {
            lines.push(format!("    required: {}", agent.required_dependencies.join(", ")));
        }
    }

    lines.push(format!("service layers ({}):", report.service_layers.len()));
    for layer in &report.service_layers {
        lines.push(format!("- {} ({})", layer.layer_name, layer.category));
        for deliverable in &layer.deliverables {
            lines.push(format!(
                "    {} {}: {} {} over {} weeks",
                deliverable.id,
                deliverable.name,
                deliverable.price,
                report.currency,
                deliverable.time_in_weeks
            ));
        }
    }

    lines.join("\n")
}
