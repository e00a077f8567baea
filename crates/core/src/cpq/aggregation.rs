use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::cpq::selection::SelectionState;
use crate::domain::catalog::{Agent, AgentId, Resource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Service,
    Dependency,
    Deliverable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub kind: LineItemKind,
    pub agent_id: Option<AgentId>,
    pub item_id: String,
    pub name: String,
    pub cost: Decimal,
    pub time_in_weeks: f64,
}

/// Derived totals for a selection. Recomputed from scratch on every call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub total_cost: Decimal,
    /// Sum of item durations, rounded to one decimal place.
    pub total_time_weeks: f64,
    /// Role to share of total person-weeks, 0-100. Empty when nothing is staffed.
    pub resource_allocation: BTreeMap<String, u32>,
    pub service_count: usize,
    pub dependency_count: usize,
    pub line_items: Vec<QuoteLineItem>,
}

impl QuoteSummary {
    /// Whole-week duration used as the baseline for timeline pricing.
    pub fn standard_weeks(&self) -> u32 {
        round_to_weeks(self.total_time_weeks)
    }

    pub fn item_count(&self) -> usize {
        self.service_count + self.dependency_count
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSubtotal {
    pub agent_id: AgentId,
    pub cost: Decimal,
    pub time_in_weeks: f64,
    pub service_count: usize,
    pub dependency_count: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    total_cost: Decimal,
    total_time: f64,
    service_count: usize,
    dependency_count: usize,
    person_weeks: BTreeMap<String, f64>,
    total_person_weeks: f64,
    line_items: Vec<QuoteLineItem>,
}

impl Accumulator {
    fn add_item(&mut self, item: QuoteLineItem) {
        self.total_cost += item.cost;
        self.total_time += item.time_in_weeks;
        match item.kind {
            LineItemKind::Service | LineItemKind::Deliverable => self.service_count += 1,
            LineItemKind::Dependency => self.dependency_count += 1,
        }
        self.line_items.push(item);
    }

    fn add_person_weeks(&mut self, role: &str, person_weeks: f64) {
        *self.person_weeks.entry(role.to_owned()).or_insert(0.0) += person_weeks;
        self.total_person_weeks += person_weeks;
    }

    fn add_percentage_resources(&mut self, resources: &[Resource], time_in_weeks: f64) {
        for resource in resources {
            self.add_person_weeks(&resource.role, resource.percentage / 100.0 * time_in_weeks);
        }
    }

    fn finish(self) -> QuoteSummary {
        QuoteSummary {
            total_cost: self.total_cost,
            total_time_weeks: round_to_tenth(self.total_time),
            resource_allocation: allocation_shares(&self.person_weeks, self.total_person_weeks),
            service_count: self.service_count,
            dependency_count: self.dependency_count,
            line_items: self.line_items,
        }
    }
}

pub trait AggregationEngine: Send + Sync {
    fn aggregate(&self, selection: &SelectionState, catalog: &Catalog) -> QuoteSummary;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicAggregationEngine;

impl AggregationEngine for DeterministicAggregationEngine {
    fn aggregate(&self, selection: &SelectionState, catalog: &Catalog) -> QuoteSummary {
        aggregate(selection, catalog)
    }
}

/// Totals cost, time and role allocation over every selected service,
/// dependency and deliverable. Ids the catalog does not know contribute nothing.
pub fn aggregate(selection: &SelectionState, catalog: &Catalog) -> QuoteSummary {
    let mut acc = Accumulator::default();

    for selected in &selection.selected_agents {
        let Some(agent) = catalog.find_agent(&selected.agent_id) else {
            continue;
        };
        let services =
            agent.services.iter().filter(|s| selected.selected_service_ids.contains(&s.id));
        for service in services {
            acc.add_percentage_resources(&service.resources, service.time_in_weeks);
            acc.add_item(QuoteLineItem {
                kind: LineItemKind::Service,
                agent_id: Some(agent.id.clone()),
                item_id: service.id.to_string(),
                name: service.name.clone(),
                cost: service.cost,
                time_in_weeks: service.time_in_weeks,
            });
        }
    }

    for selected in &selection.selected_agents {
        let Some(agent) = catalog.find_agent(&selected.agent_id) else {
            continue;
        };
        for dependency in
            agent.dependencies.iter().filter(|d| selected.selected_dependency_ids.contains(&d.id))
        {
            acc.add_percentage_resources(&dependency.resources, dependency.time_in_weeks);
            acc.add_item(QuoteLineItem {
                kind: LineItemKind::Dependency,
                agent_id: Some(agent.id.clone()),
                item_id: dependency.id.to_string(),
                name: dependency.name.clone(),
                cost: dependency.cost,
                time_in_weeks: dependency.time_in_weeks,
            });
        }
    }

    for deliverable_id in &selection.selected_deliverable_ids {
        let Some(deliverable) = catalog.find_deliverable(deliverable_id) else {
            continue;
        };
        for resource in &deliverable.resources {
            acc.add_person_weeks(&resource.role, resource.time_share * deliverable.time_in_weeks);
        }
        acc.add_item(QuoteLineItem {
            kind: LineItemKind::Deliverable,
            agent_id: None,
            item_id: deliverable.id.to_string(),
            name: deliverable.name.clone(),
            cost: deliverable.price,
            time_in_weeks: deliverable.time_in_weeks,
        });
    }

    acc.finish()
}

/// Catalog-card totals for an agent as if every service were selected.
/// Dependencies are not included.
pub fn summarize_agent(agent: &Agent) -> QuoteSummary {
    let mut acc = Accumulator::default();
    for service in &agent.services {
        acc.add_percentage_resources(&service.resources, service.time_in_weeks);
        acc.add_item(QuoteLineItem {
            kind: LineItemKind::Service,
            agent_id: Some(agent.id.clone()),
            item_id: service.id.to_string(),
            name: service.name.clone(),
            cost: service.cost,
            time_in_weeks: service.time_in_weeks,
        });
    }
    acc.finish()
}

/// Cost and time of one agent's currently selected services and dependencies.
pub fn agent_subtotal(
    selection: &SelectionState,
    catalog: &Catalog,
    agent_id: &AgentId,
) -> Option<AgentSubtotal> {
    let selected = selection.selected_agent(agent_id)?;
    let agent = catalog.find_agent(agent_id)?;

    let services = agent.services.iter().filter(|s| selected.selected_service_ids.contains(&s.id));
    let dependencies =
        agent.dependencies.iter().filter(|d| selected.selected_dependency_ids.contains(&d.id));

    let mut subtotal = AgentSubtotal {
        agent_id: agent_id.clone(),
        cost: Decimal::ZERO,
        time_in_weeks: 0.0,
        service_count: 0,
        dependency_count: 0,
    };
    for service in services {
        subtotal.cost += service.cost;
        subtotal.time_in_weeks += service.time_in_weeks;
        subtotal.service_count += 1;
    }
    for dependency in dependencies {
        subtotal.cost += dependency.cost;
        subtotal.time_in_weeks += dependency.time_in_weeks;
        subtotal.dependency_count += 1;
    }

    Some(subtotal)
}

pub fn round_to_weeks(weeks: f64) -> u32 {
    if weeks.is_finite() && weeks > 0.0 {
        weeks.round() as u32
    } else {
        0
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn allocation_shares(person_weeks: &BTreeMap<String, f64>, total: f64) -> BTreeMap<String, u32> {
    if total <= 0.0 {
        return BTreeMap::new();
    }

    person_weeks
        .iter()
        .map(|(role, weeks)| (role.clone(), (weeks / total * 100.0).round() as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::{agent_subtotal, aggregate, summarize_agent, LineItemKind};
    use crate::cpq::catalog::Catalog;
    use crate::cpq::selection::SelectionState;
    use crate::domain::catalog::{
        Agent, AgentCategory, AgentId, Deliverable, DeliverableId, DeliverableResource,
        DependencyId, Resource, Service, ServiceId, ServiceLayer,
    };
    use crate::fixtures::demo_catalog;

    fn service(id: &str, cost: i64, weeks: f64, resources: Vec<(&str, f64)>) -> Service {
        Service {
            id: ServiceId::from(id),
            name: id.to_owned(),
            description: String::new(),
            time_in_weeks: weeks,
            cost: Decimal::new(cost, 0),
            resources: resources
                .into_iter()
                .map(|(role, percentage)| Resource { role: role.to_owned(), percentage })
                .collect(),
        }
    }

    fn single_agent_catalog(services: Vec<Service>) -> Catalog {
        Catalog::new(
            vec![Agent {
                id: AgentId::from("agent"),
                name: "Agent".to_owned(),
                category: AgentCategory::Horizontal,
                agent_type: "Ops".to_owned(),
                description: String::new(),
                services,
                dependencies: Vec::new(),
                tasks: Vec::new(),
            }],
            Vec::new(),
        )
    }

    #[test]
    fn two_service_agent_totals_cost_time_and_allocation() {
        let catalog = single_agent_catalog(vec![
            service("a", 100, 2.0, vec![("Eng", 50.0)]),
            service("b", 200, 3.0, vec![("Eng", 100.0)]),
        ]);
        let agent = catalog.find_agent(&AgentId::from("agent")).expect("agent");
        let state = SelectionState::new().toggle_agent(agent, true);

        let summary = aggregate(&state, &catalog);

        assert_eq!(summary.total_cost, Decimal::new(300, 0));
        assert_eq!(summary.total_time_weeks, 5.0);
        assert_eq!(summary.resource_allocation, BTreeMap::from([("Eng".to_owned(), 100)]));
        assert_eq!(summary.service_count, 2);
        assert_eq!(summary.dependency_count, 0);
        assert_eq!(summary.standard_weeks(), 5);
    }

    #[test]
    fn empty_selection_has_zero_totals_and_no_allocation() {
        let summary = aggregate(&SelectionState::new(), &demo_catalog());

        assert_eq!(summary.total_cost, Decimal::ZERO);
        assert_eq!(summary.total_time_weeks, 0.0);
        assert!(summary.resource_allocation.is_empty());
        assert!(summary.line_items.is_empty());
    }

    #[test]
    fn unstaffed_services_yield_empty_allocation() {
        let catalog = single_agent_catalog(vec![service("a", 100, 2.0, Vec::new())]);
        let agent = catalog.find_agent(&AgentId::from("agent")).expect("agent");
        let summary = aggregate(&SelectionState::new().toggle_agent(agent, true), &catalog);

        assert_eq!(summary.total_cost, Decimal::new(100, 0));
        assert!(summary.resource_allocation.is_empty());
    }

    #[test]
    fn dependencies_and_deliverables_contribute_with_their_own_scales() {
        let catalog = demo_catalog();
        let support = AgentId::from("customer-support");
        let agent = catalog.find_agent(&support).expect("agent");
        let state = SelectionState::new()
            .toggle_agent(agent, true)
            .toggle_deliverable(&DeliverableId::from("obs-tracing"), true);

        let summary = aggregate(&state, &catalog);

        // services 8000 + 12000 + 6000, required connector 3000, tracing 2500
        assert_eq!(summary.total_cost, Decimal::new(31_500, 0));
        assert_eq!(summary.total_time_weeks, 9.0);
        assert_eq!(summary.service_count, 4);
        assert_eq!(summary.dependency_count, 1);
        assert_eq!(
            summary.line_items.iter().map(|item| item.kind).collect::<Vec<_>>(),
            vec![
                LineItemKind::Service,
                LineItemKind::Service,
                LineItemKind::Service,
                LineItemKind::Dependency,
                LineItemKind::Deliverable,
            ]
        );
        let total_share: u32 = summary.resource_allocation.values().sum();
        assert!((99..=101).contains(&total_share), "shares summed to {total_share}");
    }

    #[test]
    fn deliverable_time_share_is_a_fraction() {
        let catalog = Catalog::new(
            Vec::new(),
            vec![ServiceLayer {
                layer_name: "Observability".to_owned(),
                deliverables: vec![Deliverable {
                    id: DeliverableId::from("d"),
                    name: "D".to_owned(),
                    description: String::new(),
                    time_in_weeks: 4.0,
                    price: Decimal::new(400, 0),
                    layer: "Observability".to_owned(),
                    resources: vec![
                        DeliverableResource {
                            role: "Ops".to_owned(),
                            time_share: 0.75,
                            weekly_rate: None,
                        },
                        DeliverableResource {
                            role: "Eng".to_owned(),
                            time_share: 0.25,
                            weekly_rate: None,
                        },
                    ],
                }],
            }],
        );
        let state = SelectionState::new().toggle_deliverable(&DeliverableId::from("d"), true);

        let summary = aggregate(&state, &catalog);

        assert_eq!(
            summary.resource_allocation,
            BTreeMap::from([("Eng".to_owned(), 25), ("Ops".to_owned(), 75)])
        );
        assert_eq!(summary.service_count, 1);
    }

    #[test]
    fn total_time_is_rounded_to_one_decimal() {
        let catalog = single_agent_catalog(vec![
            service("a", 1, 0.33, Vec::new()),
            service("b", 1, 0.33, Vec::new()),
        ]);
        let agent = catalog.find_agent(&AgentId::from("agent")).expect("agent");
        let summary = aggregate(&SelectionState::new().toggle_agent(agent, true), &catalog);

        assert_eq!(summary.total_time_weeks, 0.7);
        assert_eq!(summary.standard_weeks(), 1);
    }

    #[test]
    fn unknown_deliverable_ids_contribute_nothing() {
        let state = SelectionState::new().toggle_deliverable(&DeliverableId::from("ghost"), true);
        let summary = aggregate(&state, &demo_catalog());

        assert_eq!(summary.total_cost, Decimal::ZERO);
        assert_eq!(summary.service_count, 0);
    }

    #[test]
    fn agent_summary_covers_all_services() {
        let catalog = demo_catalog();
        let agent = catalog.find_agent(&AgentId::from("customer-support")).expect("agent");

        let summary = summarize_agent(agent);

        assert_eq!(summary.total_cost, Decimal::new(26_000, 0));
        assert_eq!(summary.total_time_weeks, 7.0);
        assert_eq!(summary.dependency_count, 0);
    }

    #[test]
    fn agent_subtotal_tracks_partial_selection() {
        let catalog = demo_catalog();
        let claims = AgentId::from("claims-processing");
        let state = SelectionState::new().toggle_service(
            &catalog,
            &claims,
            &ServiceId::from("cp-fraud-signals"),
            true,
        );

        let subtotal = agent_subtotal(&state, &catalog, &claims).expect("claims selected");
        assert_eq!(subtotal.cost, Decimal::new(19_000, 0));
        assert_eq!(subtotal.time_in_weeks, 5.0);
        assert_eq!(subtotal.service_count, 1);
        assert_eq!(subtotal.dependency_count, 1);

        assert!(agent_subtotal(&state, &catalog, &AgentId::from("customer-support")).is_none());
        assert!(state.is_dependency_selected(&claims, &DependencyId::from("cp-policy-db")));
    }

    fn arb_service(index: usize) -> impl Strategy<Value = Service> {
        let roles = prop::sample::select(vec!["Eng", "Ops", "Design", "PM"]);
        (
            0i64..10_000,
            0.0f64..12.0,
            prop::collection::vec((roles, 0.0f64..=100.0), 0..4),
        )
            .prop_map(move |(cost, weeks, resources)| {
                service(&format!("s{index}"), cost, weeks, resources)
            })
    }

    proptest! {
        /// allocation shares are empty or sum to 100 within per-role rounding
        #[test]
        fn prop_allocation_sums_to_hundred_or_is_empty(
            first in arb_service(0),
            second in arb_service(1),
            third in arb_service(2),
        ) {
            let catalog = single_agent_catalog(vec![first, second, third]);
            let agent = catalog.find_agent(&AgentId::from("agent")).expect("agent");
            let summary = aggregate(&SelectionState::new().toggle_agent(agent, true), &catalog);

            let roles = summary.resource_allocation.len() as i64;
            let total: i64 =
                summary.resource_allocation.values().map(|share| i64::from(*share)).sum();
            prop_assert!(total == 0 || (total - 100).abs() <= roles);
        }

        /// aggregation is referentially transparent
        #[test]
        fn prop_aggregation_is_repeatable(first in arb_service(0), second in arb_service(1)) {
            let catalog = single_agent_catalog(vec![first, second]);
            let agent = catalog.find_agent(&AgentId::from("agent")).expect("agent");
            let state = SelectionState::new().toggle_agent(agent, true);

            prop_assert_eq!(aggregate(&state, &catalog), aggregate(&state, &catalog));
        }
    }
}
