use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::catalog::{Agent, AgentId, DeliverableId, DependencyId, ServiceId};

/// An agent the user has picked, with the subset of its services and
/// dependencies currently chosen. Never holds an empty service set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAgent {
    pub agent_id: AgentId,
    pub selected_service_ids: BTreeSet<ServiceId>,
    pub selected_dependency_ids: BTreeSet<DependencyId>,
}

impl SelectedAgent {
    fn seeded(agent: &Agent, service_ids: BTreeSet<ServiceId>) -> Self {
        Self {
            agent_id: agent.id.clone(),
            selected_service_ids: service_ids,
            selected_dependency_ids: agent.required_dependency_ids().cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected_agents: Vec<SelectedAgent>,
    pub selected_deliverable_ids: BTreeSet<DeliverableId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectionAction {
    ToggleAgent { agent_id: AgentId, selected: bool },
    ToggleService { agent_id: AgentId, service_id: ServiceId, selected: bool },
    ToggleDependency { agent_id: AgentId, dependency_id: DependencyId, selected: bool },
    ToggleDeliverable { deliverable_id: DeliverableId, selected: bool },
}

impl SelectionAction {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ToggleAgent { .. } => "selection.toggle_agent",
            Self::ToggleService { .. } => "selection.toggle_service",
            Self::ToggleDependency { .. } => "selection.toggle_dependency",
            Self::ToggleDeliverable { .. } => "selection.toggle_deliverable",
        }
    }

    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            Self::ToggleAgent { agent_id, .. }
            | Self::ToggleService { agent_id, .. }
            | Self::ToggleDependency { agent_id, .. } => Some(agent_id),
            Self::ToggleDeliverable { .. } => None,
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::ToggleAgent { .. } => None,
            Self::ToggleService { service_id, .. } => Some(service_id.as_str()),
            Self::ToggleDependency { dependency_id, .. } => Some(dependency_id.as_str()),
            Self::ToggleDeliverable { deliverable_id, .. } => Some(deliverable_id.as_str()),
        }
    }
}

/// What a transition did. Only `Applied` yields a state different from the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    Applied,
    Unchanged,
    /// The action referenced an id the catalog or selection does not know.
    Ignored,
    /// The action would have removed a required dependency.
    Rejected,
}

impl TransitionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Ignored => "ignored",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: SelectionState,
    pub outcome: TransitionOutcome,
}

impl Transition {
    fn applied(state: SelectionState) -> Self {
        Self { state, outcome: TransitionOutcome::Applied }
    }

    fn kept(state: &SelectionState, outcome: TransitionOutcome) -> Self {
        Self { state: state.clone(), outcome }
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_agents.is_empty() && self.selected_deliverable_ids.is_empty()
    }

    /// Reducer entry point: resolves ids against the catalog and applies the action.
    pub fn apply(&self, catalog: &Catalog, action: &SelectionAction) -> Transition {
        match action {
            SelectionAction::ToggleAgent { agent_id, selected } => {
                match catalog.find_agent(agent_id) {
                    Some(agent) => self.agent_transition(agent, *selected),
                    // Stale entries can still be dropped after the catalog forgot the agent.
                    None if !selected && self.is_agent_selected(agent_id) => {
                        Transition::applied(self.without_agent(agent_id))
                    }
                    None => Transition::kept(self, TransitionOutcome::Ignored),
                }
            }
            SelectionAction::ToggleService { agent_id, service_id, selected } => {
                self.service_transition(catalog, agent_id, service_id, *selected)
            }
            SelectionAction::ToggleDependency { agent_id, dependency_id, selected } => {
                self.dependency_transition(catalog, agent_id, dependency_id, *selected)
            }
            SelectionAction::ToggleDeliverable { deliverable_id, selected } => {
                if *selected && catalog.find_deliverable(deliverable_id).is_none() {
                    return Transition::kept(self, TransitionOutcome::Ignored);
                }
                self.deliverable_transition(deliverable_id, *selected)
            }
        }
    }

    pub fn toggle_agent(&self, agent: &Agent, selected: bool) -> Self {
        self.agent_transition(agent, selected).state
    }

    pub fn toggle_service(
        &self,
        catalog: &Catalog,
        agent_id: &AgentId,
        service_id: &ServiceId,
        selected: bool,
    ) -> Self {
        self.service_transition(catalog, agent_id, service_id, selected).state
    }

    pub fn toggle_dependency(
        &self,
        catalog: &Catalog,
        agent_id: &AgentId,
        dependency_id: &DependencyId,
        selected: bool,
    ) -> Self {
        self.dependency_transition(catalog, agent_id, dependency_id, selected).state
    }

    pub fn toggle_deliverable(&self, deliverable_id: &DeliverableId, selected: bool) -> Self {
        self.deliverable_transition(deliverable_id, selected).state
    }

    pub fn selected_agent(&self, agent_id: &AgentId) -> Option<&SelectedAgent> {
        self.selected_agents.iter().find(|selected| &selected.agent_id == agent_id)
    }

    pub fn is_agent_selected(&self, agent_id: &AgentId) -> bool {
        self.selected_agent(agent_id).is_some()
    }

    pub fn is_service_selected(&self, agent_id: &AgentId, service_id: &ServiceId) -> bool {
        self.selected_agent(agent_id)
            .is_some_and(|selected| selected.selected_service_ids.contains(service_id))
    }

    pub fn is_dependency_selected(&self, agent_id: &AgentId, dependency_id: &DependencyId) -> bool {
        self.selected_agent(agent_id)
            .is_some_and(|selected| selected.selected_dependency_ids.contains(dependency_id))
    }

    pub fn is_deliverable_selected(&self, deliverable_id: &DeliverableId) -> bool {
        self.selected_deliverable_ids.contains(deliverable_id)
    }

    pub fn are_all_services_selected(&self, catalog: &Catalog, agent_id: &AgentId) -> bool {
        match (self.selected_agent(agent_id), catalog.find_agent(agent_id)) {
            (Some(selected), Some(agent)) => {
                selected.selected_service_ids.len() == agent.services.len()
            }
            _ => false,
        }
    }

    fn agent_transition(&self, agent: &Agent, selected: bool) -> Transition {
        let present = self.is_agent_selected(&agent.id);
        match (selected, present) {
            (true, true) | (false, false) => Transition::kept(self, TransitionOutcome::Unchanged),
            (true, false) if agent.services.is_empty() => {
                Transition::kept(self, TransitionOutcome::Ignored)
            }
            (true, false) => {
                let mut next = self.clone();
                next.selected_agents
                    .push(SelectedAgent::seeded(agent, agent.service_ids().cloned().collect()));
                Transition::applied(next)
            }
            (false, true) => Transition::applied(self.without_agent(&agent.id)),
        }
    }

    fn service_transition(
        &self,
        catalog: &Catalog,
        agent_id: &AgentId,
        service_id: &ServiceId,
        selected: bool,
    ) -> Transition {
        let Some(agent) = catalog.find_agent(agent_id) else {
            return Transition::kept(self, TransitionOutcome::Ignored);
        };
        if agent.service(service_id).is_none() {
            return Transition::kept(self, TransitionOutcome::Ignored);
        }

        let position = self.position(agent_id);
        match (selected, position) {
            (true, None) => {
                let mut next = self.clone();
                next.selected_agents
                    .push(SelectedAgent::seeded(agent, BTreeSet::from([service_id.clone()])));
                Transition::applied(next)
            }
            (false, None) => Transition::kept(self, TransitionOutcome::Unchanged),
            (true, Some(index)) => {
                if self.selected_agents[index].selected_service_ids.contains(service_id) {
                    return Transition::kept(self, TransitionOutcome::Unchanged);
                }
                let mut next = self.clone();
                next.selected_agents[index].selected_service_ids.insert(service_id.clone());
                Transition::applied(next)
            }
            (false, Some(index)) => {
                if !self.selected_agents[index].selected_service_ids.contains(service_id) {
                    return Transition::kept(self, TransitionOutcome::Unchanged);
                }
                let mut next = self.clone();
                let entry = &mut next.selected_agents[index];
                entry.selected_service_ids.remove(service_id);
                if entry.selected_service_ids.is_empty() {
                    next.selected_agents.remove(index);
                }
                Transition::applied(next)
            }
        }
    }

    fn dependency_transition(
        &self,
        catalog: &Catalog,
        agent_id: &AgentId,
        dependency_id: &DependencyId,
        selected: bool,
    ) -> Transition {
        let Some(index) = self.position(agent_id) else {
            return Transition::kept(self, TransitionOutcome::Ignored);
        };
        let Some(dependency) = catalog.find_dependency(agent_id, dependency_id) else {
            return Transition::kept(self, TransitionOutcome::Ignored);
        };

        let present = self.selected_agents[index].selected_dependency_ids.contains(dependency_id);
        match (selected, present) {
            (true, true) | (false, false) => Transition::kept(self, TransitionOutcome::Unchanged),
            (false, true) if dependency.required => {
                Transition::kept(self, TransitionOutcome::Rejected)
            }
            (true, false) => {
                let mut next = self.clone();
                next.selected_agents[index].selected_dependency_ids.insert(dependency_id.clone());
                Transition::applied(next)
            }
            (false, true) => {
                let mut next = self.clone();
                next.selected_agents[index].selected_dependency_ids.remove(dependency_id);
                Transition::applied(next)
            }
        }
    }

    fn deliverable_transition(&self, deliverable_id: &DeliverableId, selected: bool) -> Transition {
        if self.selected_deliverable_ids.contains(deliverable_id) == selected {
            return Transition::kept(self, TransitionOutcome::Unchanged);
        }

        let mut next = self.clone();
        if selected {
            next.selected_deliverable_ids.insert(deliverable_id.clone());
        } else {
            next.selected_deliverable_ids.remove(deliverable_id);
        }
        Transition::applied(next)
    }

    fn position(&self, agent_id: &AgentId) -> Option<usize> {
        self.selected_agents.iter().position(|selected| &selected.agent_id == agent_id)
    }

    fn without_agent(&self, agent_id: &AgentId) -> Self {
        let mut next = self.clone();
        next.selected_agents.retain(|selected| &selected.agent_id != agent_id);
        next
    }
}
