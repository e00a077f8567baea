use crate::cpq::catalog::Catalog;
use crate::domain::catalog::{Agent, AgentCategory, Deliverable};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentFilter {
    pub category: Option<AgentCategory>,
    pub agent_type: Option<String>,
}

impl AgentFilter {
    fn accepts(&self, agent: &Agent) -> bool {
        self.category.map_or(true, |category| agent.category == category)
            && self.agent_type.as_deref().map_or(true, |agent_type| agent.agent_type == agent_type)
    }
}

/// A blank query browses by filter; a non-blank query searches the whole
/// catalog and ignores the filter.
pub fn search_agents<'a>(
    catalog: &'a Catalog,
    query: &str,
    filter: &AgentFilter,
) -> Vec<&'a Agent> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return catalog.agents().iter().filter(|agent| filter.accepts(agent)).collect();
    }

    catalog.agents().iter().filter(|agent| agent_matches(agent, &needle)).collect()
}

pub fn search_deliverables<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a Deliverable> {
    let needle = query.trim().to_lowercase();
    catalog
        .all_deliverables()
        .filter(|deliverable| {
            needle.is_empty()
                || deliverable.name.to_lowercase().contains(&needle)
                || deliverable.description.to_lowercase().contains(&needle)
                || deliverable.layer.to_lowercase().contains(&needle)
        })
        .collect()
}

fn agent_matches(agent: &Agent, needle: &str) -> bool {
    agent.name.to_lowercase().contains(needle)
        || agent.description.to_lowercase().contains(needle)
        || agent.services.iter().any(|service| service.name.to_lowercase().contains(needle))
        || agent.tasks.iter().any(|task| task.to_lowercase().contains(needle))
}
