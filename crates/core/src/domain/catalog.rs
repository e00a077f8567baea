use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub const UNCATEGORIZED_LAYER: &str = "Uncategorized";

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_id!(AgentId);
string_id!(ServiceId);
string_id!(DependencyId);
string_id!(DeliverableId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    Horizontal,
    Industry,
}

impl AgentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Industry => "industry",
        }
    }
}

impl std::str::FromStr for AgentCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "industry" => Ok(Self::Industry),
            other => {
                Err(format!("unsupported agent category `{other}` (expected horizontal|industry)"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for AgentCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Share of an agent service's duration spent by one role, as a 0-100 percentage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub role: String,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "timeInWeeks")]
    pub time_in_weeks: f64,
    pub cost: Decimal,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "timeInWeeks")]
    pub time_in_weeks: f64,
    pub cost: Decimal,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub category: AgentCategory,
    #[serde(rename = "type")]
    pub agent_type: String,
    #[serde(default)]
    pub description: String,
    pub services: Vec<Service>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl Agent {
    pub fn service(&self, service_id: &ServiceId) -> Option<&Service> {
        self.services.iter().find(|service| &service.id == service_id)
    }

    pub fn dependency(&self, dependency_id: &DependencyId) -> Option<&Dependency> {
        self.dependencies.iter().find(|dependency| &dependency.id == dependency_id)
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &ServiceId> {
        self.services.iter().map(|service| &service.id)
    }

    pub fn required_dependency_ids(&self) -> impl Iterator<Item = &DependencyId> {
        self.dependencies
            .iter()
            .filter(|dependency| dependency.required)
            .map(|dependency| &dependency.id)
    }
}

/// Share of a deliverable's duration spent by one role, as a 0-1 fraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliverableResource {
    #[serde(alias = "Role")]
    pub role: String,
    #[serde(alias = "% time", alias = "timeShare")]
    pub time_share: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "weeklyRate")]
    pub weekly_rate: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "DeliverableRecord")]
pub struct Deliverable {
    pub id: DeliverableId,
    pub name: String,
    pub description: String,
    pub time_in_weeks: f64,
    pub price: Decimal,
    pub layer: String,
    pub resources: Vec<DeliverableResource>,
}

/// Wire shape of a deliverable. Providers spell the duration several ways,
/// sometimes more than one per record, and send `null` for unknown figures.
#[derive(Deserialize)]
struct DeliverableRecord {
    id: DeliverableId,
    #[serde(alias = "Deliverable")]
    name: String,
    #[serde(default, alias = "Service Description")]
    description: Option<String>,
    #[serde(default, rename = "timeInWeeks")]
    time_in_weeks_camel: Option<f64>,
    #[serde(default)]
    time_in_weeks: Option<f64>,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default, rename = "Time (in Weeks)")]
    time_label: Option<f64>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default, alias = "Resources", deserialize_with = "deserialize_deliverable_resources")]
    resources: Vec<DeliverableResource>,
}

impl From<DeliverableRecord> for Deliverable {
    fn from(record: DeliverableRecord) -> Self {
        // First non-zero spelling wins; zero counts as absent.
        let time_in_weeks =
            [record.time_in_weeks_camel, record.time_in_weeks, record.time, record.time_label]
                .into_iter()
                .flatten()
                .find(|weeks| *weeks != 0.0)
                .unwrap_or(0.0);

        Self {
            id: record.id,
            name: record.name,
            description: record.description.unwrap_or_default(),
            time_in_weeks,
            price: record.price.unwrap_or_default(),
            layer: record.layer.unwrap_or_else(default_layer),
            resources: record.resources,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceLayer {
    #[serde(alias = "Layer")]
    pub layer_name: String,
    #[serde(alias = "Deliverables")]
    pub deliverables: Vec<Deliverable>,
}

impl ServiceLayer {
    /// Groups flat deliverable records into layers, keeping first-seen layer order.
    pub fn group(deliverables: impl IntoIterator<Item = Deliverable>) -> Vec<ServiceLayer> {
        let mut layers: Vec<ServiceLayer> = Vec::new();

        for deliverable in deliverables {
            let layer_name = if deliverable.layer.trim().is_empty() {
                UNCATEGORIZED_LAYER.to_owned()
            } else {
                deliverable.layer.clone()
            };

            match layers.iter_mut().find(|layer| layer.layer_name == layer_name) {
                Some(layer) => layer.deliverables.push(deliverable),
                None => layers.push(ServiceLayer { layer_name, deliverables: vec![deliverable] }),
            }
        }

        layers
    }
}

fn default_layer() -> String {
    UNCATEGORIZED_LAYER.to_owned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResourcesRepr {
    List(Vec<DeliverableResource>),
    Map(BTreeMap<String, serde_json::Value>),
}

// Providers send either a list of resources or a `{role: fraction}` map that
// may also carry a non-role `time` entry.
fn deserialize_deliverable_resources<'de, D>(
    deserializer: D,
) -> Result<Vec<DeliverableResource>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<ResourcesRepr>::deserialize(deserializer)?;
    Ok(match repr {
        None => Vec::new(),
        Some(ResourcesRepr::List(resources)) => resources,
        Some(ResourcesRepr::Map(entries)) => entries
            .into_iter()
            .filter(|(role, _)| role != "time")
            .filter_map(|(role, value)| {
                value.as_f64().map(|time_share| DeliverableResource {
                    role,
                    time_share,
                    weekly_rate: None,
                })
            })
            .collect(),
    })
}
