pub mod aggregation;
pub mod catalog;
pub mod classifier;
pub mod search;
pub mod selection;
pub mod timeline;

use serde::{Deserialize, Serialize};

use self::{
    aggregation::{AggregationEngine, DeterministicAggregationEngine, QuoteSummary},
    catalog::Catalog,
    selection::SelectionState,
    timeline::{
        DeliveryBounds, DeterministicTimelinePricer, TimelineInput, TimelinePricingEngine,
        TimelineQuote,
    },
};

#[derive(Clone, Debug)]
pub struct QuoteEvaluationInput<'a> {
    pub selection: &'a SelectionState,
    pub catalog: &'a Catalog,
    /// Falls back to the standard duration when unset.
    pub requested_weeks: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteEvaluation {
    pub summary: QuoteSummary,
    pub bounds: DeliveryBounds,
    pub timeline: TimelineQuote,
}

pub trait QuoteRuntime: Send + Sync {
    fn evaluate(&self, input: QuoteEvaluationInput<'_>) -> QuoteEvaluation;
}

pub struct DeterministicQuoteRuntime<A, T> {
    aggregation_engine: A,
    timeline_pricer: T,
}

impl<A, T> DeterministicQuoteRuntime<A, T> {
    pub fn new(aggregation_engine: A, timeline_pricer: T) -> Self {
        Self { aggregation_engine, timeline_pricer }
    }
}

impl Default
    for DeterministicQuoteRuntime<DeterministicAggregationEngine, DeterministicTimelinePricer>
{
    fn default() -> Self {
        Self::new(DeterministicAggregationEngine, DeterministicTimelinePricer::default())
    }
}

impl<A, T> QuoteRuntime for DeterministicQuoteRuntime<A, T>
where
    A: AggregationEngine,
    T: TimelinePricingEngine,
{
    fn evaluate(&self, input: QuoteEvaluationInput<'_>) -> QuoteEvaluation {
        let summary = self.aggregation_engine.aggregate(input.selection, input.catalog);
        let standard_weeks = summary.standard_weeks();
        let bounds = self.timeline_pricer.bounds(standard_weeks);
        let timeline = self.timeline_pricer.price(&TimelineInput {
            requested_weeks: input.requested_weeks.unwrap_or(standard_weeks),
            standard_weeks,
            base_cost: summary.total_cost,
        });

        QuoteEvaluation { summary, bounds, timeline }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::{
        cpq::{
            aggregation::{AggregationEngine, QuoteSummary},
            catalog::Catalog,
            selection::SelectionState,
            timeline::{
                DeterministicTimelinePricer, TimelineAdjustment, TimelinePolicy,
            },
            DeterministicQuoteRuntime, QuoteEvaluationInput, QuoteRuntime,
        },
        domain::catalog::{AgentId, DeliverableId},
        fixtures::demo_catalog,
    };

    #[test]
    fn runtime_prices_standard_duration_by_default() {
        let catalog = demo_catalog();
        let agent = catalog.find_agent(&AgentId::from("customer-support")).expect("agent");
        let selection = SelectionState::new().toggle_agent(agent, true);

        let evaluation = DeterministicQuoteRuntime::default().evaluate(QuoteEvaluationInput {
            selection: &selection,
            catalog: &catalog,
            requested_weeks: None,
        });

        // 7 service weeks + 1 week for the required connector
        assert_eq!(evaluation.summary.total_cost, Decimal::new(29_000, 0));
        assert_eq!(evaluation.timeline.standard_weeks, 8);
        assert_eq!(evaluation.timeline.adjustment, TimelineAdjustment::Standard);
        assert_eq!(evaluation.timeline.adjusted_cost, Decimal::new(29_000, 0));
        assert_eq!((evaluation.bounds.min_weeks, evaluation.bounds.max_weeks), (4, 12));
    }

    #[test]
    fn runtime_applies_requested_weeks() {
        let catalog = demo_catalog();
        let selection = SelectionState::new()
            .toggle_deliverable(&DeliverableId::from("di-connectors"), true)
            .toggle_deliverable(&DeliverableId::from("inf-landing-zone"), true);

        let evaluation = DeterministicQuoteRuntime::default().evaluate(QuoteEvaluationInput {
            selection: &selection,
            catalog: &catalog,
            requested_weeks: Some(3),
        });

        // 14_000 over 5 weeks expedited to 3: r = 0.4, multiplier 1.16
        assert_eq!(evaluation.timeline.multiplier, Decimal::new(116, 2));
        assert_eq!(evaluation.timeline.adjusted_cost, Decimal::new(16_240, 0));
    }

    #[test]
    fn runtime_supports_explicit_engine_interfaces() {
        struct FixedAggregation;

        impl AggregationEngine for FixedAggregation {
            fn aggregate(&self, _selection: &SelectionState, _catalog: &Catalog) -> QuoteSummary {
                QuoteSummary {
                    total_cost: Decimal::new(1000, 0),
                    total_time_weeks: 10.0,
                    resource_allocation: Default::default(),
                    service_count: 1,
                    dependency_count: 0,
                    line_items: Vec::new(),
                }
            }
        }

        let policy = TimelinePolicy {
            extension_discount_floor: Decimal::new(9, 1),
            ..TimelinePolicy::default()
        };
        let runtime = DeterministicQuoteRuntime::new(
            FixedAggregation,
            DeterministicTimelinePricer::new(policy),
        );

        let evaluation = runtime.evaluate(QuoteEvaluationInput {
            selection: &SelectionState::new(),
            catalog: &Catalog::default(),
            requested_weeks: Some(20),
        });

        assert_eq!(evaluation.timeline.adjusted_cost, Decimal::new(900, 0));
    }
}
