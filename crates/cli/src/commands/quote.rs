use std::sync::Arc;

use agentquote_core::audit::NoopAuditSink;
use agentquote_core::cpq::aggregation::QuoteSummary;
use agentquote_core::cpq::selection::{SelectionAction, TransitionOutcome};
use agentquote_core::cpq::timeline::{DeliveryBounds, TimelineQuote};
use agentquote_core::domain::catalog::{AgentId, DeliverableId, DependencyId, ServiceId};
use agentquote_core::session::ConfiguratorSession;
use anyhow::{bail, Result};
use serde::Serialize;

use crate::commands::{load_context, to_pretty_json, CommandResult, EXIT_INVALID_ARGUMENT};

#[derive(Clone, Debug, Default)]
pub struct QuoteArgs {
    pub agents: Vec<String>,
    /// `AGENT:SERVICE` pairs.
    pub services: Vec<String>,
    /// `AGENT:DEPENDENCY` pairs.
    pub dependencies: Vec<String>,
    pub deliverables: Vec<String>,
    pub weeks: Option<u32>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct QuoteReport {
    command: &'static str,
    status: &'static str,
    session_id: String,
    currency: String,
    summary: QuoteSummary,
    bounds: DeliveryBounds,
    timeline: TimelineQuote,
    standard_price: bool,
    skipped_actions: Vec<SkippedAction>,
}

#[derive(Debug, Serialize)]
struct SkippedAction {
    action: SelectionAction,
    outcome: TransitionOutcome,
}

pub fn run(args: QuoteArgs) -> CommandResult {
    let context = match load_context("quote") {
        Ok(context) => context,
        Err(failure) => return failure,
    };

    let actions = match build_actions(&args) {
        Ok(actions) => actions,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "invalid_argument",
                format!("{error:#}"),
                EXIT_INVALID_ARGUMENT,
            )
        }
    };

    let mut session = ConfiguratorSession::with_audit_sink(
        &context.catalog,
        context.config.timeline_policy(),
        Arc::new(NoopAuditSink),
    );
    let skipped_actions = actions
        .into_iter()
        .filter_map(|action| {
            let outcome = session.apply(&action);
            matches!(outcome, TransitionOutcome::Ignored | TransitionOutcome::Rejected)
                .then_some(SkippedAction { action, outcome })
        })
        .collect::<Vec<_>>();

    let evaluation = session.quote(args.weeks);
    if let Some(weeks) = args.weeks {
        if !evaluation.bounds.contains(weeks) {
            return CommandResult::failure(
                "quote",
                "invalid_argument",
                format!(
                    "requested {weeks} weeks is outside the delivery window {}..={} weeks",
                    evaluation.bounds.min_weeks, evaluation.bounds.max_weeks
                ),
                EXIT_INVALID_ARGUMENT,
            );
        }
    }

    let report = QuoteReport {
        command: "quote",
        status: "ok",
        session_id: session.session_id().to_string(),
        currency: context.config.quote.currency.clone(),
        standard_price: evaluation.timeline.is_standard_price(),
        summary: evaluation.summary,
        bounds: evaluation.bounds,
        timeline: evaluation.timeline,
        skipped_actions,
    };

    if args.json {
        return to_pretty_json("quote", &report);
    }
    CommandResult::report(render_human(&report))
}

/// Agents first, then individual services, dependencies and deliverables,
/// each group in command-line order.
fn build_actions(args: &QuoteArgs) -> Result<Vec<SelectionAction>> {
    let mut actions = Vec::new();

    for agent in &args.agents {
        actions.push(SelectionAction::ToggleAgent {
            agent_id: AgentId::from(agent.trim()),
            selected: true,
        });
    }
    for raw in &args.services {
        let (agent_id, service) = split_scoped_id(raw, "--service")?;
        actions.push(SelectionAction::ToggleService {
            agent_id,
            service_id: ServiceId::from(service),
            selected: true,
        });
    }
    for raw in &args.dependencies {
        let (agent_id, dependency) = split_scoped_id(raw, "--dependency")?;
        actions.push(SelectionAction::ToggleDependency {
            agent_id,
            dependency_id: DependencyId::from(dependency),
            selected: true,
        });
    }
    for deliverable in &args.deliverables {
        actions.push(SelectionAction::ToggleDeliverable {
            deliverable_id: DeliverableId::from(deliverable.trim()),
            selected: true,
        });
    }

    Ok(actions)
}

fn split_scoped_id<'a>(raw: &'a str, flag: &str) -> Result<(AgentId, &'a str)> {
    let Some((agent, item)) = raw.split_once(':') else {
        bail!("{flag} expects AGENT:ID, got `{raw}`");
    };
    let (agent, item) = (agent.trim(), item.trim());
    if agent.is_empty() || item.is_empty() {
        bail!("{flag} expects AGENT:ID with both parts non-empty, got `{raw}`");
    }
    Ok((AgentId::from(agent), item))
}

fn render_human(report: &QuoteReport) -> String {
    let summary = &report.summary;
    let timeline = &report.timeline;
    let mut lines = vec![format!("quote {}:", report.session_id)];

    for item in &summary.line_items {
        let owner = item.agent_id.as_ref().map(|id| format!("{id}/")).unwrap_or_default();
        lines.push(format!(
            "- {owner}{} {}: {} {} over {} weeks",
            item.item_id, item.name, item.cost, report.currency, item.time_in_weeks
        ));
    }

    lines.push(format!(
        "total: {} {} over {} weeks ({} services, {} dependencies)",
        summary.total_cost,
        report.currency,
        summary.total_time_weeks,
        summary.service_count,
        summary.dependency_count
    ));
    if !summary.resource_allocation.is_empty() {
        let allocation = summary
            .resource_allocation
            .iter()
            .map(|(role, share)| format!("{role} {share}%"))
            .collect::<Vec<_>>();
        lines.push(format!("allocation: {}", allocation.join(", ")));
    }
    lines.push(format!(
        "delivery window: {}..={} weeks (standard {})",
        report.bounds.min_weeks, report.bounds.max_weeks, report.bounds.standard_weeks
    ));
    lines.push(format!(
        "timeline: {} weeks x{} = {} {}",
        timeline.requested_weeks, timeline.multiplier, timeline.adjusted_cost, report.currency
    ));
    for skipped in &report.skipped_actions {
        lines.push(format!("skipped ({:?}): {:?}", skipped.outcome, skipped.action));
    }

    lines.join("\n")
}
