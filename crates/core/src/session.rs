//! A single configurator session: one selection value evolved by actions,
//! with every transition traced and audited.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use crate::cpq::aggregation::{aggregate, QuoteSummary};
use crate::cpq::catalog::Catalog;
use crate::cpq::selection::{SelectionAction, SelectionState, TransitionOutcome};
use crate::cpq::timeline::{DeterministicTimelinePricer, TimelinePolicy};
use crate::cpq::{
    aggregation::DeterministicAggregationEngine, DeterministicQuoteRuntime, QuoteEvaluation,
    QuoteEvaluationInput, QuoteRuntime,
};
use crate::errors::{ApplicationError, DomainError};
use crate::submission::{ContactDetails, QuoteSubmission, SubmissionSink};

pub struct ConfiguratorSession<'a> {
    session_id: String,
    catalog: &'a Catalog,
    state: SelectionState,
    runtime: DeterministicQuoteRuntime<DeterministicAggregationEngine, DeterministicTimelinePricer>,
    audit_sink: Arc<dyn AuditSink>,
}

impl<'a> ConfiguratorSession<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self::with_audit_sink(catalog, TimelinePolicy::default(), Arc::new(NoopAuditSink))
    }

    pub fn with_audit_sink(
        catalog: &'a Catalog,
        policy: TimelinePolicy,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            catalog,
            state: SelectionState::new(),
            runtime: DeterministicQuoteRuntime::new(
                DeterministicAggregationEngine,
                DeterministicTimelinePricer::new(policy),
            ),
            audit_sink,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn apply(&mut self, action: &SelectionAction) -> TransitionOutcome {
        let transition = self.state.apply(self.catalog, action);
        let outcome = transition.outcome;
        let agent_id = action.agent_id().map(|id| id.as_str()).unwrap_or("");
        let item_id = action.item_id().unwrap_or("");

        match outcome {
            TransitionOutcome::Applied | TransitionOutcome::Unchanged => debug!(
                event_name = action.event_name(),
                session_id = %self.session_id,
                agent_id,
                item_id,
                outcome = outcome.as_str(),
                "selection action processed"
            ),
            TransitionOutcome::Ignored => warn!(
                event_name = action.event_name(),
                session_id = %self.session_id,
                agent_id,
                item_id,
                "selection action referenced an unknown id"
            ),
            TransitionOutcome::Rejected => warn!(
                event_name = action.event_name(),
                session_id = %self.session_id,
                agent_id,
                item_id,
                "required dependency cannot be deselected"
            ),
        }

        let mut event = AuditEvent::new(
            &self.session_id,
            action.event_name(),
            AuditCategory::Selection,
            AuditOutcome::from(outcome),
        );
        if !agent_id.is_empty() {
            event = event.with_metadata("agent_id", agent_id);
        }
        if !item_id.is_empty() {
            event = event.with_metadata("item_id", item_id);
        }
        self.audit_sink.emit(event);

        self.state = transition.state;
        outcome
    }

    pub fn apply_all<'b>(
        &mut self,
        actions: impl IntoIterator<Item = &'b SelectionAction>,
    ) -> Vec<TransitionOutcome> {
        actions.into_iter().map(|action| self.apply(action)).collect()
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::new();
        self.audit_sink.emit(AuditEvent::new(
            &self.session_id,
            "selection.reset",
            AuditCategory::Selection,
            AuditOutcome::Success,
        ));
    }

    pub fn summary(&self) -> QuoteSummary {
        aggregate(&self.state, self.catalog)
    }

    pub fn quote(&self, requested_weeks: Option<u32>) -> QuoteEvaluation {
        let evaluation = self.runtime.evaluate(QuoteEvaluationInput {
            selection: &self.state,
            catalog: self.catalog,
            requested_weeks,
        });

        self.audit_sink.emit(
            AuditEvent::new(
                &self.session_id,
                "pricing.timeline_quoted",
                AuditCategory::Pricing,
                AuditOutcome::Success,
            )
            .with_metadata("requested_weeks", evaluation.timeline.requested_weeks.to_string())
            .with_metadata("standard_weeks", evaluation.timeline.standard_weeks.to_string())
            .with_metadata("adjusted_cost", evaluation.timeline.adjusted_cost.to_string()),
        );

        evaluation
    }

    /// Prices the current selection and hands it to `sink`. Rejected
    /// submissions are audited and never reach the sink.
    pub fn submit(
        &self,
        contact: ContactDetails,
        requested_weeks: Option<u32>,
        sink: &dyn SubmissionSink,
    ) -> Result<QuoteSubmission, ApplicationError> {
        let evaluation = self.quote(requested_weeks);

        match QuoteSubmission::build(contact, &self.state, &evaluation) {
            Ok(submission) => {
                info!(
                    event_name = "submission.quote_submitted",
                    session_id = %self.session_id,
                    quote_reference = %submission.quote_reference,
                    adjusted_cost = %submission.adjusted_cost,
                    "quote submitted"
                );
                self.audit_sink.emit(
                    AuditEvent::new(
                        &self.session_id,
                        "submission.quote_submitted",
                        AuditCategory::Submission,
                        AuditOutcome::Success,
                    )
                    .with_metadata("quote_reference", submission.quote_reference.clone()),
                );
                sink.submit(submission.clone());
                Ok(submission)
            }
            Err(error) => {
                let field = match &error {
                    DomainError::InvalidSubmission { field, .. } => field.as_str(),
                    DomainError::InvalidCatalog(_) => "",
                };
                warn!(
                    event_name = "submission.quote_rejected",
                    session_id = %self.session_id,
                    field,
                    error = %error,
                    "quote submission rejected"
                );
                self.audit_sink.emit(
                    AuditEvent::new(
                        &self.session_id,
                        "submission.quote_rejected",
                        AuditCategory::Submission,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("field", field),
                );
                Err(error.into())
            }
        }
    }
}
