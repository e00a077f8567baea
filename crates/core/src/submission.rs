use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cpq::selection::SelectionState;
use crate::cpq::QuoteEvaluation;
use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub full_name: String,
    pub company_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContactDetails {
    /// Reports the first invalid field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.full_name.trim().chars().count() < 2 {
            return Err(invalid("full_name", "name must be at least 2 characters"));
        }
        if self.company_name.trim().chars().count() < 2 {
            return Err(invalid("company_name", "company name must be at least 2 characters"));
        }
        if !is_plausible_email(self.email.trim()) {
            return Err(invalid("email", "please enter a valid email address"));
        }
        if self.phone.trim().chars().count() < 6 {
            return Err(invalid("phone", "please enter a valid phone number"));
        }
        Ok(())
    }
}

/// A finished quote handed to the sales team. Carries figures only; the
/// receiving side never feeds anything back into the selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    pub quote_reference: String,
    pub contact: ContactDetails,
    pub total_cost: Decimal,
    pub total_time_weeks: f64,
    pub service_count: usize,
    pub dependency_count: usize,
    pub requested_weeks: u32,
    pub standard_weeks: u32,
    pub multiplier: Decimal,
    pub adjusted_cost: Decimal,
    pub submitted_at: DateTime<Utc>,
}

impl QuoteSubmission {
    pub fn build(
        contact: ContactDetails,
        selection: &SelectionState,
        evaluation: &QuoteEvaluation,
    ) -> Result<Self, DomainError> {
        contact.validate()?;
        if selection.is_empty() {
            return Err(invalid("selection", "select at least one service or deliverable"));
        }

        Ok(Self {
            quote_reference: quote_reference(selection, evaluation.timeline.requested_weeks),
            contact,
            total_cost: evaluation.summary.total_cost,
            total_time_weeks: evaluation.summary.total_time_weeks,
            service_count: evaluation.summary.service_count,
            dependency_count: evaluation.summary.dependency_count,
            requested_weeks: evaluation.timeline.requested_weeks,
            standard_weeks: evaluation.timeline.standard_weeks,
            multiplier: evaluation.timeline.multiplier,
            adjusted_cost: evaluation.timeline.adjusted_cost,
            submitted_at: Utc::now(),
        })
    }
}

pub trait SubmissionSink: Send + Sync {
    fn submit(&self, submission: QuoteSubmission);
}

#[derive(Clone, Default)]
pub struct InMemorySubmissionSink {
    submissions: Arc<Mutex<Vec<QuoteSubmission>>>,
}

impl InMemorySubmissionSink {
    pub fn submissions(&self) -> Vec<QuoteSubmission> {
        match self.submissions.lock() {
            Ok(submissions) => submissions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SubmissionSink for InMemorySubmissionSink {
    fn submit(&self, submission: QuoteSubmission) {
        match self.submissions.lock() {
            Ok(mut submissions) => submissions.push(submission),
            Err(poisoned) => poisoned.into_inner().push(submission),
        }
    }
}

#[derive(Serialize)]
struct CanonicalSelection<'a> {
    agents: Vec<CanonicalAgent<'a>>,
    deliverables: Vec<&'a str>,
    requested_weeks: u32,
}

#[derive(Serialize)]
struct CanonicalAgent<'a> {
    agent_id: &'a str,
    services: Vec<&'a str>,
    dependencies: Vec<&'a str>,
}

/// Stable reference for a selection and requested duration. Independent of
/// the order in which agents were picked.
pub fn quote_reference(selection: &SelectionState, requested_weeks: u32) -> String {
    let mut agents = selection
        .selected_agents
        .iter()
        .map(|selected| CanonicalAgent {
            agent_id: selected.agent_id.as_str(),
            services: selected.selected_service_ids.iter().map(|id| id.as_str()).collect(),
            dependencies: selected.selected_dependency_ids.iter().map(|id| id.as_str()).collect(),
        })
        .collect::<Vec<_>>();
    agents.sort_by(|left, right| left.agent_id.cmp(right.agent_id));

    let canonical = CanonicalSelection {
        agents,
        deliverables: selection.selected_deliverable_ids.iter().map(|id| id.as_str()).collect(),
        requested_weeks,
    };
    let encoded = serde_json::to_string(&canonical)
        .unwrap_or_else(|error| format!("serialization_error:{error}"));

    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("AQ-{}", digest[..12].to_ascii_uppercase())
}

fn invalid(field: &str, message: &str) -> DomainError {
    DomainError::InvalidSubmission { field: field.to_string(), message: message.to_string() }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        quote_reference, ContactDetails, InMemorySubmissionSink, QuoteSubmission, SubmissionSink,
    };
    use crate::cpq::selection::SelectionState;
    use crate::cpq::{DeterministicQuoteRuntime, QuoteEvaluationInput, QuoteRuntime};
    use crate::domain::catalog::{AgentId, DeliverableId};
    use crate::errors::DomainError;
    use crate::fixtures::demo_catalog;

    fn contact() -> ContactDetails {
        ContactDetails {
            full_name: "Ada Park".to_owned(),
            company_name: "Northwind".to_owned(),
            email: "ada@northwind.example".to_owned(),
            phone: "+1 555 0100".to_owned(),
            notes: None,
        }
    }

    fn invalid_field(details: ContactDetails) -> Option<String> {
        match details.validate() {
            Err(DomainError::InvalidSubmission { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn contact_validation_reports_first_bad_field() {
        assert!(contact().validate().is_ok());

        assert_eq!(
            invalid_field(ContactDetails { full_name: "A".to_owned(), ..contact() }).as_deref(),
            Some("full_name")
        );
        assert_eq!(
            invalid_field(ContactDetails { company_name: " ".to_owned(), ..contact() }).as_deref(),
            Some("company_name")
        );
        for email in ["ada", "ada@", "@northwind.com", "ada@northwind", "ada@@x.io", "a b@x.io"] {
            assert_eq!(
                invalid_field(ContactDetails { email: email.to_owned(), ..contact() }).as_deref(),
                Some("email"),
                "{email} should be rejected"
            );
        }
        assert_eq!(
            invalid_field(ContactDetails { phone: "555".to_owned(), ..contact() }).as_deref(),
            Some("phone")
        );
    }

    #[test]
    fn submission_carries_quote_figures_and_lands_in_sink() {
        let catalog = demo_catalog();
        let agent = catalog.find_agent(&AgentId::from("customer-support")).expect("agent");
        let selection = SelectionState::new().toggle_agent(agent, true);
        let evaluation = DeterministicQuoteRuntime::default().evaluate(QuoteEvaluationInput {
            selection: &selection,
            catalog: &catalog,
            requested_weeks: Some(4),
        });

        let submission =
            QuoteSubmission::build(contact(), &selection, &evaluation).expect("valid submission");

        assert_eq!(submission.total_cost, Decimal::new(29_000, 0));
        assert_eq!(submission.requested_weeks, 4);
        assert_eq!(submission.standard_weeks, 8);
        // halved timeline: 29_000 * 1.25
        assert_eq!(submission.adjusted_cost, Decimal::new(36_250, 0));
        assert!(submission.quote_reference.starts_with("AQ-"));
        assert_eq!(submission.quote_reference.len(), 15);

        let sink = InMemorySubmissionSink::default();
        sink.submit(submission.clone());
        assert_eq!(sink.submissions(), vec![submission]);
    }

    #[test]
    fn empty_selection_cannot_be_submitted() {
        let catalog = demo_catalog();
        let selection = SelectionState::new();
        let evaluation = DeterministicQuoteRuntime::default().evaluate(QuoteEvaluationInput {
            selection: &selection,
            catalog: &catalog,
            requested_weeks: None,
        });

        let error = QuoteSubmission::build(contact(), &selection, &evaluation)
            .expect_err("empty selection must fail");
        assert!(matches!(
            error,
            DomainError::InvalidSubmission { ref field, .. } if field == "selection"
        ));
    }

    #[test]
    fn quote_reference_ignores_pick_order_but_tracks_weeks() {
        let catalog = demo_catalog();
        let support = catalog.find_agent(&AgentId::from("customer-support")).expect("agent");
        let claims = catalog.find_agent(&AgentId::from("claims-processing")).expect("agent");

        let forward = SelectionState::new().toggle_agent(support, true).toggle_agent(claims, true);
        let reverse = SelectionState::new().toggle_agent(claims, true).toggle_agent(support, true);

        assert_eq!(quote_reference(&forward, 10), quote_reference(&reverse, 10));
        assert_ne!(quote_reference(&forward, 10), quote_reference(&forward, 11));

        let with_deliverable =
            forward.toggle_deliverable(&DeliverableId::from("obs-tracing"), true);
        assert_ne!(quote_reference(&forward, 10), quote_reference(&with_deliverable, 10));
    }
}
