pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod session;
pub mod submission;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use cpq::aggregation::{QuoteLineItem, QuoteSummary};
pub use cpq::catalog::{Catalog, CatalogError, CatalogViolation};
pub use cpq::selection::{SelectionAction, SelectionState, TransitionOutcome};
pub use cpq::timeline::{DeliveryBounds, TimelinePolicy, TimelineQuote};
pub use cpq::{DeterministicQuoteRuntime, QuoteEvaluation, QuoteEvaluationInput, QuoteRuntime};
pub use domain::catalog::{
    Agent, AgentCategory, AgentId, Deliverable, DeliverableId, Dependency, DependencyId, Service,
    ServiceId, ServiceLayer,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use session::ConfiguratorSession;
pub use submission::{ContactDetails, QuoteSubmission, SubmissionSink};
