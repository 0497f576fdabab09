//! Contact form handling: validation, the submission gateway, and the
//! counters that record what actually happened to each lead.

mod form;
mod gateway;
mod metrics;

pub use form::{ContactForm, ContactSubmission, Field, FieldError, FieldProblem, ValidationErrors};
pub use gateway::{ContactGateway, Outcome, StatusNotice, UnknownOutcome, DEFAULT_NOTICE_TTL};
pub use metrics::{MetricsReport, SubmissionMetrics};
