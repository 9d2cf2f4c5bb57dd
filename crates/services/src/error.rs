//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{WizardStateError, WizardStep};

/// Errors surfaced by backend collaborators (HTTP or in-memory).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not found")]
    NotFound,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while building the API configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API base url `{raw}`: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API base url `{0}` cannot carry paths")]
    NotABase(String),
}

/// Rejected wizard actions.
///
/// Every variant corresponds to an action the UI keeps disabled; none of
/// them changes wizard state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WizardError {
    #[error("cannot leave {from:?} yet: no topic selected")]
    NavigationBlocked { from: WizardStep },
    #[error("already at the first step")]
    AtFirstStep,
    #[error("already at the summary step")]
    AtLastStep,
    #[error("topics can only change while selecting topics")]
    TopicsLocked,
    #[error("field cannot be edited on {step:?}")]
    FieldLocked { step: WizardStep },
    #[error("submission is only possible from the summary step")]
    NotOnSummary,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("submission belongs to a previous wizard session")]
    StaleSubmission,
    #[error(transparent)]
    State(#[from] WizardStateError),
}

/// Errors emitted by the submit flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
