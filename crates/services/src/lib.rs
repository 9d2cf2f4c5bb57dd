#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod http;
pub mod submission;
pub mod summary;
pub mod wizard;

pub use backend::{
    ExamArtifact, ExamConfigSource, ExamSubmitter, InMemoryBackend, TopicBoundsSource,
};
pub use error::{BackendError, ConfigError, SubmissionError, WizardError};
pub use http::{ApiConfig, ExamApiClient};
pub use submission::{PayloadKeying, SubmissionPayload, TopicKey, build_payload};
pub use summary::{SummaryRow, SummaryView, project_summary};
pub use wizard::{SubmitTicket, WizardController, WizardService};
