use std::sync::Arc;

use tracing::{info, warn};

use exam_core::model::{ExamConfigId, Topic, UnitId};

use crate::backend::{
    ExamArtifact, ExamConfigSource, ExamSubmitter, InMemoryBackend, TopicBoundsSource,
};
use crate::error::{BackendError, SubmissionError};
use crate::submission::PayloadKeying;

use super::controller::{SubmitTicket, WizardController};

/// Orchestrates the async edges of the wizard: loading topic bounds,
/// seeding edit flows and running a guarded submission.
#[derive(Clone)]
pub struct WizardService {
    bounds: Arc<dyn TopicBoundsSource>,
    submitter: Arc<dyn ExamSubmitter>,
    configs: Arc<dyn ExamConfigSource>,
    keying: PayloadKeying,
}

impl WizardService {
    #[must_use]
    pub fn new(
        bounds: Arc<dyn TopicBoundsSource>,
        submitter: Arc<dyn ExamSubmitter>,
        configs: Arc<dyn ExamConfigSource>,
    ) -> Self {
        Self {
            bounds,
            submitter,
            configs,
            keying: PayloadKeying::default(),
        }
    }

    /// Wire every collaborator to one backend.
    #[must_use]
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: TopicBoundsSource + ExamSubmitter + ExamConfigSource + Clone + 'static,
    {
        Self::new(
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend),
        )
    }

    #[must_use]
    pub fn in_memory() -> (Self, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        (Self::from_backend(backend.clone()), backend)
    }

    #[must_use]
    pub fn with_keying(mut self, keying: PayloadKeying) -> Self {
        self.keying = keying;
        self
    }

    /// Topics of a unit with their bounds.
    ///
    /// A failing metadata source degrades to an empty list, which leaves
    /// every question count unbounded.
    pub async fn load_topics(&self, unit: UnitId) -> Vec<Topic> {
        match self.bounds.topic_bounds(unit).await {
            Ok(topics) => topics,
            Err(err) => {
                warn!(%unit, error = %err, "topic metadata unavailable, question counts unbounded");
                Vec::new()
            }
        }
    }

    /// Fresh wizard for a unit, with whatever bounds could be loaded.
    pub async fn start(&self, unit: UnitId) -> (WizardController, Vec<Topic>) {
        let mut controller = WizardController::new(unit).with_keying(self.keying);
        let topics = self.load_topics(unit).await;
        controller.apply_bounds(&topics);
        (controller, topics)
    }

    /// Wizard pre-filled from a stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` when the configuration does not
    /// exist, or the error of the configuration source.
    pub async fn start_edit(
        &self,
        unit: UnitId,
        config_id: ExamConfigId,
    ) -> Result<(WizardController, Vec<Topic>), BackendError> {
        let config = self.configs.exam_config(unit, config_id).await?;
        let mut controller = WizardController::from_exam_config(&config).with_keying(self.keying);
        let topics = self.load_topics(unit).await;
        controller.apply_bounds(&topics);
        Ok((controller, topics))
    }

    /// Submit the controller's snapshot and apply the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Wizard` when submitting is not possible and
    /// `SubmissionError::Backend` when the backend failed; values are kept
    /// in the latter case.
    pub async fn submit(
        &self,
        controller: &mut WizardController,
    ) -> Result<ExamArtifact, SubmissionError> {
        let ticket = controller.begin_submit()?;
        let outcome = self.submit_ticket(&ticket).await;
        controller.finish_submit(&ticket, outcome.is_ok())?;
        Ok(outcome?)
    }

    /// Send a ticket's payload without touching any controller.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn submit_ticket(&self, ticket: &SubmitTicket) -> Result<ExamArtifact, BackendError> {
        let result = self.submitter.submit(ticket.payload()).await;
        match &result {
            Ok(artifact) => info!(
                session = %ticket.session(),
                file = %artifact.file_name,
                bytes = artifact.bytes.len(),
                "exam artifact received"
            ),
            Err(err) => warn!(session = %ticket.session(), error = %err, "exam submission failed"),
        }
        result
    }
}
