use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use exam_core::model::{ExamConfig, ExamConfigId, Topic, UnitId};

use crate::error::BackendError;
use crate::submission::SubmissionPayload;

/// Generated exam returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExamArtifact {
    pub const DEFAULT_FILE_NAME: &'static str = "generated_exam.zip";

    #[must_use]
    pub fn new(file_name: Option<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_FILE_NAME.to_owned());
        Self { file_name, bytes }
    }
}

/// Source of per-topic question-bank sizes.
#[async_trait]
pub trait TopicBoundsSource: Send + Sync {
    async fn topic_bounds(&self, unit: UnitId) -> Result<Vec<Topic>, BackendError>;
}

/// Endpoint that turns a configuration into generated exams.
#[async_trait]
pub trait ExamSubmitter: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<ExamArtifact, BackendError>;
}

/// Saved exam configurations of a curricular unit.
#[async_trait]
pub trait ExamConfigSource: Send + Sync {
    async fn exam_configs(&self, unit: UnitId) -> Result<Vec<ExamConfig>, BackendError>;

    async fn exam_config(
        &self,
        unit: UnitId,
        id: ExamConfigId,
    ) -> Result<ExamConfig, BackendError> {
        self.exam_configs(unit)
            .await?
            .into_iter()
            .find(|config| config.id == id)
            .ok_or(BackendError::NotFound)
    }
}

#[derive(Debug, Default)]
struct Faults {
    failing_submits: usize,
    bounds_unavailable: bool,
}

/// In-process backend used by tests and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    topics: Arc<Mutex<HashMap<UnitId, Vec<Topic>>>>,
    configs: Arc<Mutex<HashMap<UnitId, Vec<ExamConfig>>>>,
    submissions: Arc<Mutex<Vec<SubmissionPayload>>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the topic list of a unit.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the store lock is poisoned.
    pub fn put_topics(&self, unit: UnitId, topics: Vec<Topic>) -> Result<(), BackendError> {
        let mut guard = self.topics.lock().map_err(poisoned)?;
        guard.insert(unit, topics);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the store lock is poisoned.
    pub fn put_config(&self, config: ExamConfig) -> Result<(), BackendError> {
        let mut guard = self.configs.lock().map_err(poisoned)?;
        let configs = guard.entry(config.subject_id).or_default();
        configs.retain(|existing| existing.id != config.id);
        configs.push(config);
        Ok(())
    }

    /// Make the next `count` submissions fail.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the store lock is poisoned.
    pub fn fail_next_submits(&self, count: usize) -> Result<(), BackendError> {
        self.faults.lock().map_err(poisoned)?.failing_submits = count;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the store lock is poisoned.
    pub fn set_bounds_unavailable(&self, unavailable: bool) -> Result<(), BackendError> {
        self.faults.lock().map_err(poisoned)?.bounds_unavailable = unavailable;
        Ok(())
    }

    /// Payloads accepted so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the store lock is poisoned.
    pub fn submissions(&self) -> Result<Vec<SubmissionPayload>, BackendError> {
        Ok(self.submissions.lock().map_err(poisoned)?.clone())
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> BackendError {
    BackendError::Unavailable(err.to_string())
}

#[async_trait]
impl TopicBoundsSource for InMemoryBackend {
    async fn topic_bounds(&self, unit: UnitId) -> Result<Vec<Topic>, BackendError> {
        if self.faults.lock().map_err(poisoned)?.bounds_unavailable {
            return Err(BackendError::Unavailable("topic metadata offline".into()));
        }
        let guard = self.topics.lock().map_err(poisoned)?;
        Ok(guard.get(&unit).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ExamSubmitter for InMemoryBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<ExamArtifact, BackendError> {
        {
            let mut faults = self.faults.lock().map_err(poisoned)?;
            if faults.failing_submits > 0 {
                faults.failing_submits -= 1;
                return Err(BackendError::Unavailable("generation failed".into()));
            }
        }

        let mut guard = self.submissions.lock().map_err(poisoned)?;
        guard.push(payload.clone());
        let bytes = format!("exam for subject {}", payload.subject_id).into_bytes();
        Ok(ExamArtifact::new(None, bytes))
    }
}

#[async_trait]
impl ExamConfigSource for InMemoryBackend {
    async fn exam_configs(&self, unit: UnitId) -> Result<Vec<ExamConfig>, BackendError> {
        let guard = self.configs.lock().map_err(poisoned)?;
        Ok(guard.get(&unit).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::{PayloadKeying, build_payload};
    use exam_core::model::{TopicId, WizardState};

    fn topic(id: u64, max: u32) -> Topic {
        Topic::new(TopicId::new(id), format!("Topic {id}"), max).unwrap()
    }

    #[test]
    fn artifact_falls_back_to_default_name() {
        assert_eq!(ExamArtifact::new(None, vec![]).file_name, "generated_exam.zip");
        assert_eq!(
            ExamArtifact::new(Some("  ".into()), vec![]).file_name,
            "generated_exam.zip"
        );
        assert_eq!(ExamArtifact::new(Some("exam.zip".into()), vec![]).file_name, "exam.zip");
    }

    #[tokio::test]
    async fn topic_bounds_roundtrip() {
        let backend = InMemoryBackend::new();
        backend.put_topics(UnitId::new(1), vec![topic(1, 10)]).unwrap();

        let topics = backend.topic_bounds(UnitId::new(1)).await.unwrap();
        assert_eq!(topics, vec![topic(1, 10)]);
        assert!(backend.topic_bounds(UnitId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bounds_outage_is_reported() {
        let backend = InMemoryBackend::new();
        backend.set_bounds_unavailable(true).unwrap();
        let err = backend.topic_bounds(UnitId::new(1)).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[tokio::test]
    async fn injected_submit_failures_are_consumed() {
        let backend = InMemoryBackend::new();
        backend.fail_next_submits(1).unwrap();
        let payload = build_payload(&WizardState::new(UnitId::new(1)), PayloadKeying::ByName);

        assert!(backend.submit(&payload).await.is_err());
        assert!(backend.submit(&payload).await.is_ok());
        assert_eq!(backend.submissions().unwrap(), vec![payload]);
    }

    #[tokio::test]
    async fn missing_config_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend
            .exam_config(UnitId::new(1), ExamConfigId::new(4))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
    }
}
