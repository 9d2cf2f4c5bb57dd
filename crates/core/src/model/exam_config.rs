use serde::{Deserialize, Serialize};

use crate::model::field::FieldValue;
use crate::model::ids::{ExamConfigId, TopicId, UnitId};
use crate::model::topic::TopicSelection;
use crate::model::wizard::WizardState;

/// Per-topic part of a stored exam configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub topic_id: TopicId,
    pub topic_name: String,
    pub number_questions: u32,
    pub relative_weight: f64,
}

/// An exam configuration previously generated for a curricular unit.
///
/// Used to pre-seed the wizard when an existing exam is edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    pub id: ExamConfigId,
    pub subject_id: UnitId,
    #[serde(default)]
    pub fraction: u32,
    #[serde(default = "default_variations")]
    pub num_variations: u32,
    #[serde(default)]
    pub topic_configs: Vec<TopicConfig>,
}

fn default_variations() -> u32 {
    1
}

impl ExamConfig {
    /// Total questions across every topic of the configuration.
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.topic_configs
            .iter()
            .map(|topic| topic.number_questions.max(1))
            .fold(0u32, u32::saturating_add)
    }
}

/// Stored weights are floats; the wizard edits whole numbers of at least 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn weight_to_field(weight: f64) -> u32 {
    let rounded = weight.round();
    if !rounded.is_finite() || rounded < 1.0 {
        return 1;
    }
    rounded.min(f64::from(u32::MAX)) as u32
}

impl WizardState {
    /// Seed a wizard session from an existing configuration (edit flow).
    ///
    /// Counts are taken verbatim; they are clamped against the topic bounds
    /// once those are known.
    #[must_use]
    pub fn from_exam_config(config: &ExamConfig) -> Self {
        let mut state = WizardState::new(config.subject_id);
        state.select_topics(
            config
                .topic_configs
                .iter()
                .map(|topic| TopicSelection::new(topic.topic_id, topic.topic_name.clone()))
                .collect(),
        );

        for topic in &config.topic_configs {
            if state.topic_name(topic.topic_id) != Some(topic.topic_name.as_str()) {
                continue;
            }
            let count = FieldValue::Value(topic.number_questions.max(1));
            let weight = FieldValue::Value(weight_to_field(topic.relative_weight));
            state.question_entries_mut().insert(topic.topic_id, count);
            state.quotation_entries_mut().insert(topic.topic_id, weight);
        }

        state.set_number_exams(FieldValue::Value(config.num_variations.max(1)));
        state.set_fraction(FieldValue::Value(config.fraction.min(100)));
        state
    }
}
