//! Translation of id-keyed wizard state into the backend's request body.
//!
//! The wizard tracks everything by topic id; the generation endpoint keys
//! its configuration by topic name. This is the only place where that
//! translation happens.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use exam_core::constraints::Bound;
use exam_core::model::{FieldValue, TopicId, UnitId, WizardState};
use exam_core::normalize::{self, FieldRule};

/// How topics are identified on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadKeying {
    #[default]
    ByName,
    ById,
}

/// Key of a topic in the request body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum TopicKey {
    Name(String),
    Id(TopicId),
}

/// Body of the exam-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub subject_id: UnitId,
    pub fraction: u32,
    pub num_variations: u32,
    pub topics: Vec<TopicKey>,
    pub number_questions: BTreeMap<TopicKey, u32>,
    pub relative_quotations: BTreeMap<TopicKey, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
}

/// Build the request body from a (normalized) wizard state.
///
/// Topics whose name or values cannot be resolved are left out and logged;
/// with a normalized state this never happens.
#[must_use]
pub fn build_payload(state: &WizardState, keying: PayloadKeying) -> SubmissionPayload {
    let mut topics = Vec::with_capacity(state.topics().len());
    let mut number_questions = BTreeMap::new();
    let mut relative_quotations = BTreeMap::new();

    for topic in state.topics() {
        let key = match keying {
            PayloadKeying::ById => TopicKey::Id(topic.id),
            PayloadKeying::ByName => {
                let name = topic.name.trim();
                if name.is_empty() {
                    warn!(topic_id = %topic.id, "selected topic has no name, leaving it out of the request");
                    continue;
                }
                TopicKey::Name(name.to_owned())
            }
        };

        if number_questions.contains_key(&key) {
            warn!(topic_id = %topic.id, ?key, "two selected topics share a key, keeping the first");
            continue;
        }

        let (Some(count), Some(weight)) = (
            state.number_questions(topic.id),
            state.relative_quotation(topic.id),
        ) else {
            warn!(topic_id = %topic.id, "selected topic has no recorded values, leaving it out of the request");
            continue;
        };

        number_questions.insert(
            key.clone(),
            resolve(count, FieldRule::question_count(Bound::Unbounded)),
        );
        relative_quotations.insert(key.clone(), resolve(weight, FieldRule::RELATIVE_WEIGHT));
        topics.push(key);
    }

    let metadata = state.metadata();
    let title = metadata.title.trim();

    SubmissionPayload {
        subject_id: state.unit_id(),
        fraction: resolve(state.fraction(), FieldRule::FRACTION),
        num_variations: resolve(state.number_exams(), FieldRule::EXAM_COUNT),
        topics,
        number_questions,
        relative_quotations,
        title: (!title.is_empty()).then(|| title.to_owned()),
        date: metadata.date,
        semester: non_blank(metadata.semester.as_deref()),
        academic_year: non_blank(metadata.academic_year.as_deref()),
    }
}

fn resolve(value: FieldValue, rule: FieldRule) -> u32 {
    normalize::on_blur(value, rule)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
