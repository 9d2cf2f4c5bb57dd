use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::field::{FieldValue, TopicField};
use crate::model::ids::{TopicId, UnitId};
use crate::model::topic::TopicSelection;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WizardStateError {
    #[error("topic {0} is not selected")]
    TopicNotSelected(TopicId),
}

//
// ─── STEPS ─────────────────────────────────────────────────────────────────────
//

/// Steps of the exam-configuration wizard, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectTopics,
    QuestionCounts,
    RelativeWeights,
    FinalSettings,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::SelectTopics,
        WizardStep::QuestionCounts,
        WizardStep::RelativeWeights,
        WizardStep::FinalSettings,
        WizardStep::Summary,
    ];

    /// Zero-based position of the step.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            WizardStep::SelectTopics => 0,
            WizardStep::QuestionCounts => 1,
            WizardStep::RelativeWeights => 2,
            WizardStep::FinalSettings => 3,
            WizardStep::Summary => 4,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    #[must_use]
    pub fn is_first(self) -> bool {
        self == WizardStep::SelectTopics
    }

    #[must_use]
    pub fn is_last(self) -> bool {
        self == WizardStep::Summary
    }
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

/// Descriptive exam fields. Forwarded to the backend untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMetadata {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

impl ExamMetadata {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.date.is_none()
            && self.semester.is_none()
            && self.academic_year.is_none()
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Form values accumulated by one wizard session.
///
/// Per-topic values are keyed by topic id. Entries of topics that get
/// deselected are retained, so re-selecting a topic restores what the user
/// typed before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    unit_id: UnitId,
    topics: Vec<TopicSelection>,
    number_questions: BTreeMap<TopicId, FieldValue>,
    relative_quotations: BTreeMap<TopicId, FieldValue>,
    number_exams: FieldValue,
    fraction: FieldValue,
    metadata: ExamMetadata,
}

impl WizardState {
    pub const DEFAULT_COUNT: u32 = 1;
    pub const DEFAULT_FRACTION: u32 = 0;

    /// Fresh state for a curricular unit: nothing selected, one exam, no fraction.
    #[must_use]
    pub fn new(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            topics: Vec::new(),
            number_questions: BTreeMap::new(),
            relative_quotations: BTreeMap::new(),
            number_exams: FieldValue::Value(Self::DEFAULT_COUNT),
            fraction: FieldValue::Value(Self::DEFAULT_FRACTION),
            metadata: ExamMetadata::default(),
        }
    }

    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// Selected topics in the order the selection table last reported them.
    #[must_use]
    pub fn topics(&self) -> &[TopicSelection] {
        &self.topics
    }

    #[must_use]
    pub fn is_selected(&self, id: TopicId) -> bool {
        self.topics.iter().any(|topic| topic.id == id)
    }

    #[must_use]
    pub fn topic_name(&self, id: TopicId) -> Option<&str> {
        self.topics
            .iter()
            .find(|topic| topic.id == id)
            .map(|topic| topic.name.as_str())
    }

    #[must_use]
    pub fn number_questions(&self, id: TopicId) -> Option<FieldValue> {
        self.number_questions.get(&id).copied()
    }

    #[must_use]
    pub fn relative_quotation(&self, id: TopicId) -> Option<FieldValue> {
        self.relative_quotations.get(&id).copied()
    }

    /// Every recorded question count, including retained entries of deselected topics.
    #[must_use]
    pub fn question_entries(&self) -> &BTreeMap<TopicId, FieldValue> {
        &self.number_questions
    }

    /// Every recorded relative weight, including retained entries of deselected topics.
    #[must_use]
    pub fn quotation_entries(&self) -> &BTreeMap<TopicId, FieldValue> {
        &self.relative_quotations
    }

    #[must_use]
    pub fn topic_field(&self, id: TopicId, field: TopicField) -> Option<FieldValue> {
        match field {
            TopicField::QuestionCount => self.number_questions(id),
            TopicField::RelativeWeight => self.relative_quotation(id),
        }
    }

    pub(crate) fn question_entries_mut(&mut self) -> &mut BTreeMap<TopicId, FieldValue> {
        &mut self.number_questions
    }

    pub(crate) fn quotation_entries_mut(&mut self) -> &mut BTreeMap<TopicId, FieldValue> {
        &mut self.relative_quotations
    }

    #[must_use]
    pub fn number_exams(&self) -> FieldValue {
        self.number_exams
    }

    #[must_use]
    pub fn fraction(&self) -> FieldValue {
        self.fraction
    }

    #[must_use]
    pub fn metadata(&self) -> &ExamMetadata {
        &self.metadata
    }

    /// Replace the selected topic set.
    ///
    /// Duplicate ids keep their first occurrence. Newly selected topics get
    /// both per-topic values initialised to 1 unless a retained value exists.
    pub fn select_topics(&mut self, selection: Vec<TopicSelection>) {
        let mut topics: Vec<TopicSelection> = Vec::with_capacity(selection.len());
        for topic in selection {
            if topics.iter().any(|existing| existing.id == topic.id) {
                continue;
            }
            self.number_questions
                .entry(topic.id)
                .or_insert(FieldValue::Value(Self::DEFAULT_COUNT));
            self.relative_quotations
                .entry(topic.id)
                .or_insert(FieldValue::Value(Self::DEFAULT_COUNT));
            topics.push(topic);
        }
        self.topics = topics;
    }

    /// # Errors
    ///
    /// Returns `WizardStateError::TopicNotSelected` for topics outside the selection.
    pub fn set_number_questions(
        &mut self,
        id: TopicId,
        value: FieldValue,
    ) -> Result<(), WizardStateError> {
        if !self.is_selected(id) {
            return Err(WizardStateError::TopicNotSelected(id));
        }
        self.number_questions.insert(id, value);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `WizardStateError::TopicNotSelected` for topics outside the selection.
    pub fn set_relative_quotation(
        &mut self,
        id: TopicId,
        value: FieldValue,
    ) -> Result<(), WizardStateError> {
        if !self.is_selected(id) {
            return Err(WizardStateError::TopicNotSelected(id));
        }
        self.relative_quotations.insert(id, value);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `WizardStateError::TopicNotSelected` for topics outside the selection.
    pub fn set_topic_field(
        &mut self,
        id: TopicId,
        field: TopicField,
        value: FieldValue,
    ) -> Result<(), WizardStateError> {
        match field {
            TopicField::QuestionCount => self.set_number_questions(id, value),
            TopicField::RelativeWeight => self.set_relative_quotation(id, value),
        }
    }

    pub fn set_number_exams(&mut self, value: FieldValue) {
        self.number_exams = value;
    }

    pub fn set_fraction(&mut self, value: FieldValue) {
        self.fraction = value;
    }

    pub fn set_metadata(&mut self, metadata: ExamMetadata) {
        self.metadata = metadata;
    }

    /// True when any field that would be submitted is still pending.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.number_exams.is_pending()
            || self.fraction.is_pending()
            || self.topics.iter().any(|topic| {
                self.number_questions(topic.id)
                    .is_none_or(FieldValue::is_pending)
                    || self
                        .relative_quotation(topic.id)
                        .is_none_or(FieldValue::is_pending)
            })
    }

    /// Copy of the state without the retained entries of deselected topics.
    #[must_use]
    pub fn selected_only(&self) -> Self {
        let keep = |map: &BTreeMap<TopicId, FieldValue>| {
            map.iter()
                .filter(|(id, _)| self.is_selected(**id))
                .map(|(id, value)| (*id, *value))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            unit_id: self.unit_id,
            topics: self.topics.clone(),
            number_questions: keep(&self.number_questions),
            relative_quotations: keep(&self.relative_quotations),
            number_exams: self.number_exams,
            fraction: self.fraction,
            metadata: self.metadata.clone(),
        }
    }
}
