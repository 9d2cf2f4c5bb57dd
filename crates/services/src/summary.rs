//! Read-only projection of the wizard state for the summary step.

use exam_core::constraints::Bound;
use exam_core::model::{ExamMetadata, TopicId, WizardState};
use exam_core::normalize::{self, FieldRule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub topic_id: TopicId,
    pub name: String,
    pub question_count: u32,
    pub relative_weight: u32,
}

/// What the summary step shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub rows: Vec<SummaryRow>,
    pub total_questions: u32,
    pub exam_count: u32,
    pub fraction_percent: u32,
    pub metadata: ExamMetadata,
    /// True when projected from the normalized snapshot taken on entering the summary.
    pub is_frozen: bool,
}

/// Project the frozen snapshot when present, the live state otherwise.
///
/// Pending live values are shown as their blur default.
#[must_use]
pub fn project_summary(live: &WizardState, frozen: Option<&WizardState>) -> SummaryView {
    let state = frozen.unwrap_or(live);
    let count_rule = FieldRule::question_count(Bound::Unbounded);

    let rows: Vec<SummaryRow> = state
        .topics()
        .iter()
        .map(|topic| SummaryRow {
            topic_id: topic.id,
            name: topic.name.clone(),
            question_count: state
                .number_questions(topic.id)
                .map_or(count_rule.default_value(), |value| {
                    normalize::on_blur(value, count_rule)
                }),
            relative_weight: state
                .relative_quotation(topic.id)
                .map_or(FieldRule::RELATIVE_WEIGHT.default_value(), |value| {
                    normalize::on_blur(value, FieldRule::RELATIVE_WEIGHT)
                }),
        })
        .collect();

    SummaryView {
        total_questions: rows
            .iter()
            .map(|row| row.question_count)
            .fold(0, u32::saturating_add),
        rows,
        exam_count: normalize::on_blur(state.number_exams(), FieldRule::EXAM_COUNT),
        fraction_percent: normalize::on_blur(state.fraction(), FieldRule::FRACTION),
        metadata: state.metadata().clone(),
        is_frozen: frozen.is_some(),
    }
}
