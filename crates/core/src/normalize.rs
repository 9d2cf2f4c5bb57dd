//! Clamp and default rules for the wizard's numeric fields.
//!
//! Rules run at three points: on every change (permissive, keeps empty input
//! pending), on blur (authoritative for one field) and in bulk when the
//! wizard enters its summary step (authoritative for the whole state).

use std::num::IntErrorKind;

use crate::constraints::{Bound, ConstraintResolver};
use crate::model::{FieldValue, TopicField, TopicId, WizardState};

/// Accepted range and fallback value of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    min: u32,
    max: Option<u32>,
    default: u32,
}

impl FieldRule {
    pub const RELATIVE_WEIGHT: Self = Self {
        min: 1,
        max: None,
        default: 1,
    };

    pub const EXAM_COUNT: Self = Self {
        min: 1,
        max: None,
        default: 1,
    };

    pub const FRACTION: Self = Self {
        min: 0,
        max: Some(100),
        default: 0,
    };

    /// Rule for a question count. A bank reporting zero questions still
    /// bounds the field at 1.
    #[must_use]
    pub fn question_count(bound: Bound) -> Self {
        Self {
            min: 1,
            max: bound.ceiling().map(|max| max.max(1)),
            default: 1,
        }
    }

    #[must_use]
    pub fn min(self) -> u32 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> Option<u32> {
        self.max
    }

    #[must_use]
    pub fn default_value(self) -> u32 {
        self.default
    }

    #[must_use]
    pub fn contains(self, value: u32) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }

    /// Clamp any integer into the rule's range.
    #[must_use]
    pub fn clamp(self, raw: i64) -> u32 {
        let upper = self.max.map_or(i64::from(u32::MAX), i64::from);
        let clamped = raw.clamp(i64::from(self.min), upper);
        u32::try_from(clamped).unwrap_or(self.default)
    }
}

/// Parse user input as an integer.
///
/// Surrounding whitespace and a leading sign are accepted. Digit strings too
/// long for `i64` saturate instead of failing, so "99999999999999999999"
/// still clamps to the field maximum.
#[must_use]
pub fn parse_integer(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

/// Value to store while the user is typing.
///
/// Empty or non-numeric text stays pending so a number can be backspaced
/// through; numbers are clamped right away.
#[must_use]
pub fn on_change(raw: &str, rule: FieldRule) -> FieldValue {
    if raw.trim().is_empty() {
        return FieldValue::Pending;
    }
    parse_integer(raw).map_or(FieldValue::Pending, |value| {
        FieldValue::Value(rule.clamp(value))
    })
}

/// Value to store when the field loses focus.
#[must_use]
pub fn on_blur(value: FieldValue, rule: FieldRule) -> u32 {
    match value {
        FieldValue::Value(v) => rule.clamp(i64::from(v)),
        FieldValue::Pending => rule.default,
    }
}

/// Re-clamp a stored value after its rule changed. Pending stays pending.
#[must_use]
pub fn reclamp(value: FieldValue, rule: FieldRule) -> FieldValue {
    match value {
        FieldValue::Value(v) => FieldValue::Value(rule.clamp(i64::from(v))),
        FieldValue::Pending => FieldValue::Pending,
    }
}

/// Apply the blur rule to every submitted field.
///
/// The result carries only the selected topics and holds no pending values.
/// Applying it twice gives the same state.
#[must_use]
pub fn bulk_normalize(state: &WizardState, constraints: &ConstraintResolver) -> WizardState {
    let mut normalized = state.selected_only();
    let ids: Vec<TopicId> = state.topics().iter().map(|topic| topic.id).collect();

    for id in ids {
        let count = state.number_questions(id).unwrap_or(FieldValue::Pending);
        let weight = state.relative_quotation(id).unwrap_or(FieldValue::Pending);
        let count = on_blur(count, constraints.question_rule(id));
        let weight = on_blur(weight, FieldRule::RELATIVE_WEIGHT);
        normalized
            .question_entries_mut()
            .insert(id, FieldValue::Value(count));
        normalized
            .quotation_entries_mut()
            .insert(id, FieldValue::Value(weight));
    }

    normalized.set_number_exams(FieldValue::Value(on_blur(
        state.number_exams(),
        FieldRule::EXAM_COUNT,
    )));
    normalized.set_fraction(FieldValue::Value(on_blur(
        state.fraction(),
        FieldRule::FRACTION,
    )));
    normalized
}

/// Apply the blur rule to one per-topic field of every selected topic.
///
/// Retained entries of deselected topics are left as they are.
pub fn blur_selected(
    state: &mut WizardState,
    field: TopicField,
    constraints: &ConstraintResolver,
) {
    let rules: Vec<(TopicId, FieldRule)> = state
        .topics()
        .iter()
        .map(|topic| {
            let rule = match field {
                TopicField::QuestionCount => constraints.question_rule(topic.id),
                TopicField::RelativeWeight => FieldRule::RELATIVE_WEIGHT,
            };
            (topic.id, rule)
        })
        .collect();
    let entries = match field {
        TopicField::QuestionCount => state.question_entries_mut(),
        TopicField::RelativeWeight => state.quotation_entries_mut(),
    };
    for (id, rule) in rules {
        let entry = entries.entry(id).or_insert(FieldValue::Pending);
        *entry = FieldValue::Value(on_blur(*entry, rule));
    }
}

/// Clamp stored question counts that exceed their (new) bound.
///
/// Covers retained entries of deselected topics too. Returns the ids whose
/// value changed.
pub fn clamp_to_bounds(state: &mut WizardState, constraints: &ConstraintResolver) -> Vec<TopicId> {
    let mut changed = Vec::new();
    for (id, value) in state.question_entries_mut().iter_mut() {
        let clamped = reclamp(*value, constraints.question_rule(*id));
        if clamped != *value {
            *value = clamped;
            changed.push(*id);
        }
    }
    changed
}
