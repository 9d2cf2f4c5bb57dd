use tracing::{debug, info, warn};

use exam_core::constraints::ConstraintResolver;
use exam_core::model::{
    ExamConfig, ExamMetadata, FieldValue, Topic, TopicField, TopicId, TopicSelection, UnitId,
    WizardSessionId, WizardState, WizardStep,
};
use exam_core::normalize::{self, FieldRule};

use crate::error::WizardError;
use crate::submission::{PayloadKeying, SubmissionPayload, build_payload};
use crate::summary::{SummaryView, project_summary};

/// Proof that a submission was started by a particular wizard session.
///
/// Returned by [`WizardController::begin_submit`] and handed back to
/// [`WizardController::finish_submit`] once the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    session: WizardSessionId,
    payload: SubmissionPayload,
}

impl SubmitTicket {
    #[must_use]
    pub fn session(&self) -> WizardSessionId {
        self.session
    }

    #[must_use]
    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }
}

/// Step state machine of the exam-configuration wizard.
///
/// Owns the form values, the current step, the normalized snapshot taken on
/// entering the summary, and the in-flight flag of the submit button.
/// Rejected actions return a `WizardError` and leave everything untouched.
#[derive(Debug, Clone)]
pub struct WizardController {
    session: WizardSessionId,
    state: WizardState,
    step: WizardStep,
    frozen: Option<WizardState>,
    constraints: ConstraintResolver,
    keying: PayloadKeying,
    in_flight: bool,
}

impl WizardController {
    #[must_use]
    pub fn new(unit: UnitId) -> Self {
        Self::from_state(WizardState::new(unit))
    }

    /// Start on the first step with pre-filled values.
    #[must_use]
    pub fn from_state(state: WizardState) -> Self {
        Self {
            session: WizardSessionId::generate(),
            state,
            step: WizardStep::SelectTopics,
            frozen: None,
            constraints: ConstraintResolver::unbounded(),
            keying: PayloadKeying::default(),
            in_flight: false,
        }
    }

    /// Edit flow: seed the wizard from a stored configuration.
    #[must_use]
    pub fn from_exam_config(config: &ExamConfig) -> Self {
        Self::from_state(WizardState::from_exam_config(config))
    }

    #[must_use]
    pub fn with_keying(mut self, keying: PayloadKeying) -> Self {
        self.keying = keying;
        self
    }

    #[must_use]
    pub fn session(&self) -> WizardSessionId {
        self.session
    }

    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.state.unit_id()
    }

    #[must_use]
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Normalized snapshot, present only while on the summary step.
    #[must_use]
    pub fn frozen(&self) -> Option<&WizardState> {
        self.frozen.as_ref()
    }

    #[must_use]
    pub fn constraints(&self) -> &ConstraintResolver {
        &self.constraints
    }

    #[must_use]
    pub fn keying(&self) -> PayloadKeying {
        self.keying
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        match self.step {
            WizardStep::SelectTopics => !self.state.topics().is_empty(),
            WizardStep::Summary => false,
            _ => true,
        }
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.step.is_first() && !self.in_flight
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.step.is_last() && !self.in_flight
    }

    /// Advance one step.
    ///
    /// Pending fields of the step being left resolve to their defaults;
    /// leaving the final settings stores the normalized snapshot.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NavigationBlocked` when no topic is selected and
    /// `WizardError::AtLastStep` on the summary.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let Some(target) = self.step.next() else {
            return Err(WizardError::AtLastStep);
        };
        if !self.can_go_next() {
            return Err(WizardError::NavigationBlocked { from: self.step });
        }

        match self.step {
            WizardStep::QuestionCounts => self.blur_all(TopicField::QuestionCount),
            WizardStep::RelativeWeights => self.blur_all(TopicField::RelativeWeight),
            WizardStep::FinalSettings => {
                self.blur_settings();
                self.frozen = Some(normalize::bulk_normalize(&self.state, &self.constraints));
            }
            WizardStep::SelectTopics | WizardStep::Summary => {}
        }

        debug!(session = %self.session, from = ?self.step, to = ?target, "wizard advanced");
        self.step = target;
        Ok(target)
    }

    /// Go back one step. Stored values stay; the snapshot is discarded.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::AtFirstStep` on the first step and
    /// `WizardError::SubmissionInFlight` while submitting.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        if self.in_flight {
            return Err(WizardError::SubmissionInFlight);
        }
        let Some(target) = self.step.previous() else {
            return Err(WizardError::AtFirstStep);
        };
        debug!(session = %self.session, from = ?self.step, to = ?target, "wizard went back");
        self.frozen = None;
        self.step = target;
        Ok(target)
    }

    fn blur_all(&mut self, field: TopicField) {
        normalize::blur_selected(&mut self.state, field, &self.constraints);
    }

    fn blur_settings(&mut self) {
        let exams = normalize::on_blur(self.state.number_exams(), FieldRule::EXAM_COUNT);
        let fraction = normalize::on_blur(self.state.fraction(), FieldRule::FRACTION);
        self.state.set_number_exams(FieldValue::Value(exams));
        self.state.set_fraction(FieldValue::Value(fraction));
    }

    //
    // ─── EDITS ─────────────────────────────────────────────────────────────────
    //

    /// Replace the selected topics with what the selection table reported.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::TopicsLocked` outside the topic step.
    pub fn set_topics(&mut self, topics: Vec<TopicSelection>) -> Result<(), WizardError> {
        if self.step != WizardStep::SelectTopics {
            return Err(WizardError::TopicsLocked);
        }
        self.state.select_topics(topics);
        debug!(session = %self.session, selected = self.state.topics().len(), "topics changed");
        Ok(())
    }

    /// Input rule currently applying to a per-topic field.
    #[must_use]
    pub fn topic_rule(&self, id: TopicId, field: TopicField) -> FieldRule {
        match field {
            TopicField::QuestionCount => self.constraints.question_rule(id),
            TopicField::RelativeWeight => FieldRule::RELATIVE_WEIGHT,
        }
    }

    /// Whether the bound of a topic's question count is known.
    #[must_use]
    pub fn is_validated(&self, id: TopicId) -> bool {
        self.constraints.is_validated(id)
    }

    fn editable_on(field: TopicField) -> WizardStep {
        match field {
            TopicField::QuestionCount => WizardStep::QuestionCounts,
            TopicField::RelativeWeight => WizardStep::RelativeWeights,
        }
    }

    fn require_step(&self, step: WizardStep) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::FieldLocked { step: self.step })
        }
    }

    /// Store raw text typed into a per-topic field.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::FieldLocked` when the field is not on the
    /// current step and `WizardError::State` for unselected topics.
    pub fn edit_topic_field(
        &mut self,
        id: TopicId,
        field: TopicField,
        raw: &str,
    ) -> Result<FieldValue, WizardError> {
        self.require_step(Self::editable_on(field))?;
        let value = normalize::on_change(raw, self.topic_rule(id, field));
        self.state.set_topic_field(id, field, value)?;
        Ok(value)
    }

    /// Resolve a per-topic field when it loses focus.
    ///
    /// # Errors
    ///
    /// Same as [`Self::edit_topic_field`].
    pub fn blur_topic_field(&mut self, id: TopicId, field: TopicField) -> Result<u32, WizardError> {
        self.require_step(Self::editable_on(field))?;
        let current = self
            .state
            .topic_field(id, field)
            .unwrap_or(FieldValue::Pending);
        let resolved = normalize::on_blur(current, self.topic_rule(id, field));
        self.state
            .set_topic_field(id, field, FieldValue::Value(resolved))?;
        Ok(resolved)
    }

    /// # Errors
    ///
    /// Returns `WizardError::FieldLocked` outside the final settings step.
    pub fn edit_number_exams(&mut self, raw: &str) -> Result<FieldValue, WizardError> {
        self.require_step(WizardStep::FinalSettings)?;
        let value = normalize::on_change(raw, FieldRule::EXAM_COUNT);
        self.state.set_number_exams(value);
        Ok(value)
    }

    /// # Errors
    ///
    /// Returns `WizardError::FieldLocked` outside the final settings step.
    pub fn blur_number_exams(&mut self) -> Result<u32, WizardError> {
        self.require_step(WizardStep::FinalSettings)?;
        let resolved = normalize::on_blur(self.state.number_exams(), FieldRule::EXAM_COUNT);
        self.state.set_number_exams(FieldValue::Value(resolved));
        Ok(resolved)
    }

    /// # Errors
    ///
    /// Returns `WizardError::FieldLocked` outside the final settings step.
    pub fn edit_fraction(&mut self, raw: &str) -> Result<FieldValue, WizardError> {
        self.require_step(WizardStep::FinalSettings)?;
        let value = normalize::on_change(raw, FieldRule::FRACTION);
        self.state.set_fraction(value);
        Ok(value)
    }

    /// # Errors
    ///
    /// Returns `WizardError::FieldLocked` outside the final settings step.
    pub fn blur_fraction(&mut self) -> Result<u32, WizardError> {
        self.require_step(WizardStep::FinalSettings)?;
        let resolved = normalize::on_blur(self.state.fraction(), FieldRule::FRACTION);
        self.state.set_fraction(FieldValue::Value(resolved));
        Ok(resolved)
    }

    /// # Errors
    ///
    /// Returns `WizardError::FieldLocked` outside the final settings step.
    pub fn set_metadata(&mut self, metadata: ExamMetadata) -> Result<(), WizardError> {
        self.require_step(WizardStep::FinalSettings)?;
        self.state.set_metadata(metadata);
        Ok(())
    }

    /// Record fresh topic metadata and clamp every stored count above its
    /// new bound, in the live state and in the snapshot.
    ///
    /// Returns the ids whose live value was clamped.
    pub fn apply_bounds(&mut self, topics: &[Topic]) -> Vec<TopicId> {
        let changed_bounds = self.constraints.merge(topics);
        if changed_bounds.is_empty() {
            return Vec::new();
        }
        let clamped = normalize::clamp_to_bounds(&mut self.state, &self.constraints);
        if let Some(frozen) = self.frozen.as_mut() {
            normalize::clamp_to_bounds(frozen, &self.constraints);
        }
        if !clamped.is_empty() {
            debug!(session = %self.session, ?clamped, "question counts clamped to new bounds");
        }
        clamped
    }

    //
    // ─── SUMMARY & SUBMISSION ──────────────────────────────────────────────────
    //

    #[must_use]
    pub fn summary(&self) -> SummaryView {
        project_summary(&self.state, self.frozen.as_ref())
    }

    /// Request body for the current values: the snapshot on the summary,
    /// a normalized copy of the live state otherwise.
    #[must_use]
    pub fn payload(&self) -> SubmissionPayload {
        match &self.frozen {
            Some(frozen) => build_payload(frozen, self.keying),
            None => build_payload(
                &normalize::bulk_normalize(&self.state, &self.constraints),
                self.keying,
            ),
        }
    }

    /// Mark a submission as in flight and hand out its ticket.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NotOnSummary` before the summary step and
    /// `WizardError::SubmissionInFlight` while another submission runs.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, WizardError> {
        if !self.step.is_last() {
            return Err(WizardError::NotOnSummary);
        }
        if self.in_flight {
            return Err(WizardError::SubmissionInFlight);
        }
        let ticket = SubmitTicket {
            session: self.session,
            payload: self.payload(),
        };
        self.in_flight = true;
        info!(
            session = %self.session,
            topics = ticket.payload.topics.len(),
            "exam generation requested"
        );
        Ok(ticket)
    }

    /// Apply the outcome of a submission.
    ///
    /// Success resets the wizard into a new session; failure keeps every
    /// value and re-enables the submit button.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::StaleSubmission` for tickets of another session
    /// or when no submission is in flight; nothing changes in that case.
    pub fn finish_submit(
        &mut self,
        ticket: &SubmitTicket,
        succeeded: bool,
    ) -> Result<(), WizardError> {
        if ticket.session != self.session || !self.in_flight {
            warn!(
                ticket = %ticket.session,
                current = %self.session,
                "ignoring completion of a stale submission"
            );
            return Err(WizardError::StaleSubmission);
        }
        self.in_flight = false;
        if succeeded {
            info!(session = %self.session, "exam generated, starting a new wizard session");
            self.reset();
        } else {
            warn!(session = %self.session, "exam generation failed, values kept for retry");
        }
        Ok(())
    }

    /// Discard everything and start a new session for the same unit.
    ///
    /// Known topic bounds are kept.
    pub fn reset(&mut self) {
        self.session = WizardSessionId::generate();
        self.state = WizardState::new(self.state.unit_id());
        self.step = WizardStep::SelectTopics;
        self.frozen = None;
        self.in_flight = false;
        debug!(session = %self.session, "wizard reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::TopicKey;

    fn topics() -> Vec<Topic> {
        vec![
            Topic::new(TopicId::new(1), "Arquiteturas", 10).unwrap(),
            Topic::new(TopicId::new(2), "BD", 5).unwrap(),
        ]
    }

    fn controller() -> WizardController {
        let mut wizard = WizardController::new(UnitId::new(1));
        wizard.apply_bounds(&topics());
        wizard
            .set_topics(topics().iter().map(TopicSelection::from).collect())
            .unwrap();
        wizard
    }

    fn to_summary(wizard: &mut WizardController) {
        while wizard.step() != WizardStep::Summary {
            wizard.next().unwrap();
        }
    }

    #[test]
    fn cannot_leave_first_step_without_topics() {
        let mut wizard = WizardController::new(UnitId::new(1));
        assert!(!wizard.can_go_next());
        assert_eq!(
            wizard.next(),
            Err(WizardError::NavigationBlocked {
                from: WizardStep::SelectTopics
            })
        );
        assert_eq!(wizard.step(), WizardStep::SelectTopics);
    }

    #[test]
    fn back_on_first_step_is_rejected() {
        let mut wizard = controller();
        assert!(!wizard.can_go_back());
        assert_eq!(wizard.back(), Err(WizardError::AtFirstStep));
    }

    #[test]
    fn edit_clamps_to_topic_bound() {
        let mut wizard = controller();
        wizard.next().unwrap();
        let value = wizard
            .edit_topic_field(TopicId::new(2), TopicField::QuestionCount, "20")
            .unwrap();
        assert_eq!(value, FieldValue::Value(5));
    }

    #[test]
    fn leaving_counts_step_resolves_pending_values() {
        let mut wizard = controller();
        wizard.next().unwrap();
        wizard
            .edit_topic_field(TopicId::new(1), TopicField::QuestionCount, "")
            .unwrap();
        wizard.next().unwrap();
        assert_eq!(
            wizard.state().number_questions(TopicId::new(1)),
            Some(FieldValue::Value(1))
        );
    }

    #[test]
    fn fields_are_locked_outside_their_step() {
        let mut wizard = controller();
        assert_eq!(
            wizard.edit_topic_field(TopicId::new(1), TopicField::RelativeWeight, "3"),
            Err(WizardError::FieldLocked {
                step: WizardStep::SelectTopics
            })
        );
        assert_eq!(
            wizard.edit_fraction("10"),
            Err(WizardError::FieldLocked {
                step: WizardStep::SelectTopics
            })
        );
    }

    #[test]
    fn topics_are_locked_after_first_step() {
        let mut wizard = controller();
        wizard.next().unwrap();
        assert_eq!(wizard.set_topics(Vec::new()), Err(WizardError::TopicsLocked));
        assert_eq!(wizard.state().topics().len(), 2);
    }

    #[test]
    fn back_then_forward_preserves_values() {
        let mut wizard = controller();
        wizard.next().unwrap();
        wizard
            .edit_topic_field(TopicId::new(1), TopicField::QuestionCount, "7")
            .unwrap();
        wizard.next().unwrap();
        wizard
            .edit_topic_field(TopicId::new(2), TopicField::RelativeWeight, "3")
            .unwrap();
        let before = wizard.state().clone();

        wizard.back().unwrap();
        wizard.back().unwrap();
        wizard.next().unwrap();
        wizard.next().unwrap();
        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn entering_summary_freezes_and_back_discards() {
        let mut wizard = controller();
        to_summary(&mut wizard);
        assert!(wizard.frozen().is_some());
        assert!(wizard.summary().is_frozen);

        wizard.back().unwrap();
        assert!(wizard.frozen().is_none());
    }

    #[test]
    fn cleared_exam_count_becomes_one_on_summary() {
        let mut wizard = controller();
        wizard.next().unwrap();
        wizard.next().unwrap();
        wizard.next().unwrap();
        wizard.edit_number_exams("").unwrap();
        wizard.edit_fraction("abc").unwrap();
        wizard.next().unwrap();

        let summary = wizard.summary();
        assert_eq!(summary.exam_count, 1);
        assert_eq!(summary.fraction_percent, 0);
    }

    #[test]
    fn late_bounds_clamp_live_and_frozen_values() {
        let mut wizard = WizardController::new(UnitId::new(1));
        wizard
            .set_topics(topics().iter().map(TopicSelection::from).collect())
            .unwrap();
        wizard.next().unwrap();
        wizard
            .edit_topic_field(TopicId::new(2), TopicField::QuestionCount, "40")
            .unwrap();
        assert!(!wizard.is_validated(TopicId::new(2)));
        to_summary(&mut wizard);

        let clamped = wizard.apply_bounds(&topics());
        assert_eq!(clamped, vec![TopicId::new(2)]);
        assert_eq!(
            wizard.frozen().and_then(|f| f.number_questions(TopicId::new(2))),
            Some(FieldValue::Value(5))
        );
    }

    #[test]
    fn submit_requires_summary() {
        let mut wizard = controller();
        assert_eq!(wizard.begin_submit(), Err(WizardError::NotOnSummary));
    }

    #[test]
    fn successful_submit_starts_new_session() {
        let mut wizard = controller();
        to_summary(&mut wizard);
        let session = wizard.session();

        let ticket = wizard.begin_submit().unwrap();
        assert!(!wizard.can_submit());
        assert_eq!(wizard.begin_submit(), Err(WizardError::SubmissionInFlight));
        assert_eq!(
            ticket.payload().topics,
            vec![
                TopicKey::Name("Arquiteturas".into()),
                TopicKey::Name("BD".into())
            ]
        );

        wizard.finish_submit(&ticket, true).unwrap();
        assert_ne!(wizard.session(), session);
        assert_eq!(wizard.step(), WizardStep::SelectTopics);
        assert!(wizard.state().topics().is_empty());
        assert!(wizard.frozen().is_none());
    }

    #[test]
    fn failed_submit_keeps_values_and_allows_retry() {
        let mut wizard = controller();
        to_summary(&mut wizard);
        let frozen = wizard.frozen().cloned();

        let ticket = wizard.begin_submit().unwrap();
        wizard.finish_submit(&ticket, false).unwrap();

        assert_eq!(wizard.step(), WizardStep::Summary);
        assert_eq!(wizard.frozen().cloned(), frozen);
        assert!(wizard.can_submit());
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut wizard = controller();
        to_summary(&mut wizard);
        let ticket = wizard.begin_submit().unwrap();
        wizard.reset();
        let session = wizard.session();

        assert_eq!(
            wizard.finish_submit(&ticket, true),
            Err(WizardError::StaleSubmission)
        );
        assert_eq!(wizard.session(), session);
    }

    #[test]
    fn seeded_edit_flow_starts_on_first_step() {
        let config: ExamConfig = serde_json::from_value(serde_json::json!({
            "id": 3,
            "subject_id": 1,
            "fraction": 20,
            "num_variations": 2,
            "topic_configs": [
                { "topic_id": 2, "topic_name": "BD", "number_questions": 9, "relative_weight": 2.4 }
            ]
        }))
        .unwrap();
        let mut wizard = WizardController::from_exam_config(&config);
        assert_eq!(wizard.step(), WizardStep::SelectTopics);
        assert!(wizard.can_go_next());

        wizard.apply_bounds(&topics());
        assert_eq!(
            wizard.state().number_questions(TopicId::new(2)),
            Some(FieldValue::Value(5))
        );
        assert_eq!(
            wizard.state().relative_quotation(TopicId::new(2)),
            Some(FieldValue::Value(2))
        );
    }
}
