use tracing::debug;

use exam_core::model::{
    ExamMetadata, FieldValue, Topic, TopicField, TopicId, TopicSelection, UnitId, WizardStep,
};
use services::{
    BackendError, ExamArtifact, SubmissionError, SubmitTicket, WizardController, WizardError,
    WizardService,
};

use crate::input::{Key, Modifiers, accepts_numeric_key};
use crate::table::{ResetToken, SelectionChange, SelectionTable, TopicColumn};
use crate::vm::{SummaryVm, TopicTableVm, map_topic_table};

/// What the submit button shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitState {
    Hidden,
    Ready,
    Submitting,
}

/// The wizard screen: topic table plus step controller.
///
/// Table selection changes flow into the controller; the controller's
/// selection flows back into the table only through reset tokens, after a
/// submission or an explicit reset.
///
/// Nothing here awaits while holding the view: fetches and submissions run
/// detached and hand their result back through [`Self::apply_bounds`] and
/// [`Self::finish_submit`].
pub struct WizardView {
    controller: WizardController,
    table: SelectionTable<Topic>,
    reset_token: ResetToken,
}

impl WizardView {
    #[must_use]
    pub fn new(controller: WizardController, topics: Vec<Topic>) -> Self {
        let reset_token = ResetToken::default();
        let mut table = SelectionTable::new(topics);
        table.apply_reset(reset_token, selected_ids(&controller));
        Self {
            controller,
            table,
            reset_token,
        }
    }

    /// Start a fresh wizard for a unit.
    pub async fn start(service: &WizardService, unit: UnitId) -> Self {
        let (controller, topics) = service.start(unit).await;
        Self::new(controller, topics)
    }

    #[must_use]
    pub fn controller(&self) -> &WizardController {
        &self.controller
    }

    #[must_use]
    pub fn table(&self) -> &SelectionTable<Topic> {
        &self.table
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.controller.step()
    }

    #[must_use]
    pub fn table_vm(&self) -> TopicTableVm {
        map_topic_table(&self.table)
    }

    #[must_use]
    pub fn summary_vm(&self) -> SummaryVm {
        SummaryVm::from(&self.controller.summary())
    }

    #[must_use]
    pub fn submit_state(&self) -> SubmitState {
        if self.controller.is_submitting() {
            SubmitState::Submitting
        } else if self.controller.can_submit() {
            SubmitState::Ready
        } else {
            SubmitState::Hidden
        }
    }

    //
    // ─── TABLE ─────────────────────────────────────────────────────────────────
    //

    fn forward(&mut self, change: Option<SelectionChange<Topic>>) -> Result<(), WizardError> {
        let Some(change) = change else {
            return Ok(());
        };
        let mut topics: Vec<TopicSelection> =
            change.rows.iter().map(TopicSelection::from).collect();
        // Selected topics the table has no row for stay selected.
        topics.extend(
            self.controller
                .state()
                .topics()
                .iter()
                .filter(|topic| change.unlisted.contains(&topic.id))
                .cloned(),
        );
        if let Err(err) = self.controller.set_topics(topics) {
            self.resync_table();
            return Err(err);
        }
        Ok(())
    }

    fn resync_table(&mut self) {
        self.reset_token = self.reset_token.next();
        self.table.apply_reset(self.reset_token, selected_ids(&self.controller));
        debug!(token = ?self.reset_token, "table selection reset");
    }

    /// # Errors
    ///
    /// Returns `WizardError::TopicsLocked` after the topic step; the table
    /// selection is restored in that case.
    pub fn toggle_topic(&mut self, id: TopicId) -> Result<(), WizardError> {
        let change = self.table.toggle_row(id);
        self.forward(change)
    }

    /// # Errors
    ///
    /// Same as [`Self::toggle_topic`].
    pub fn toggle_visible_topics(&mut self) -> Result<(), WizardError> {
        let change = self.table.toggle_visible();
        self.forward(change)
    }

    pub fn set_filter(&mut self, text: &str) {
        self.table.set_filter(text);
    }

    pub fn toggle_sort(&mut self, column: TopicColumn) {
        self.table.toggle_sort(column);
    }

    pub fn next_page(&mut self) {
        self.table.next_page();
    }

    pub fn previous_page(&mut self) {
        self.table.previous_page();
    }

    //
    // ─── FIELDS ────────────────────────────────────────────────────────────────
    //

    /// Keydown guard for numeric inputs.
    #[must_use]
    pub fn accepts_key(&self, key: &str, modifiers: Modifiers) -> bool {
        accepts_numeric_key(&Key::from_dom(key), modifiers)
    }

    /// Text to show in a per-topic input.
    #[must_use]
    pub fn topic_field_text(&self, id: TopicId, field: TopicField) -> String {
        self.controller
            .state()
            .topic_field(id, field)
            .map(FieldValue::display_text)
            .unwrap_or_default()
    }

    /// Maximum shown next to a question-count input, if known.
    #[must_use]
    pub fn question_limit(&self, id: TopicId) -> Option<u32> {
        self.controller
            .topic_rule(id, TopicField::QuestionCount)
            .max()
    }

    /// # Errors
    ///
    /// See [`WizardController::edit_topic_field`].
    pub fn input_topic_field(
        &mut self,
        id: TopicId,
        field: TopicField,
        raw: &str,
    ) -> Result<FieldValue, WizardError> {
        self.controller.edit_topic_field(id, field, raw)
    }

    /// # Errors
    ///
    /// See [`WizardController::blur_topic_field`].
    pub fn blur_topic_field(&mut self, id: TopicId, field: TopicField) -> Result<u32, WizardError> {
        self.controller.blur_topic_field(id, field)
    }

    /// # Errors
    ///
    /// See [`WizardController::edit_number_exams`].
    pub fn input_number_exams(&mut self, raw: &str) -> Result<FieldValue, WizardError> {
        self.controller.edit_number_exams(raw)
    }

    /// # Errors
    ///
    /// See [`WizardController::blur_number_exams`].
    pub fn blur_number_exams(&mut self) -> Result<u32, WizardError> {
        self.controller.blur_number_exams()
    }

    /// # Errors
    ///
    /// See [`WizardController::edit_fraction`].
    pub fn input_fraction(&mut self, raw: &str) -> Result<FieldValue, WizardError> {
        self.controller.edit_fraction(raw)
    }

    /// # Errors
    ///
    /// See [`WizardController::blur_fraction`].
    pub fn blur_fraction(&mut self) -> Result<u32, WizardError> {
        self.controller.blur_fraction()
    }

    /// # Errors
    ///
    /// See [`WizardController::set_metadata`].
    pub fn set_metadata(&mut self, metadata: ExamMetadata) -> Result<(), WizardError> {
        self.controller.set_metadata(metadata)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.controller.can_go_next()
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.controller.can_go_back()
    }

    /// # Errors
    ///
    /// See [`WizardController::next`].
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.controller.next()
    }

    /// # Errors
    ///
    /// See [`WizardController::back`].
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.controller.back()
    }

    /// Cancel: drop every value and clear the table selection.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.resync_table();
    }

    /// Apply topic metadata fetched with [`WizardService::load_topics`].
    ///
    /// Stored counts are clamped to the new bounds. The table keeps its
    /// sort, filter, page and selection. An empty list, as returned when
    /// the fetch failed, leaves the rows in place.
    pub fn apply_bounds(&mut self, topics: Vec<Topic>) -> Vec<TopicId> {
        let clamped = self.controller.apply_bounds(&topics);
        if !topics.is_empty() {
            self.table.replace_rows(topics);
        }
        clamped
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Mark a submission in flight and take its ticket.
    ///
    /// Everything but Submit stays usable until the outcome arrives; send
    /// the ticket with [`WizardService::submit_ticket`].
    ///
    /// # Errors
    ///
    /// See [`WizardController::begin_submit`].
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, WizardError> {
        self.controller.begin_submit()
    }

    /// Apply the outcome of a ticket's submission.
    ///
    /// On success the wizard starts over and the table selection is cleared;
    /// on failure every value is kept for a retry.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Wizard` for a stale ticket, whatever the
    /// outcome, and `SubmissionError::Backend` when the backend failed.
    pub fn finish_submit(
        &mut self,
        ticket: &SubmitTicket,
        outcome: Result<ExamArtifact, BackendError>,
    ) -> Result<ExamArtifact, SubmissionError> {
        self.controller.finish_submit(ticket, outcome.is_ok())?;
        if outcome.is_ok() {
            self.resync_table();
        }
        Ok(outcome?)
    }
}

fn selected_ids(controller: &WizardController) -> Vec<TopicId> {
    controller
        .state()
        .topics()
        .iter()
        .map(|topic| topic.id)
        .collect()
}
