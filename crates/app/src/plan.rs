//! Headless wizard runs driven by a JSON plan file.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use exam_core::model::{ExamMetadata, TopicField, TopicId};
use services::{ExamArtifact, SubmissionError, WizardError};
use ui::WizardView;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("cannot read plan file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid plan file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("plan selects no topics")]
    NoTopics,
    #[error("unknown topic `{0}`")]
    UnknownTopic(String),
    #[error("topic `{0}` has values but is not selected")]
    NotSelected(String),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Value as typed into an input box. Numbers are accepted for convenience.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawInput {
    Number(i64),
    Text(String),
}

impl RawInput {
    fn as_typed(&self) -> String {
        match self {
            RawInput::Number(value) => value.to_string(),
            RawInput::Text(text) => text.clone(),
        }
    }
}

/// What to type into the wizard, step by step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationPlan {
    pub topics: Vec<String>,
    #[serde(default)]
    pub number_questions: BTreeMap<String, RawInput>,
    #[serde(default)]
    pub relative_quotations: BTreeMap<String, RawInput>,
    #[serde(default)]
    pub number_exams: Option<RawInput>,
    #[serde(default)]
    pub fraction: Option<RawInput>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

impl GenerationPlan {
    /// # Errors
    ///
    /// Returns `PlanError` if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn metadata(&self) -> ExamMetadata {
        ExamMetadata {
            title: self.title.clone(),
            date: self.date,
            semester: self.semester.clone(),
            academic_year: self.academic_year.clone(),
        }
    }
}

fn topic_id(view: &WizardView, name: &str) -> Result<TopicId, PlanError> {
    let wanted = name.trim().to_lowercase();
    view.table()
        .rows()
        .iter()
        .find(|topic| topic.name().to_lowercase() == wanted)
        .map(|topic| topic.id())
        .ok_or_else(|| PlanError::UnknownTopic(name.to_owned()))
}

fn type_values(
    view: &mut WizardView,
    values: &BTreeMap<String, RawInput>,
    field: TopicField,
) -> Result<(), PlanError> {
    for (name, raw) in values {
        let id = topic_id(view, name)?;
        if !view.controller().state().is_selected(id) {
            return Err(PlanError::NotSelected(name.clone()));
        }
        view.input_topic_field(id, field, &raw.as_typed())?;
        view.blur_topic_field(id, field)?;
    }
    Ok(())
}

/// Walk the wizard up to the summary step, typing what the plan says.
///
/// # Errors
///
/// Returns `PlanError` for topics the unit does not have or rejected steps.
pub fn fill_wizard(view: &mut WizardView, plan: &GenerationPlan) -> Result<(), PlanError> {
    if plan.topics.is_empty() {
        return Err(PlanError::NoTopics);
    }
    for name in &plan.topics {
        let id = topic_id(view, name)?;
        if !view.table().is_selected(id) {
            view.toggle_topic(id)?;
        }
    }

    view.next()?;
    type_values(view, &plan.number_questions, TopicField::QuestionCount)?;
    view.next()?;
    type_values(view, &plan.relative_quotations, TopicField::RelativeWeight)?;
    view.next()?;

    if let Some(raw) = &plan.number_exams {
        view.input_number_exams(&raw.as_typed())?;
        view.blur_number_exams()?;
    }
    if let Some(raw) = &plan.fraction {
        view.input_fraction(&raw.as_typed())?;
        view.blur_fraction()?;
    }
    view.set_metadata(plan.metadata())?;

    view.next()?;
    Ok(())
}

/// Print the summary the user would confirm.
pub fn print_summary(view: &WizardView) {
    let summary = view.summary_vm();
    if let Some(title) = &summary.title {
        println!("{title}");
    }
    for topic in &summary.topics {
        println!(
            "  {:<32} {:>14}  {}",
            topic.name, topic.questions_label, topic.weight_label
        );
    }
    println!("Total: {}", summary.total_label);
    println!("Exams: {}", summary.exams_label);
    println!("Fraction: {}", summary.fraction_label);
}

/// Write the artifact to `out`, or to its own file name in the working directory.
///
/// # Errors
///
/// Returns `PlanError::Io` if the file cannot be written.
pub fn save_artifact(artifact: &ExamArtifact, out: Option<&Path>) -> Result<String, PlanError> {
    let target = out.map_or_else(
        || std::path::PathBuf::from(&artifact.file_name),
        Path::to_path_buf,
    );
    std::fs::write(&target, &artifact.bytes)?;
    let shown = target.display().to_string();
    info!(file = %shown, bytes = artifact.bytes.len(), "artifact saved");
    Ok(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{FieldValue, Topic, UnitId, WizardStep};
    use services::{TopicKey, WizardService};

    fn plan() -> GenerationPlan {
        serde_json::from_str(
            r#"{
                "topics": ["Arquiteturas", "bd"],
                "number_questions": { "Arquiteturas": "5", "BD": 20 },
                "relative_quotations": { "BD": "2" },
                "number_exams": "3",
                "fraction": "abc",
                "title": "Exame Normal",
                "date": "2024-07-15"
            }"#,
        )
        .unwrap()
    }

    async fn view() -> (WizardView, WizardService) {
        let (service, backend) = WizardService::in_memory();
        backend
            .put_topics(
                UnitId::new(1),
                vec![
                    Topic::new(TopicId::new(1), "Arquiteturas", 10).unwrap(),
                    Topic::new(TopicId::new(2), "BD", 5).unwrap(),
                ],
            )
            .unwrap();
        (WizardView::start(&service, UnitId::new(1)).await, service)
    }

    #[tokio::test]
    async fn plan_drives_wizard_to_summary() {
        let (mut view, service) = view().await;
        fill_wizard(&mut view, &plan()).unwrap();

        assert_eq!(view.step(), WizardStep::Summary);
        let frozen = view.controller().frozen().unwrap();
        assert_eq!(frozen.number_questions(TopicId::new(2)), Some(FieldValue::Value(5)));
        assert_eq!(frozen.number_exams(), FieldValue::Value(3));
        assert_eq!(frozen.fraction(), FieldValue::Value(0));

        let payload = view.controller().payload();
        assert_eq!(payload.title.as_deref(), Some("Exame Normal"));
        assert_eq!(
            payload.relative_quotations.get(&TopicKey::Name("BD".into())),
            Some(&2)
        );

        let ticket = view.begin_submit().unwrap();
        let outcome = service.submit_ticket(&ticket).await;
        view.finish_submit(&ticket, outcome).unwrap();
        assert_eq!(view.step(), WizardStep::SelectTopics);
    }

    #[tokio::test]
    async fn unknown_topic_is_reported() {
        let (mut view, _) = view().await;
        let mut plan = plan();
        plan.topics.push("Compiladores".into());
        let err = fill_wizard(&mut view, &plan).unwrap_err();
        assert!(matches!(err, PlanError::UnknownTopic(name) if name == "Compiladores"));
    }

    #[tokio::test]
    async fn values_for_unselected_topics_are_rejected() {
        let (mut view, _) = view().await;
        let mut plan = plan();
        plan.topics = vec!["Arquiteturas".into()];
        let err = fill_wizard(&mut view, &plan).unwrap_err();
        assert!(matches!(err, PlanError::NotSelected(_)));
    }

    #[tokio::test]
    async fn empty_plan_is_rejected() {
        let (mut view, _) = view().await;
        let plan: GenerationPlan = serde_json::from_str(r#"{ "topics": [] }"#).unwrap();
        assert!(plan.metadata().is_empty());
        assert!(matches!(fill_wizard(&mut view, &plan), Err(PlanError::NoTopics)));
    }
}
