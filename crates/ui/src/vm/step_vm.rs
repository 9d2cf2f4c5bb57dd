use exam_core::model::WizardStep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Current,
    Upcoming,
}

/// One dot of the step indicator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepDotVm {
    pub step: WizardStep,
    pub label: &'static str,
    pub status: StepStatus,
}

#[must_use]
pub fn step_label(step: WizardStep) -> &'static str {
    match step {
        WizardStep::SelectTopics => "Topics",
        WizardStep::QuestionCounts => "Questions",
        WizardStep::RelativeWeights => "Weights",
        WizardStep::FinalSettings => "Settings",
        WizardStep::Summary => "Summary",
    }
}

#[must_use]
pub fn map_step_indicator(current: WizardStep) -> Vec<StepDotVm> {
    WizardStep::ALL
        .iter()
        .map(|step| StepDotVm {
            step: *step,
            label: step_label(*step),
            status: match step.index().cmp(&current.index()) {
                std::cmp::Ordering::Less => StepStatus::Done,
                std::cmp::Ordering::Equal => StepStatus::Current,
                std::cmp::Ordering::Greater => StepStatus::Upcoming,
            },
        })
        .collect()
}

/// "Step 2 of 5".
#[must_use]
pub fn step_progress_label(current: WizardStep) -> String {
    format!("Step {} of {}", current.index() + 1, WizardStep::ALL.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_marks_done_current_upcoming() {
        let dots = map_step_indicator(WizardStep::RelativeWeights);
        let statuses: Vec<StepStatus> = dots.iter().map(|dot| dot.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Done,
                StepStatus::Done,
                StepStatus::Current,
                StepStatus::Upcoming,
                StepStatus::Upcoming,
            ]
        );
        assert_eq!(step_progress_label(WizardStep::RelativeWeights), "Step 3 of 5");
    }
}
