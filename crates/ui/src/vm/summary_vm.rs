use services::summary::{SummaryRow, SummaryView};

/// One topic card of the summary step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryTopicVm {
    pub name: String,
    pub questions_label: String,
    pub weight_label: String,
}

impl From<&SummaryRow> for SummaryTopicVm {
    fn from(row: &SummaryRow) -> Self {
        Self {
            name: row.name.clone(),
            questions_label: format_question_count(row.question_count),
            weight_label: format!("Relative weight: {}", row.relative_weight),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryVm {
    pub topics: Vec<SummaryTopicVm>,
    pub total_label: String,
    pub exams_label: String,
    pub fraction_label: String,
    pub title: Option<String>,
    pub date_str: Option<String>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

impl From<&SummaryView> for SummaryVm {
    fn from(view: &SummaryView) -> Self {
        let title = view.metadata.title.trim();
        Self {
            topics: view.rows.iter().map(SummaryTopicVm::from).collect(),
            total_label: format_question_count(view.total_questions),
            exams_label: format_exam_count(view.exam_count),
            fraction_label: format!("{}%", view.fraction_percent),
            title: (!title.is_empty()).then(|| title.to_owned()),
            date_str: view.metadata.date.map(|date| date.format("%Y-%m-%d").to_string()),
            semester: view.metadata.semester.clone(),
            academic_year: view.metadata.academic_year.clone(),
        }
    }
}

#[must_use]
pub fn format_question_count(count: u32) -> String {
    if count == 1 {
        "1 question".to_owned()
    } else {
        format!("{count} questions")
    }
}

#[must_use]
pub fn format_exam_count(count: u32) -> String {
    if count == 1 {
        "1 exam".to_owned()
    } else {
        format!("{count} exams")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use exam_core::model::{ExamMetadata, TopicId};

    fn view() -> SummaryView {
        SummaryView {
            rows: vec![
                SummaryRow {
                    topic_id: TopicId::new(1),
                    name: "Arquiteturas".into(),
                    question_count: 5,
                    relative_weight: 3,
                },
                SummaryRow {
                    topic_id: TopicId::new(2),
                    name: "BD".into(),
                    question_count: 1,
                    relative_weight: 1,
                },
            ],
            total_questions: 6,
            exam_count: 2,
            fraction_percent: 25,
            metadata: ExamMetadata {
                title: "Exame Normal".into(),
                date: NaiveDate::from_ymd_opt(2024, 7, 15),
                semester: None,
                academic_year: None,
            },
            is_frozen: true,
        }
    }

    #[test]
    fn labels_pluralize_counts() {
        let vm = SummaryVm::from(&view());
        assert_eq!(vm.topics[0].questions_label, "5 questions");
        assert_eq!(vm.topics[1].questions_label, "1 question");
        assert_eq!(vm.topics[0].weight_label, "Relative weight: 3");
        assert_eq!(vm.total_label, "6 questions");
        assert_eq!(vm.exams_label, "2 exams");
        assert_eq!(vm.fraction_label, "25%");
    }

    #[test]
    fn metadata_is_formatted() {
        let vm = SummaryVm::from(&view());
        assert_eq!(vm.title.as_deref(), Some("Exame Normal"));
        assert_eq!(vm.date_str.as_deref(), Some("2024-07-15"));
        assert_eq!(vm.semester, None);
    }
}
