mod step_vm;
mod summary_vm;
mod topic_vm;

pub use step_vm::{StepDotVm, StepStatus, map_step_indicator, step_label, step_progress_label};
pub use summary_vm::{SummaryTopicVm, SummaryVm, format_exam_count, format_question_count};
pub use topic_vm::{TopicRowVm, TopicTableVm, map_topic_table};
