mod exam_config;
mod field;
mod ids;
mod topic;
mod wizard;

pub use exam_config::{ExamConfig, TopicConfig};
pub use field::{FieldValue, TopicField};
pub use ids::{ExamConfigId, ParseIdError, TopicId, UnitId, WizardSessionId};
pub use topic::{Topic, TopicError, TopicSelection};
pub use wizard::{ExamMetadata, WizardState, WizardStateError, WizardStep};
