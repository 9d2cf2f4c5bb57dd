use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::TopicId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic name cannot be empty")]
    EmptyName,
}

/// A topic of a curricular unit together with the number of questions
/// its question bank currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopic")]
pub struct Topic {
    id: TopicId,
    name: String,
    max_questions: u32,
}

#[derive(Deserialize)]
struct RawTopic {
    id: TopicId,
    name: String,
    max_questions: u32,
}

impl TryFrom<RawTopic> for Topic {
    type Error = TopicError;

    fn try_from(raw: RawTopic) -> Result<Self, Self::Error> {
        Topic::new(raw.id, raw.name, raw.max_questions)
    }
}

impl Topic {
    /// Creates a topic.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::EmptyName` if the name is blank.
    pub fn new(
        id: TopicId,
        name: impl Into<String>,
        max_questions: u32,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TopicError::EmptyName);
        }

        Ok(Self {
            id,
            name: trimmed.to_owned(),
            max_questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> TopicId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Questions available for this topic. May be zero for an empty bank.
    #[must_use]
    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    #[must_use]
    pub fn selection(&self) -> TopicSelection {
        TopicSelection::new(self.id, self.name.clone())
    }
}

/// A selected topic as reported by the selection table: identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicSelection {
    pub id: TopicId,
    pub name: String,
}

impl TopicSelection {
    #[must_use]
    pub fn new(id: TopicId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&Topic> for TopicSelection {
    fn from(topic: &Topic) -> Self {
        topic.selection()
    }
}
