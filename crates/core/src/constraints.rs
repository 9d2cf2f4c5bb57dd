//! Upper bounds for per-topic question counts.

use std::collections::HashMap;

use crate::model::{Topic, TopicId};
use crate::normalize::FieldRule;

/// Upper bound on how many questions may be drawn from a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Metadata for the topic has not arrived (or failed to load).
    Unbounded,
    AtMost(u32),
}

impl Bound {
    /// The bound as an optional ceiling, where `None` means unbounded.
    #[must_use]
    pub fn ceiling(self) -> Option<u32> {
        match self {
            Bound::Unbounded => None,
            Bound::AtMost(max) => Some(max),
        }
    }
}

/// Maps topic ids to the number of questions their banks hold.
///
/// Topics without metadata resolve to [`Bound::Unbounded`] and their fields
/// are reported as not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintResolver {
    bounds: HashMap<TopicId, u32>,
}

impl ConstraintResolver {
    /// A resolver that knows no bounds yet.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_topics(topics: &[Topic]) -> Self {
        let mut resolver = Self::default();
        resolver.merge(topics);
        resolver
    }

    /// Record (or refresh) the bounds of the given topics.
    ///
    /// Returns the ids whose bound changed.
    pub fn merge(&mut self, topics: &[Topic]) -> Vec<TopicId> {
        let mut changed = Vec::new();
        for topic in topics {
            let previous = self.bounds.insert(topic.id(), topic.max_questions());
            if previous != Some(topic.max_questions()) {
                changed.push(topic.id());
            }
        }
        changed
    }

    #[must_use]
    pub fn max_questions(&self, id: TopicId) -> Bound {
        self.bounds
            .get(&id)
            .map_or(Bound::Unbounded, |max| Bound::AtMost(*max))
    }

    /// Whether metadata for the topic has arrived.
    #[must_use]
    pub fn is_validated(&self, id: TopicId) -> bool {
        self.bounds.contains_key(&id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Input rule for the question-count field of a topic.
    #[must_use]
    pub fn question_rule(&self, id: TopicId) -> FieldRule {
        FieldRule::question_count(self.max_questions(id))
    }
}
