use serde::{Deserialize, Serialize};
use std::fmt;

/// Value held by a numeric wizard field.
///
/// `Pending` marks a field the user is still typing into (emptied with
/// backspace, or holding text that is not a number yet). It only exists
/// between an edit and the next blur or step transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Value(u32),
    Pending,
}

impl FieldValue {
    #[must_use]
    pub fn value(self) -> Option<u32> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Pending => None,
        }
    }

    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, FieldValue::Pending)
    }

    /// Returns the stored integer, or `default` while pending.
    #[must_use]
    pub fn resolve(self, default: u32) -> u32 {
        self.value().unwrap_or(default)
    }

    /// Text to show inside the input box. Pending renders as an empty box.
    #[must_use]
    pub fn display_text(self) -> String {
        match self {
            FieldValue::Value(v) => v.to_string(),
            FieldValue::Pending => String::new(),
        }
    }
}

/// The two numeric fields every selected topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicField {
    QuestionCount,
    RelativeWeight,
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Value(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => write!(f, "{v}"),
            FieldValue::Pending => write!(f, "pending"),
        }
    }
}
