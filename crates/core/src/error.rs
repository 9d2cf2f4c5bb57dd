use thiserror::Error;

use crate::model::{TopicError, WizardStateError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    WizardState(#[from] WizardStateError),
}
