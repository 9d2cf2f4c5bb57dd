#![forbid(unsafe_code)]

//! Domain model of the exam-configuration wizard: topics and their
//! question bounds, the per-session form state, and the pure rules that
//! clamp and default numeric fields.

pub mod constraints;
pub mod error;
pub mod model;
pub mod normalize;

pub use constraints::{Bound, ConstraintResolver};
pub use error::Error;
pub use normalize::FieldRule;
