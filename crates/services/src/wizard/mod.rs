pub mod controller;
pub mod workflow;

pub use controller::{SubmitTicket, WizardController};
pub use workflow::WizardService;
