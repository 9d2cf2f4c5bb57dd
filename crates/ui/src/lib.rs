#![forbid(unsafe_code)]

pub mod context;
pub mod input;
pub mod table;
pub mod vm;
pub mod wizard_view;

pub use context::{AppContext, UiApp, build_app_context};
pub use table::{SelectableRow, SelectionTable};
pub use wizard_view::{SubmitState, WizardView};
