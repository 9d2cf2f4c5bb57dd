use std::sync::Arc;

use exam_core::model::{ExamConfigId, UnitId};
use services::{BackendError, WizardService};

use crate::wizard_view::WizardView;

pub trait UiApp: Send + Sync {
    fn current_unit_id(&self) -> UnitId;

    fn wizard_service(&self) -> Arc<WizardService>;
}

#[derive(Clone)]
pub struct AppContext {
    current_unit_id: UnitId,
    wizard: Arc<WizardService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            current_unit_id: app.current_unit_id(),
            wizard: app.wizard_service(),
        }
    }

    #[must_use]
    pub fn current_unit_id(&self) -> UnitId {
        self.current_unit_id
    }

    #[must_use]
    pub fn wizard_service(&self) -> Arc<WizardService> {
        Arc::clone(&self.wizard)
    }

    /// Open the wizard for the current unit.
    pub async fn open_wizard(&self) -> WizardView {
        WizardView::start(&self.wizard, self.current_unit_id).await
    }

    /// Open the wizard pre-filled from a stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for unknown configurations.
    pub async fn open_edit_wizard(&self, config: ExamConfigId) -> Result<WizardView, BackendError> {
        let (controller, topics) = self
            .wizard
            .start_edit(self.current_unit_id, config)
            .await?;
        Ok(WizardView::new(controller, topics))
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
