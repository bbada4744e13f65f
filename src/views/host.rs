use tracing::debug;

use crate::error::AppError;
use crate::model::ViewName;

/// The single view container. Exactly one view is mounted at a time.
#[derive(Debug)]
pub struct ViewHost {
    attached: bool,
    live: Option<ViewName>,
    export_mode: bool,
}

impl ViewHost {
    pub fn new() -> Self {
        Self {
            attached: true,
            live: None,
            export_mode: false,
        }
    }

    /// A container that no longer belongs to a running shell
    pub fn detached() -> Self {
        Self {
            attached: false,
            live: None,
            export_mode: false,
        }
    }

    /// Shell teardown
    pub fn detach(&mut self) {
        self.attached = false;
        self.live = None;
    }

    /// Replace whatever is mounted with `view`
    pub fn mount(&mut self, view: ViewName) -> Result<(), AppError> {
        if !self.attached {
            return Err(AppError::PreconditionViolation(format!(
                "cannot render {view} into a detached view container"
            )));
        }
        if let Some(previous) = self.live.replace(view) {
            if previous != view {
                debug!(previous = %previous, view = %view, "Replaced mounted view");
            }
        }
        Ok(())
    }

    /// Drop the live record if it still belongs to `view`
    pub fn release(&mut self, view: ViewName) {
        if self.live == Some(view) {
            self.live = None;
        }
    }

    pub fn live(&self) -> Option<ViewName> {
        self.live
    }

    pub fn set_export_mode(&mut self, enabled: bool) {
        self.export_mode = enabled;
    }

    pub fn export_mode(&self) -> bool {
        self.export_mode
    }
}

impl Default for ViewHost {
    fn default() -> Self {
        Self::new()
    }
}
