use std::collections::HashMap;
use tracing::info;

use super::costs::CostsView;
use super::cutting::CuttingView;
use super::general::GeneralView;
use super::samples::SamplesView;
use super::View;
use crate::model::ViewName;

/// Owns view instances, creating each one on first use
#[derive(Default)]
pub struct ViewRegistry {
    instances: HashMap<ViewName, Box<dyn View>>,
    created: usize,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(view: ViewName) -> Box<dyn View> {
        match view {
            ViewName::Vista1 => Box::new(GeneralView::new()),
            ViewName::Vista2 => Box::new(CostsView::new()),
            ViewName::Vista3 => Box::new(CuttingView::new()),
            ViewName::Vista4 => Box::new(SamplesView::new()),
        }
    }

    /// Existing instance for `view`, or a new one
    pub fn get_or_create(&mut self, view: ViewName) -> &mut dyn View {
        let created = &mut self.created;
        self.instances
            .entry(view)
            .or_insert_with(|| {
                *created += 1;
                info!(view = %view, "Created view instance");
                Self::create(view)
            })
            .as_mut()
    }

    pub fn get_mut(&mut self, view: ViewName) -> Option<&mut dyn View> {
        match self.instances.get_mut(&view) {
            Some(instance) => Some(instance.as_mut()),
            None => None,
        }
    }

    pub fn get(&self, view: ViewName) -> Option<&dyn View> {
        self.instances.get(&view).map(|instance| instance.as_ref())
    }

    /// Number of instances constructed so far
    #[cfg(test)]
    pub fn created_count(&self) -> usize {
        self.created
    }
}
