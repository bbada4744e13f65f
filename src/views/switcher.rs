//! Navigation between the four views
//!
//! The switcher is the only place that moves data between a mounted view and
//! the `ViewStore`. Outgoing views are serialized and torn down, incoming views
//! are rendered fresh and fed their stored bag.

use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, error, info, warn};

use super::host::ViewHost;
use super::layout::SheetLayout;
use super::registry::ViewRegistry;
use super::View;
use crate::constants::storage::ACTIVE_VIEW_KEY;
use crate::error::{AppError, Result};
use crate::model::{ViewDataMap, ViewName};
use crate::persistence::{LocalStorage, ViewStore};

/// Sent to every subscriber after a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewChanged {
    pub from: Option<ViewName>,
    pub to: ViewName,
}

pub struct ViewSwitcher {
    registry: ViewRegistry,
    store: ViewStore,
    host: ViewHost,
    active: Option<ViewName>,
    listeners: Vec<Sender<ViewChanged>>,
}

impl ViewSwitcher {
    pub fn new(store: ViewStore) -> Self {
        Self::with_host(store, ViewHost::new())
    }

    pub fn with_host(store: ViewStore, host: ViewHost) -> Self {
        Self {
            registry: ViewRegistry::new(),
            store,
            host,
            active: None,
            listeners: Vec::new(),
        }
    }

    /// Last persisted active view, `vista1` when absent or unreadable
    pub fn restore_active_view(storage: &LocalStorage) -> ViewName {
        match storage.get_item(ACTIVE_VIEW_KEY) {
            Ok(Some(id)) => id.trim().parse().unwrap_or_else(|e| {
                warn!(id = %id.trim(), error = %e, "Ignoring stored active view");
                ViewName::default()
            }),
            Ok(None) => ViewName::default(),
            Err(e) => {
                warn!(error = ?e, "Failed to read stored active view");
                ViewName::default()
            }
        }
    }

    pub fn current_view(&self) -> Option<ViewName> {
        self.active
    }

    /// Switch to `view`, carrying the outgoing view's data into the store
    pub fn navigate_to(&mut self, view: ViewName) -> Result<()> {
        let from = self.active;
        if from == Some(view) {
            debug!(view = %view, "Already active, re-announcing");
            self.notify(ViewChanged { from, to: view });
            return Ok(());
        }

        if let Some(current) = from {
            self.flush_active();
            if let Some(outgoing) = self.registry.get_mut(current) {
                outgoing.teardown(&mut self.host);
            }
            self.active = None;
        }

        let incoming = self.registry.get_or_create(view);
        if let Err(e) = incoming.render(&mut self.host) {
            error!(view = %view, error = %e, "Failed to render view");
            return Err(e);
        }
        incoming.deserialize(&self.store.get(view));

        self.active = Some(view);
        if let Err(e) = self.store.storage().set_item(ACTIVE_VIEW_KEY, view.id()) {
            warn!(view = %view, error = ?e, "Failed to persist active view");
        }
        info!(from = ?from, to = %view, "Switched view");

        self.notify(ViewChanged { from, to: view });
        Ok(())
    }

    /// Same as `navigate_to` for identifiers coming from outside
    pub fn navigate_to_id(&mut self, id: &str) -> Result<()> {
        let view: ViewName = id.parse().map_err(|e: AppError| {
            warn!(id, error = %e, "Rejected navigation");
            e
        })?;
        self.navigate_to(view)
    }

    /// Copy the live view's form state into the store
    pub fn flush_active(&mut self) {
        let Some(current) = self.active else {
            return;
        };
        if let Some(view) = self.registry.get(current) {
            let data = view.serialize();
            self.store.set(current, data);
        }
    }

    /// Flush and unmount the live view, leaving nothing active
    pub fn close_active(&mut self) {
        let Some(current) = self.active else {
            return;
        };
        self.flush_active();
        if let Some(view) = self.registry.get_mut(current) {
            view.teardown(&mut self.host);
        }
        self.active = None;
        debug!(view = %current, "Closed active view");
    }

    /// Layout of the mounted view as the container currently shows it
    pub fn snapshot(&self) -> Option<SheetLayout> {
        let current = self.active?;
        self.registry
            .get(current)
            .map(|view| view.layout(self.host.export_mode()))
    }

    /// Enter or leave capture mode on the live view and the container
    pub fn set_capture_mode(&mut self, enabled: bool) {
        if let Some(view) = self.active.and_then(|current| self.registry.get_mut(current)) {
            if enabled {
                view.before_capture();
            } else {
                view.after_capture();
            }
        }
        self.host.set_export_mode(enabled);
    }

    /// Every bag, including unsaved edits in the live view
    pub fn all_data(&mut self) -> ViewDataMap {
        self.flush_active();
        self.store.get_all().clone()
    }

    /// Replace every bag and redraw the live view from the new data
    pub fn replace_all(&mut self, views: ViewDataMap) -> Result<()> {
        self.store.set_all(views);
        self.reload_active()
    }

    /// Empty every bag and redraw the live view with defaults
    pub fn clear_all(&mut self) -> Result<()> {
        self.store.clear();
        self.reload_active()
    }

    fn reload_active(&mut self) -> Result<()> {
        let Some(current) = self.active else {
            return Ok(());
        };
        let view = self.registry.get_or_create(current);
        view.render(&mut self.host)?;
        view.deserialize(&self.store.get(current));
        Ok(())
    }

    pub fn subscribe(&mut self) -> Receiver<ViewChanged> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    fn notify(&mut self, event: ViewChanged) {
        // Dropped receivers are pruned here
        self.listeners.retain(|tx| tx.send(event).is_ok());
    }

    pub fn live_view_mut(&mut self) -> Option<&mut dyn View> {
        let current = self.active?;
        self.registry.get_mut(current)
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    #[cfg(test)]
    pub fn host(&self) -> &ViewHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut ViewHost {
        &mut self.host
    }
}
