//! The four sheet sections and the machinery that mounts and switches them

mod costs;
mod cutting;
pub mod fields;
mod general;
mod host;
pub mod images;
pub mod layout;
mod registry;
mod samples;
mod switcher;

pub use host::ViewHost;
pub use images::ImageCache;
pub use layout::{Block, SheetLayout};
pub use switcher::{ViewChanged, ViewSwitcher};

use eframe::egui;

use crate::error::Result;
use crate::model::{ViewData, ViewName};

/// Contract every section implements
///
/// A view's form state is only authoritative while it is mounted; outside of
/// that window the switcher keeps its data in the `ViewStore`.
pub trait View {
    fn name(&self) -> ViewName;

    fn is_mounted(&self) -> bool;

    /// Reset to defaults and mount into `host`, replacing whatever was there
    fn render(&mut self, host: &mut ViewHost) -> Result<()>;

    /// Snapshot of the current form state
    fn serialize(&self) -> ViewData;

    /// Apply a stored bag; absent fields keep their rendered defaults
    fn deserialize(&mut self, data: &ViewData);

    /// Unmount; calling it twice is harmless
    fn teardown(&mut self, host: &mut ViewHost);

    /// Draw the editor widgets; returns true if the user changed something
    fn ui(&mut self, ui: &mut egui::Ui, images: &mut ImageCache) -> bool;

    /// What the view container shows, with chrome hidden in export mode
    fn layout(&self, export_mode: bool) -> SheetLayout;

    /// Pictures that must be decoded before a capture
    fn image_sources(&self) -> Vec<String> {
        self.layout(true).image_sources()
    }

    /// Called by the export pipeline right before rasterizing
    fn before_capture(&mut self) {}

    /// Called by the export pipeline after rasterizing, even on failure
    fn after_capture(&mut self) {}
}
