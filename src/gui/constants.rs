//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Editor window dimensions
pub const WINDOW_WIDTH: f32 = 1100.0;
pub const WINDOW_HEIGHT: f32 = 850.0;
pub const WINDOW_MIN_WIDTH: f32 = 720.0;
pub const WINDOW_MIN_HEIGHT: f32 = 560.0;

/// Layout spacing
pub const PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;
pub const SIDEBAR_WIDTH: f32 = 210.0;
pub const DIALOG_WIDTH: f32 = 460.0;

/// Picture previews
pub const PHOTO_MAX_HEIGHT: f32 = 220.0;
pub const THUMBNAIL_MAX_HEIGHT: f32 = 90.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 160, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_INFO: egui::Color32 = egui::Color32::from_rgb(90, 120, 200);

/// Quiet period after an edit before the live view is copied to the store
pub const DIRTY_FLUSH_DELAY_MS: u64 = 1_500;

/// Idle repaint so timers fire without input
pub const REPAINT_INTERVAL_MS: u64 = 1_000;
