//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Durable storage layout
pub mod storage {
    /// Directory name under the platform data/config directories
    pub const APP_DIR: &str = "ficha-tecnica";

    /// Slot holding the full view data map
    pub const VIEWS_KEY: &str = "ficha_vistas";

    /// Slot holding the last active view identifier
    pub const ACTIVE_VIEW_KEY: &str = "ficha_vista_activa";

    /// Extension used for storage slot files
    pub const SLOT_EXTENSION: &str = "json";

    /// Default period of the background flush of the view data map
    pub const AUTOSAVE_INTERVAL_SECS: u64 = 30;
}

/// Configuration file location
pub mod config {
    /// Config file name inside `storage::APP_DIR`
    pub const FILENAME: &str = "config.json";
}

/// Saved document format
pub mod document {
    /// Version written into saved documents
    pub const FORMAT_VERSION: &str = "1.0";

    /// Prefix of saved document and exported PDF file names
    pub const FILE_STEM: &str = "ficha_tecnica";
}

/// Export page geometry and timing defaults
pub mod export {
    /// Default document title printed on the title page
    pub const DOCUMENT_TITLE: &str = "Ficha Técnica de Producción";

    /// A4 portrait
    pub const PAGE_WIDTH_MM: f32 = 210.0;
    pub const PAGE_HEIGHT_MM: f32 = 297.0;

    /// Fixed margin on every side of the printable area
    pub const MARGIN_MM: f32 = 10.0;

    /// Vertical band reserved for the view title above the raster
    pub const TITLE_BAND_MM: f32 = 12.0;

    /// Font sizes in points
    pub const TITLE_FONT_SIZE: f32 = 22.0;
    pub const VIEW_TITLE_FONT_SIZE: f32 = 14.0;
    pub const NORMAL_FONT_SIZE: f32 = 10.0;

    /// Per-image decode budget before the image is treated as loaded
    pub const IMAGE_TIMEOUT_MS: u64 = 5_000;

    /// Pause after toggling export mode so layout can settle
    pub const SETTLE_DELAY_MS: u64 = 150;

    /// Raster canvas width in pixels (roughly A4 width at 150 dpi)
    pub const RASTER_WIDTH_PX: u32 = 1240;

    /// Font family resolved through fontconfig for the rasterizer
    pub const FONT_NAME: &str = "DejaVu Sans";

    /// Millimetres per inch, for dpi conversion
    pub const MM_PER_INCH: f32 = 25.4;

    /// Millimetres per typographic point
    pub const MM_PER_PT: f32 = MM_PER_INCH / 72.0;

    /// Baseline-to-baseline distance as a multiple of the font size
    pub const LINE_SPACING: f32 = 1.2;

    /// Average Helvetica glyph advance as a share of the font size
    pub const AVG_GLYPH_EM: f32 = 0.5;
}

/// Validation ranges used when clamping configuration values
pub mod validation {
    pub const MIN_MARGIN_MM: f32 = 0.0;
    pub const MAX_MARGIN_MM: f32 = 50.0;

    pub const MIN_PAGE_MM: f32 = 50.0;
    pub const MAX_PAGE_MM: f32 = 1200.0;

    pub const MAX_IMAGE_TIMEOUT_MS: u64 = 60_000;
    pub const MAX_SETTLE_DELAY_MS: u64 = 5_000;

    pub const MIN_RASTER_WIDTH_PX: u32 = 320;
    pub const MAX_RASTER_WIDTH_PX: u32 = 4096;

    pub const MIN_AUTOSAVE_SECS: u64 = 5;
    pub const MAX_AUTOSAVE_SECS: u64 = 3_600;

    pub const MIN_WINDOW_DIMENSION: f32 = 480.0;
    pub const MAX_WINDOW_DIMENSION: f32 = 8_192.0;
}
