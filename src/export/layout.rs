//! Page geometry and raster placement in millimetres (origin top-left)

use crate::config::ExportSettings;
use crate::constants::export::{AVG_GLYPH_EM, LINE_SPACING, MM_PER_PT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    /// Space reserved under the top margin for the view title
    pub title_band_mm: f32,
}

impl PageGeometry {
    pub fn from_settings(settings: &ExportSettings) -> Self {
        Self {
            width_mm: settings.page_width_mm,
            height_mm: settings.page_height_mm,
            margin_mm: settings.margin_mm,
            title_band_mm: settings.title_band_mm,
        }
    }

    pub fn printable_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    /// Height left for the raster below the title band
    pub fn printable_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm - self.title_band_mm
    }

    /// Baseline of the view title, measured from the top edge
    pub fn title_baseline(&self) -> f32 {
        self.margin_mm + self.title_band_mm * 0.7
    }

    /// Baseline of the first body line under the title band
    pub fn body_baseline(&self, size_pt: f32) -> f32 {
        self.margin_mm + self.title_band_mm + size_pt * MM_PER_PT
    }
}

/// Baseline-to-baseline distance for `size_pt` text
pub fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * MM_PER_PT * LINE_SPACING
}

/// Word wrap for the builtin PDF font, which has no metrics at hand;
/// glyphs are assumed to average `AVG_GLYPH_EM` of the size
pub fn wrap_to_width(text: &str, size_pt: f32, width_mm: f32) -> Vec<String> {
    let glyph_mm = size_pt * MM_PER_PT * AVG_GLYPH_EM;
    let max_chars = ((width_mm / glyph_mm).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !word.is_empty() {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&word);
            }
        }
        lines.push(line);
    }
    lines
}

/// Where a raster lands on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl Placement {
    /// Resolution that makes `width_px` span `width_mm`
    pub fn dpi(&self, width_px: u32) -> f32 {
        width_px as f32 / (self.width_mm / crate::constants::export::MM_PER_INCH)
    }
}

/// Scale a `width_px` x `height_px` raster into the printable area.
///
/// Fills the printable width unless that makes it taller than the printable
/// height; then fits the height instead and centers horizontally.
pub fn fit_image(geometry: &PageGeometry, width_px: u32, height_px: u32) -> Option<Placement> {
    if width_px == 0 || height_px == 0 {
        return None;
    }
    let max_w = geometry.printable_width();
    let max_h = geometry.printable_height();
    if max_w <= 0.0 || max_h <= 0.0 {
        return None;
    }

    let aspect = height_px as f32 / width_px as f32;
    let top = geometry.margin_mm + geometry.title_band_mm;

    let width_fit_height = max_w * aspect;
    if width_fit_height <= max_h {
        return Some(Placement {
            x_mm: geometry.margin_mm,
            y_mm: top,
            width_mm: max_w,
            height_mm: width_fit_height,
        });
    }

    let width = max_h / aspect;
    Some(Placement {
        x_mm: geometry.margin_mm + (max_w - width) / 2.0,
        y_mm: top,
        width_mm: width,
        height_mm: max_h,
    })
}
