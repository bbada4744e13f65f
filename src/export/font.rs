//! TrueType text painting onto RGBA canvases using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::font_discovery::resolve_sheet_font;

/// A loaded font usable at any pixel size
#[derive(Debug)]
pub struct Typeface {
    font: Font,
}

impl Typeface {
    /// Load a TrueType font from a file path
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;

        info!(path = %path.display(), "Loaded font");
        Ok(Self { font })
    }

    /// Configured font with system fallbacks
    pub fn from_system_font(preferred: &str) -> Result<Self> {
        Self::from_path(resolve_sheet_font(preferred)?)
    }

    /// Distance between consecutive baselines
    pub fn line_height(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2)
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|m| m.ascent)
            .unwrap_or(size * 0.8)
    }

    /// Advance width of `text` in pixels
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, size).advance_width)
            .sum()
    }

    /// Greedy word wrap to `max_width` pixels; words wider than a line are cut by character
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if line.is_empty() {
                    word.to_string()
                } else {
                    format!("{line} {word}")
                };
                if self.text_width(&candidate, size) <= max_width {
                    line = candidate;
                    continue;
                }
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                for ch in word.chars() {
                    line.push(ch);
                    if self.text_width(&line, size) > max_width && line.chars().count() > 1 {
                        line.pop();
                        lines.push(std::mem::take(&mut line));
                        line.push(ch);
                    }
                }
            }
            lines.push(line);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    /// Cut `text` with an ellipsis so it fits in `max_width`
    pub fn ellipsize(&self, text: &str, size: f32, max_width: f32) -> String {
        if self.text_width(text, size) <= max_width {
            return text.to_string();
        }
        let mut out = String::new();
        for ch in text.chars() {
            out.push(ch);
            if self.text_width(&format!("{out}…"), size) > max_width {
                out.pop();
                break;
            }
        }
        format!("{out}…")
    }

    /// Alpha-blend `text` onto `canvas` with its line box top at (`x`, `top`)
    pub fn draw_text(&self, canvas: &mut RgbaImage, text: &str, x: f32, top: f32, size: f32, color: Rgba<u8>) {
        let baseline = top + self.ascent(size);
        let mut pen = x;
        let fg_a = color.0[3] as f32 / 255.0;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let glyph_x = (pen + metrics.xmin as f32).round() as i64;
            let glyph_y = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx] as f32 / 255.0;
                    if coverage <= 0.0 {
                        continue;
                    }
                    let px = glyph_x + gx as i64;
                    let py = glyph_y + gy as i64;
                    if px < 0 || py < 0 || px >= canvas.width() as i64 || py >= canvas.height() as i64 {
                        continue;
                    }
                    let alpha = fg_a * coverage;
                    let dst = canvas.get_pixel_mut(px as u32, py as u32);
                    for c in 0..3 {
                        dst.0[c] = (color.0[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha)) as u8;
                    }
                    dst.0[3] = 255;
                }
            }
            pen += metrics.advance_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_face() -> Option<Typeface> {
        Typeface::from_system_font("DejaVu Sans").ok()
    }

    #[test]
    fn test_wrap_respects_width() {
        // Skipped on machines without any font installed
        let Some(face) = system_face() else { return };
        let lines = face.wrap("uno dos tres cuatro cinco seis siete ocho", 20.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(face.text_width(line, 20.0) <= 120.0 || line.split_whitespace().count() == 1);
        }
    }

    #[test]
    fn test_draw_text_marks_pixels() {
        let Some(face) = system_face() else { return };
        let mut canvas = RgbaImage::from_pixel(200, 60, Rgba([255, 255, 255, 255]));
        face.draw_text(&mut canvas, "A-99", 4.0, 4.0, 32.0, Rgba([0, 0, 0, 255]));
        assert!(canvas.pixels().any(|p| p.0[0] < 128));
    }

    #[test]
    fn test_ellipsize_shortens() {
        let Some(face) = system_face() else { return };
        let text = "Composición 100% algodón peinado";
        let cut = face.ellipsize(text, 18.0, 80.0);
        assert!(cut.ends_with('…'));
        assert!(cut.chars().count() < text.chars().count());
    }
}
