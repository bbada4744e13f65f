//! Turns a view's `SheetLayout` into a bitmap

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::font::Typeface;
use crate::config::ExportSettings;
use crate::error::AppError;
use crate::views::{Block, SheetLayout};

/// Decoded pictures keyed by their data URI; a source missing here is drawn
/// as a placeholder
pub type Pictures = HashMap<String, Arc<RgbaImage>>;

#[allow(async_fn_in_trait)]
pub trait Rasterizer {
    /// Fails with `ResourceUnavailable` when nothing can be rasterized at all
    fn check_available(&self) -> Result<(), AppError>;

    async fn rasterize(&self, layout: SheetLayout, pictures: Pictures) -> Result<RgbaImage>;
}

const PADDING: f32 = 32.0;
const GAP: f32 = 14.0;
const TITLE_SIZE: f32 = 36.0;
const HEADING_SIZE: f32 = 26.0;
const TEXT_SIZE: f32 = 20.0;
const LABEL_SIZE: f32 = 17.0;
const CELL_SIZE: f32 = 17.0;
const CELL_PADDING: f32 = 6.0;
const IMAGE_MAX_HEIGHT: f32 = 640.0;
const PLACEHOLDER_HEIGHT: f32 = 160.0;
/// Share of the content width given to field labels
const LABEL_COLUMN: f32 = 0.32;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0x1E, 0x1E, 0x1E, 255]);
const MUTED: Rgba<u8> = Rgba([0x6B, 0x6B, 0x6B, 255]);
const ACCENT: Rgba<u8> = Rgba([0x1F, 0x3A, 0x93, 255]);
const RULE: Rgba<u8> = Rgba([0xB4, 0xB4, 0xB4, 255]);
const HEADER_FILL: Rgba<u8> = Rgba([0xE8, 0xEC, 0xF4, 255]);
const CONTROL_FILL: Rgba<u8> = Rgba([0xDD, 0xDD, 0xDD, 255]);

/// Paints layouts with fontdue glyphs onto white canvases
pub struct SheetRasterizer {
    face: Option<Arc<Typeface>>,
    width_px: u32,
}

impl SheetRasterizer {
    /// Resolve the configured font; a missing font leaves the rasterizer unavailable
    pub fn load(settings: &ExportSettings) -> Self {
        let face = match Typeface::from_system_font(&settings.font_name) {
            Ok(face) => Some(Arc::new(face)),
            Err(e) => {
                warn!(error = %e, "No font available, export is disabled");
                None
            }
        };
        Self {
            face,
            width_px: settings.raster_width_px,
        }
    }

    #[cfg(test)]
    pub fn with_typeface(face: Typeface, width_px: u32) -> Self {
        Self {
            face: Some(Arc::new(face)),
            width_px,
        }
    }
}

impl Rasterizer for SheetRasterizer {
    fn check_available(&self) -> Result<(), AppError> {
        match self.face {
            Some(_) => Ok(()),
            None => Err(AppError::ResourceUnavailable(
                "no usable font was found to rasterize the views".to_string(),
            )),
        }
    }

    async fn rasterize(&self, layout: SheetLayout, pictures: Pictures) -> Result<RgbaImage> {
        let face = self
            .face
            .clone()
            .ok_or_else(|| anyhow!("Rasterizer has no font"))?;
        let width = self.width_px;
        tokio::task::spawn_blocking(move || paint(&face, &layout, &pictures, width))
            .await
            .map_err(|e| anyhow!("Rasterizer task failed: {e}"))?
    }
}

/// Measure, allocate, then draw
pub fn paint(face: &Typeface, layout: &SheetLayout, pictures: &Pictures, width: u32) -> Result<RgbaImage> {
    if width == 0 {
        return Err(anyhow!("Canvas width must be positive"));
    }

    let mut measure = Painter {
        face,
        canvas: None,
        width: width as f32,
        cursor: PADDING,
        pictures,
    };
    measure.sheet(layout);
    let height = (measure.cursor + PADDING).ceil() as u32;

    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
    let mut painter = Painter {
        face,
        canvas: Some(&mut canvas),
        width: width as f32,
        cursor: PADDING,
        pictures,
    };
    painter.sheet(layout);

    debug!(title = %layout.title, width, height, "Rasterized layout");
    Ok(canvas)
}

/// Walks a layout top to bottom; without a canvas it only advances the cursor
struct Painter<'a> {
    face: &'a Typeface,
    canvas: Option<&'a mut RgbaImage>,
    width: f32,
    cursor: f32,
    pictures: &'a Pictures,
}

impl Painter<'_> {
    fn content_width(&self) -> f32 {
        self.width - 2.0 * PADDING
    }

    fn sheet(&mut self, layout: &SheetLayout) {
        self.text(&layout.title, PADDING, TITLE_SIZE, ACCENT);
        let y = self.cursor + GAP / 2.0;
        self.fill(PADDING, y, self.content_width(), 2.0, ACCENT);
        self.cursor = y + 2.0 + GAP;

        for block in &layout.blocks {
            match block {
                Block::Heading(text) => {
                    self.cursor += GAP / 2.0;
                    self.text(text, PADDING, HEADING_SIZE, ACCENT);
                }
                Block::Field { label, value } => self.field(label, value),
                Block::Table { title, columns, rows } => self.table(title, columns, rows),
                Block::Image { caption, source } => self.picture(caption, source),
                Block::Controls(labels) => self.controls(labels),
            }
            self.cursor += GAP;
        }
    }

    fn text(&mut self, text: &str, x: f32, size: f32, color: Rgba<u8>) {
        let top = self.cursor;
        if let Some(canvas) = self.canvas.as_deref_mut() {
            self.face.draw_text(canvas, text, x, top, size, color);
        }
        self.cursor += self.face.line_height(size);
    }

    fn field(&mut self, label: &str, value: &str) {
        let label_width = self.content_width() * LABEL_COLUMN;
        let value_x = PADDING + label_width;
        let value_width = self.content_width() - label_width;
        let lines = self.face.wrap(value, TEXT_SIZE, value_width);
        let line_height = self.face.line_height(TEXT_SIZE);

        let top = self.cursor;
        if let Some(canvas) = self.canvas.as_deref_mut() {
            let label = self.face.ellipsize(label, LABEL_SIZE, label_width - GAP);
            self.face.draw_text(canvas, &label, PADDING, top + 2.0, LABEL_SIZE, MUTED);
            for (i, line) in lines.iter().enumerate() {
                self.face
                    .draw_text(canvas, line, value_x, top + i as f32 * line_height, TEXT_SIZE, INK);
            }
        }
        self.cursor = top + lines.len() as f32 * line_height;
        self.fill(value_x, self.cursor, value_width, 1.0, RULE);
        self.cursor += 1.0;
    }

    fn table(&mut self, title: &str, columns: &[String], rows: &[Vec<String>]) {
        self.text(title, PADDING, HEADING_SIZE * 0.85, ACCENT);
        self.cursor += GAP / 2.0;
        if columns.is_empty() {
            return;
        }

        let col_width = self.content_width() / columns.len() as f32;
        let row_height = self.face.line_height(CELL_SIZE) + 2.0 * CELL_PADDING;
        let blank = vec![String::new(); columns.len()];
        let body: Vec<&Vec<String>> = if rows.is_empty() {
            vec![&blank]
        } else {
            rows.iter().collect()
        };

        let table_top = self.cursor;
        self.fill(PADDING, table_top, self.content_width(), row_height, HEADER_FILL);
        self.row(columns, col_width, row_height);
        for row in body {
            self.row(row, col_width, row_height);
        }
        let table_height = self.cursor - table_top;

        // Grid lines
        for i in 0..=columns.len() {
            let x = PADDING + i as f32 * col_width;
            self.fill(x.min(self.width - PADDING - 1.0), table_top, 1.0, table_height, RULE);
        }
        let mut y = table_top;
        while y <= self.cursor + 0.5 {
            self.fill(PADDING, y, self.content_width(), 1.0, RULE);
            y += row_height;
        }
    }

    fn row(&mut self, cells: &[String], col_width: f32, row_height: f32) {
        let top = self.cursor;
        if let Some(canvas) = self.canvas.as_deref_mut() {
            for (i, cell) in cells.iter().enumerate() {
                let x = PADDING + i as f32 * col_width + CELL_PADDING;
                let text = self.face.ellipsize(cell, CELL_SIZE, col_width - 2.0 * CELL_PADDING);
                self.face
                    .draw_text(canvas, &text, x, top + CELL_PADDING, CELL_SIZE, INK);
            }
        }
        self.cursor = top + row_height;
    }

    fn picture(&mut self, caption: &str, source: &str) {
        self.text(caption, PADDING, LABEL_SIZE, MUTED);
        self.cursor += GAP / 3.0;
        let top = self.cursor;
        let max_width = self.content_width();

        let pictures = self.pictures;
        let Some(picture) = pictures.get(source) else {
            self.stroke(PADDING, top, max_width, PLACEHOLDER_HEIGHT, RULE);
            self.cursor = top + PLACEHOLDER_HEIGHT / 2.0 - self.face.line_height(TEXT_SIZE) / 2.0;
            self.text("Sin imagen", PADDING + GAP, TEXT_SIZE, MUTED);
            self.cursor = top + PLACEHOLDER_HEIGHT;
            return;
        };

        let (w, h) = (picture.width() as f32, picture.height() as f32);
        let scale = (max_width / w).min(IMAGE_MAX_HEIGHT / h).min(1.0);
        let target_w = (w * scale).round().max(1.0) as u32;
        let target_h = (h * scale).round().max(1.0) as u32;

        if let Some(canvas) = self.canvas.as_deref_mut() {
            let (x, y) = (PADDING as i64, top.round() as i64);
            if scale < 1.0 {
                let scaled = imageops::resize(picture.as_ref(), target_w, target_h, FilterType::Triangle);
                imageops::overlay(canvas, &scaled, x, y);
            } else {
                imageops::overlay(canvas, picture.as_ref(), x, y);
            }
        }
        self.cursor = top + target_h as f32;
    }

    fn controls(&mut self, labels: &[String]) {
        let top = self.cursor;
        let height = self.face.line_height(LABEL_SIZE) + 2.0 * CELL_PADDING;
        let mut x = PADDING;
        for label in labels {
            let width = self.face.text_width(label, LABEL_SIZE) + 4.0 * CELL_PADDING;
            self.fill(x, top, width, height, CONTROL_FILL);
            if let Some(canvas) = self.canvas.as_deref_mut() {
                self.face.draw_text(
                    canvas,
                    label,
                    x + 2.0 * CELL_PADDING,
                    top + CELL_PADDING,
                    LABEL_SIZE,
                    INK,
                );
            }
            x += width + GAP;
        }
        self.cursor = top + height;
    }

    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let Some(canvas) = self.canvas.as_deref_mut() else {
            return;
        };
        let x0 = x.max(0.0).round() as u32;
        let y0 = y.max(0.0).round() as u32;
        let x1 = ((x + w).round() as u32).min(canvas.width());
        let y1 = ((y + h).round() as u32).min(canvas.height());
        for py in y0..y1 {
            for px in x0..x1 {
                canvas.put_pixel(px, py, color);
            }
        }
    }

    fn stroke(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        self.fill(x, y, w, 1.0, color);
        self.fill(x, y + h - 1.0, w, 1.0, color);
        self.fill(x, y, 1.0, h, color);
        self.fill(x + w - 1.0, y, 1.0, h, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::images::decode_data_uri;
    use crate::views::images::tests::png_data_uri;

    fn face() -> Option<Typeface> {
        Typeface::from_system_font("DejaVu Sans").ok()
    }

    fn decoded(sources: &[&str]) -> Pictures {
        sources
            .iter()
            .filter_map(|uri| Some((uri.to_string(), Arc::new(decode_data_uri(uri).ok()?))))
            .collect()
    }

    fn sample_layout(picture: &str) -> SheetLayout {
        let mut layout = SheetLayout::new("Información General");
        layout.field("Artículo", "A-99");
        layout.push(Block::Table {
            title: "Materiales".into(),
            columns: vec!["Material".into(), "Color".into()],
            rows: vec![vec!["Denim".into(), "Índigo".into()]],
        });
        layout.push(Block::Image {
            caption: "Frente".into(),
            source: picture.to_string(),
        });
        layout
    }

    #[test]
    fn test_paint_uses_requested_width() {
        let Some(face) = face() else { return };
        let uri = png_data_uri(40, 20);
        let canvas = paint(&face, &sample_layout(&uri), &decoded(&[&uri]), 800).unwrap();
        assert_eq!(canvas.width(), 800);
        assert!(canvas.height() > 100);
    }

    #[test]
    fn test_broken_picture_gets_placeholder() {
        let Some(face) = face() else { return };
        let uri = png_data_uri(40, 300);
        let with_picture = paint(&face, &sample_layout(&uri), &decoded(&[&uri]), 800).unwrap();
        let broken_uri = "data:image/png;base64,!!!";
        let broken = paint(&face, &sample_layout(broken_uri), &decoded(&[broken_uri]), 800).unwrap();
        assert_eq!(
            broken.height() as f32,
            with_picture.height() as f32 - 300.0 + PLACEHOLDER_HEIGHT
        );
    }

    #[test]
    fn test_only_supplied_pictures_are_drawn() {
        let Some(face) = face() else { return };
        let uri = png_data_uri(40, 300);
        let supplied = paint(&face, &sample_layout(&uri), &decoded(&[&uri]), 800).unwrap();
        let not_supplied = paint(&face, &sample_layout(&uri), &Pictures::new(), 800).unwrap();
        assert_eq!(
            not_supplied.height() as f32,
            supplied.height() as f32 - 300.0 + PLACEHOLDER_HEIGHT
        );
    }

    #[test]
    fn test_longer_layout_is_taller() {
        let Some(face) = face() else { return };
        let short = SheetLayout::new("Corte");
        let mut long = SheetLayout::new("Corte");
        for i in 0..10 {
            long.field("Capa", &i.to_string());
        }
        let a = paint(&face, &short, &Pictures::new(), 600).unwrap();
        let b = paint(&face, &long, &Pictures::new(), 600).unwrap();
        assert!(b.height() > a.height());
    }

    #[test]
    fn test_missing_font_is_resource_unavailable() {
        let rasterizer = SheetRasterizer { face: None, width_px: 800 };
        assert!(matches!(
            rasterizer.check_available(),
            Err(AppError::ResourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_rasterize_off_thread() {
        let Some(face) = face() else { return };
        let rasterizer = SheetRasterizer::with_typeface(face, 640);
        let canvas = rasterizer
            .rasterize(sample_layout(""), Pictures::new())
            .await
            .unwrap();
        assert_eq!(canvas.width(), 640);
    }
}
