//! Paginated PDF assembly with printpdf

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Px,
};
use tracing::debug;

use super::layout::{PageGeometry, Placement};
use crate::error::AppError;

/// Creates documents; the first page exists as soon as a document does
pub trait DocumentAssembler {
    type Document: PageDocument;

    /// Fails with `ResourceUnavailable` when no document can be produced
    fn check_available(&self) -> Result<(), AppError>;

    fn new_document(&self, title: &str, geometry: PageGeometry) -> Result<Self::Document>;
}

/// Drawing surface of one document. Coordinates are millimetres from the top-left corner.
pub trait PageDocument {
    fn page_count(&self) -> usize;

    fn add_page(&mut self);

    fn text(&mut self, text: &str, size_pt: f32, x_mm: f32, y_mm: f32);

    fn image(&mut self, image: &RgbaImage, placement: Placement) -> Result<()>;

    fn finish(self) -> Result<Vec<u8>>;
}

pub struct PdfAssembler;

impl DocumentAssembler for PdfAssembler {
    type Document = PdfPages;

    fn check_available(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn new_document(&self, title: &str, geometry: PageGeometry) -> Result<PdfPages> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(geometry.width_mm),
            Mm(geometry.height_mm),
            "Layer 1",
        );
        let layer = doc.get_page(page).get_layer(layer);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load built-in font: {e}"))?;

        Ok(PdfPages {
            doc,
            layer,
            font,
            geometry,
            pages: 1,
        })
    }
}

pub struct PdfPages {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    geometry: PageGeometry,
    pages: usize,
}

/// Composite RGBA onto white; PDF images here carry no alpha channel
fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}

impl PageDocument for PdfPages {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn add_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(self.geometry.width_mm),
            Mm(self.geometry.height_mm),
            format!("Layer {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    fn text(&mut self, text: &str, size_pt: f32, x_mm: f32, y_mm: f32) {
        self.layer.use_text(
            text,
            size_pt,
            Mm(x_mm),
            Mm(self.geometry.height_mm - y_mm),
            &self.font,
        );
    }

    fn image(&mut self, image: &RgbaImage, placement: Placement) -> Result<()> {
        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(anyhow!("Raster is empty"));
        }

        let image_data = flatten_on_white(image).into_raw();
        let xobject = Image::from(ImageXObject {
            width: Px(width_px as usize),
            height: Px(height_px as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data,
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // printpdf anchors images at their bottom-left corner
        let bottom = self.geometry.height_mm - placement.y_mm - placement.height_mm;
        xobject.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(placement.x_mm)),
                translate_y: Some(Mm(bottom)),
                dpi: Some(placement.dpi(width_px)),
                ..Default::default()
            },
        );
        debug!(page = self.pages, width_px, height_px, "Placed raster");
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| anyhow!("Failed to serialize PDF: {e}"))
    }
}
