//! Embedded pictures: data-URI encoding and egui texture caching
//!
//! Pictures are kept as `data:<mime>;base64,<payload>` strings so they travel
//! inside the view data bags and saved documents.

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use eframe::egui;
use image::{ImageFormat, RgbaImage};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::{info, warn};

/// Encode raw image file bytes as a data URI, rejecting non-images
pub fn encode_data_uri(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes).context("Unrecognized image format")?;
    let mime = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        other => return Err(anyhow!("Unsupported image format {:?} (expected PNG or JPEG)", other)),
    };
    // Make sure it actually decodes before it ends up in a saved document
    image::load_from_memory_with_format(bytes, format).context("Image data is corrupt")?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Read a picture from disk as a data URI
pub fn load_file_as_data_uri(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read image {:?}", path))?;
    let uri = encode_data_uri(&bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Loaded picture");
    Ok(uri)
}

/// Decode a data URI into RGBA pixels
pub fn decode_data_uri(uri: &str) -> Result<RgbaImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("Not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("Data URI has no payload"))?;
    if !header.ends_with(";base64") {
        return Err(anyhow!("Only base64 data URIs are supported"));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .context("Data URI payload is not valid base64")?;
    let decoded = image::load_from_memory(&bytes).context("Failed to decode picture")?;
    Ok(decoded.to_rgba8())
}

fn uri_key(uri: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    uri.hash(&mut hasher);
    hasher.finish()
}

/// Textures for pictures shown in the editor, decoded once per data URI
#[derive(Default)]
pub struct ImageCache {
    textures: HashMap<u64, Option<egui::TextureHandle>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture for `uri`; `None` if it cannot be decoded
    pub fn texture(&mut self, ctx: &egui::Context, uri: &str) -> Option<egui::TextureHandle> {
        if uri.is_empty() {
            return None;
        }
        let key = uri_key(uri);
        self.textures
            .entry(key)
            .or_insert_with(|| match decode_data_uri(uri) {
                Ok(rgba) => {
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    Some(ctx.load_texture(format!("picture-{key:x}"), color, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    warn!(error = %e, "Cannot display picture");
                    None
                }
            })
            .clone()
    }

    /// Draw a picture scaled to `max_height`, or a placeholder
    pub fn show(&mut self, ui: &mut egui::Ui, uri: &str, max_height: f32) {
        match self.texture(ui.ctx(), uri) {
            Some(texture) => {
                let [w, h] = texture.size();
                let scale = (max_height / h.max(1) as f32).min(1.0);
                let size = egui::vec2(w as f32 * scale, h as f32 * scale);
                ui.add(egui::Image::new(egui::load::SizedTexture::new(texture.id(), size)));
            }
            None => {
                ui.label(egui::RichText::new("(sin imagen)").italics().weak());
            }
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}
