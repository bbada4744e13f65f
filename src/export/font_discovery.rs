//! Locating the font file the sheet rasterizer paints with

use anyhow::{anyhow, bail, Context, Result};
use fontconfig::{Fontconfig, Pattern};
use std::ffi::CString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Style suffixes recognised in a configured font name, longest first
const STYLE_SUFFIXES: &[&str] = &[
    "SemiBold Italic",
    "Bold Italic",
    "Bold Oblique",
    "Medium Italic",
    "Light Italic",
    "SemiBold",
    "Italic",
    "Oblique",
    "Bold",
    "Light",
    "Medium",
    "Regular",
    "Condensed",
];

/// Sans families tried when the configured one is missing
const FALLBACK_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Sans"];

/// Distro locations used when fontconfig itself has nothing to offer
const WELL_KNOWN_FILES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
];

/// A configured font name split into family and optional style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FontQuery<'a> {
    family: &'a str,
    style: Option<&'static str>,
}

impl<'a> FontQuery<'a> {
    /// "DejaVu Sans Bold" → family "DejaVu Sans", style "Bold"
    fn parse(name: &'a str) -> Self {
        let name = name.trim();
        let style = STYLE_SUFFIXES.iter().copied().find(|style| {
            name.strip_suffix(style)
                .is_some_and(|rest| rest.is_empty() || rest.ends_with(' '))
        });
        match style {
            Some(style) => Self {
                family: name[..name.len() - style.len()].trim_end(),
                style: Some(style),
            },
            None => Self { family: name, style: None },
        }
    }

    /// Ask fontconfig for this family; a substituted family counts as missing
    fn lookup(&self, fc: &Fontconfig) -> Result<PathBuf> {
        let mut pattern = Pattern::new(fc);
        let family = CString::new(self.family).context("Font family contains a NUL byte")?;
        pattern.add_string(fontconfig::FC_FAMILY, &family);
        if let Some(style) = self.style {
            let style = CString::new(style).context("Font style contains a NUL byte")?;
            pattern.add_string(fontconfig::FC_STYLE, &style);
        }

        let matched = pattern.font_match();
        let offered = matched.get_string(fontconfig::FC_FAMILY).unwrap_or_default();
        if !offered.eq_ignore_ascii_case(self.family) {
            bail!("'{}' is not installed (closest: '{}')", self.family, offered);
        }

        let file = matched
            .filename()
            .ok_or_else(|| anyhow!("fontconfig has no file for '{}'", self.family))?;
        existing(Path::new(file))
    }
}

fn existing(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(anyhow!("{} is not a readable font file", path.display()))
    }
}

/// The configured font, else a common sans family, else a well-known file
pub fn resolve_sheet_font(preferred: &str) -> Result<PathBuf> {
    let fc = Fontconfig::new();
    if fc.is_none() {
        warn!("fontconfig unavailable, only well-known font files will be tried");
    }

    if let Some(fc) = &fc {
        let candidates = std::iter::once(preferred).chain(FALLBACK_FAMILIES.iter().copied());
        for name in candidates {
            match FontQuery::parse(name).lookup(fc) {
                Ok(path) => {
                    debug!(font = name, path = %path.display(), "Resolved sheet font");
                    return Ok(path);
                }
                Err(e) if name == preferred => {
                    warn!(font = name, error = %e, "Configured font unavailable, trying fallbacks")
                }
                Err(e) => debug!(font = name, error = %e, "Fallback font unavailable"),
            }
        }
    }

    WELL_KNOWN_FILES
        .iter()
        .find_map(|file| existing(Path::new(file)).ok())
        .ok_or_else(|| anyhow!("No usable font: tried '{preferred}', {FALLBACK_FAMILIES:?} and {WELL_KNOWN_FILES:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_trailing_style() {
        assert_eq!(
            FontQuery::parse("DejaVu Sans"),
            FontQuery { family: "DejaVu Sans", style: None }
        );
        assert_eq!(
            FontQuery::parse("DejaVu Sans Bold"),
            FontQuery { family: "DejaVu Sans", style: Some("Bold") }
        );
        assert_eq!(
            FontQuery::parse("Noto Sans SemiBold Italic"),
            FontQuery { family: "Noto Sans", style: Some("SemiBold Italic") }
        );
        // glued to the family name, not a style
        assert_eq!(
            FontQuery::parse("Boldface"),
            FontQuery { family: "Boldface", style: None }
        );
    }

    #[test]
    fn test_missing_file_is_rejected() {
        assert!(existing(Path::new("/nonexistent/font.ttf")).is_err());
    }

    #[test]
    fn test_resolved_font_is_an_absolute_file() {
        if let Ok(path) = resolve_sheet_font("Font That Does Not Exist") {
            assert!(path.is_absolute());
            assert!(path.is_file());
        }
    }
}
