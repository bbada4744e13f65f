//! Multi-page PDF export of the four views
//!
//! Each view is activated through the switcher, its pictures are awaited,
//! export mode hides interactive chrome, the layout is rasterized and the
//! bitmap is fitted onto its own page. Whatever view was open before the
//! export is restored afterwards, even when a view fails.

mod font;
mod font_discovery;
pub mod layout;
pub mod pdf;
pub mod rasterizer;

pub use layout::{fit_image, line_height_mm, wrap_to_width, PageGeometry};
pub use pdf::{DocumentAssembler, PageDocument, PdfAssembler};
pub use rasterizer::{Pictures, Rasterizer, SheetRasterizer};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::ExportSettings;
use crate::constants::{document, export};
use crate::error::{AppError, Result};
use crate::model::ViewName;
use crate::views::images::decode_data_uri;
use crate::views::ViewSwitcher;

/// Result of a finished export
#[derive(Debug)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub pages: usize,
    /// Views that were replaced by an error message
    pub failures: Vec<AppError>,
}

pub struct ExportPipeline<R, A> {
    rasterizer: R,
    assembler: A,
    settings: ExportSettings,
}

impl ExportPipeline<SheetRasterizer, PdfAssembler> {
    /// Font-backed rasterizer and printpdf assembler
    pub fn from_settings(settings: ExportSettings) -> Self {
        Self::new(SheetRasterizer::load(&settings), PdfAssembler, settings)
    }
}

impl<R: Rasterizer, A: DocumentAssembler> ExportPipeline<R, A> {
    pub fn new(rasterizer: R, assembler: A, settings: ExportSettings) -> Self {
        Self {
            rasterizer,
            assembler,
            settings,
        }
    }

    /// Render every view, in order, into one document
    pub async fn export_all(&self, switcher: &mut ViewSwitcher) -> Result<ExportOutcome> {
        let original = switcher.current_view();

        if let Err(e) = self
            .rasterizer
            .check_available()
            .and_then(|_| self.assembler.check_available())
        {
            warn!(error = %e, "Export aborted before touching any view");
            return Err(e);
        }

        switcher.flush_active();

        let geometry = PageGeometry::from_settings(&self.settings);
        let mut doc = self
            .assembler
            .new_document(&self.settings.document_title, geometry)
            .map_err(|e| AppError::ResourceUnavailable(format!("{e:#}")))?;
        self.title_page(&mut doc, &geometry);

        let mut failures = Vec::new();
        for view in ViewName::ALL {
            doc.add_page();
            doc.text(
                view.title(),
                export::VIEW_TITLE_FONT_SIZE,
                geometry.margin_mm,
                geometry.title_baseline(),
            );

            if let Err(e) = self.capture_view(switcher, view, &geometry, &mut doc).await {
                let message = match &e {
                    AppError::PerViewCapture { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                error!(view = %view, error = %message, "View left out of the export");
                let notice = format!("Error procesando vista {}: {}", view.title(), message);
                let mut y = geometry.body_baseline(export::NORMAL_FONT_SIZE);
                for line in wrap_to_width(&notice, export::NORMAL_FONT_SIZE, geometry.printable_width()) {
                    doc.text(&line, export::NORMAL_FONT_SIZE, geometry.margin_mm, y);
                    y += line_height_mm(export::NORMAL_FONT_SIZE);
                }
                failures.push(e);
            }
        }

        self.restore(switcher, original);

        let pages = doc.page_count();
        let bytes = doc
            .finish()
            .map_err(|e| AppError::ResourceUnavailable(format!("{e:#}")))?;
        info!(pages, failures = failures.len(), bytes = bytes.len(), "Export finished");

        Ok(ExportOutcome {
            bytes,
            pages,
            failures,
        })
    }

    fn title_page(&self, doc: &mut A::Document, geometry: &PageGeometry) {
        let x = geometry.margin_mm;
        let mut y = geometry.margin_mm + 20.0;
        doc.text(&self.settings.document_title, export::TITLE_FONT_SIZE, x, y);

        y += 12.0;
        let generated = Local::now().format("%d/%m/%Y %H:%M");
        doc.text(&format!("Generado el {generated}"), export::NORMAL_FONT_SIZE, x, y);

        y += 14.0;
        doc.text("Contenido", export::VIEW_TITLE_FONT_SIZE, x, y);
        for view in ViewName::ALL {
            y += 8.0;
            doc.text(
                &format!("{}. {}", view.index() + 1, view.title()),
                export::NORMAL_FONT_SIZE,
                x + 4.0,
                y,
            );
        }
    }

    async fn capture_view(
        &self,
        switcher: &mut ViewSwitcher,
        view: ViewName,
        geometry: &PageGeometry,
        doc: &mut A::Document,
    ) -> Result<()> {
        switcher
            .navigate_to(view)
            .map_err(|e| AppError::capture(view, e.to_string()))?;

        let sources = switcher
            .snapshot()
            .map(|layout| layout.image_sources())
            .unwrap_or_default();
        let pictures = self.await_images(sources).await;

        switcher.set_capture_mode(true);
        tokio::time::sleep(Duration::from_millis(self.settings.settle_delay_ms)).await;

        let raster = match switcher.snapshot() {
            Some(layout) => self.rasterizer.rasterize(layout, pictures).await,
            None => Err(anyhow::anyhow!("view is not mounted")),
        };
        switcher.set_capture_mode(false);

        let raster = raster.map_err(|e| AppError::capture(view, format!("{e:#}")))?;
        let placement = fit_image(geometry, raster.width(), raster.height())
            .ok_or_else(|| AppError::capture(view, "raster does not fit the page"))?;
        doc.image(&raster, placement)
            .map_err(|e| AppError::capture(view, format!("{e:#}")))?;

        info!(view = %view, width = raster.width(), height = raster.height(), "Captured view");
        Ok(())
    }

    /// Decode every picture off-thread, each within its own time budget.
    /// Pictures that fail or time out are left out and painted as placeholders.
    async fn await_images(&self, sources: Vec<String>) -> Pictures {
        let budget = Duration::from_millis(self.settings.image_timeout_ms);
        let mut pictures = Pictures::new();

        for source in sources {
            if pictures.contains_key(&source) {
                continue;
            }
            let uri = source.clone();
            let decode = tokio::task::spawn_blocking(move || decode_data_uri(&uri));
            match tokio::time::timeout(budget, decode).await {
                Ok(Ok(Ok(picture))) => {
                    pictures.insert(source, Arc::new(picture));
                }
                Ok(Ok(Err(e))) => warn!(error = %e, "Picture failed to decode, using placeholder"),
                Ok(Err(e)) => warn!(error = %e, "Picture decode task failed, using placeholder"),
                Err(_) => warn!(
                    timeout_ms = self.settings.image_timeout_ms,
                    "Picture took too long, using placeholder"
                ),
            }
        }
        pictures
    }

    fn restore(&self, switcher: &mut ViewSwitcher, original: Option<ViewName>) {
        match original {
            Some(view) => {
                if let Err(e) = switcher.navigate_to(view) {
                    error!(view = %view, error = %e, "Failed to restore view after export");
                }
            }
            None => switcher.close_active(),
        }
    }
}


/// `ficha_tecnica_<YYYY-MM-DD>.pdf`
pub fn download_file_name(date: NaiveDate) -> String {
    format!("{}_{}.pdf", document::FILE_STEM, date.format("%Y-%m-%d"))
}

/// Platform downloads folder, falling back to home then the working directory
pub fn download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// First free name in `dir`: `name.pdf`, then `name_1.pdf`, `name_2.pdf`...
fn unused_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = file_name.trim_end_matches(".pdf");
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.pdf")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Write exported bytes into `dir` under today's file name, never replacing a file
pub fn write_download(bytes: &[u8], dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {:?}", dir))?;
    let path = unused_path(dir, &download_file_name(Local::now().date_naive()));
    fs::write(&path, bytes).with_context(|| format!("Failed to write PDF to {:?}", path))?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote PDF");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ViewData, ViewDataMap};
    use crate::persistence::{LocalStorage, ViewStore};
    use crate::export::layout::Placement;
    use crate::views::images::tests::png_data_uri;
    use crate::views::{Block, SheetLayout};
    use image::{Rgba, RgbaImage};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Page,
        Text(String),
        Image { width_px: u32 },
    }

    #[derive(Default)]
    struct FakeRasterizer {
        unavailable: bool,
        fail_title: Option<&'static str>,
        seen: RefCell<Vec<SheetLayout>>,
        /// Picture sizes handed over with each layout
        pictures: RefCell<Vec<Vec<(u32, u32)>>>,
    }

    impl Rasterizer for FakeRasterizer {
        fn check_available(&self) -> Result<()> {
            if self.unavailable {
                return Err(AppError::ResourceUnavailable("no font".into()));
            }
            Ok(())
        }

        async fn rasterize(&self, layout: SheetLayout, pictures: Pictures) -> anyhow::Result<RgbaImage> {
            let fail = self.fail_title == Some(layout.title.as_str());
            self.pictures
                .borrow_mut()
                .push(pictures.values().map(|p| p.dimensions()).collect());
            self.seen.borrow_mut().push(layout);
            if fail {
                anyhow::bail!("canvas exploded");
            }
            Ok(RgbaImage::from_pixel(100, 140, Rgba([255, 255, 255, 255])))
        }
    }

    #[derive(Default, Clone)]
    struct FakeAssembler {
        ops: Rc<RefCell<Vec<Op>>>,
    }

    struct FakeDocument {
        ops: Rc<RefCell<Vec<Op>>>,
        pages: usize,
    }

    impl DocumentAssembler for FakeAssembler {
        type Document = FakeDocument;

        fn check_available(&self) -> Result<()> {
            Ok(())
        }

        fn new_document(&self, _title: &str, _geometry: PageGeometry) -> anyhow::Result<FakeDocument> {
            Ok(FakeDocument {
                ops: self.ops.clone(),
                pages: 1,
            })
        }
    }

    impl PageDocument for FakeDocument {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn add_page(&mut self) {
            self.pages += 1;
            self.ops.borrow_mut().push(Op::Page);
        }

        fn text(&mut self, text: &str, _size_pt: f32, _x_mm: f32, _y_mm: f32) {
            self.ops.borrow_mut().push(Op::Text(text.to_string()));
        }

        fn image(&mut self, image: &RgbaImage, _placement: Placement) -> anyhow::Result<()> {
            self.ops.borrow_mut().push(Op::Image {
                width_px: image.width(),
            });
            Ok(())
        }

        fn finish(self) -> anyhow::Result<Vec<u8>> {
            Ok(b"%PDF-fake".to_vec())
        }
    }

    fn settings() -> ExportSettings {
        ExportSettings {
            settle_delay_ms: 0,
            image_timeout_ms: 2_000,
            ..ExportSettings::default()
        }
    }

    fn switcher(dir: &Path) -> ViewSwitcher {
        ViewSwitcher::new(ViewStore::open(LocalStorage::open(dir)))
    }

    fn view_titles_in(ops: &[Op]) -> Vec<String> {
        let titles: Vec<&str> = ViewName::ALL.iter().map(|v| v.title()).collect();
        ops.iter()
            .filter_map(|op| match op {
                Op::Text(text) if titles.contains(&text.as_str()) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_five_pages_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        let assembler = FakeAssembler::default();
        let pipeline = ExportPipeline::new(FakeRasterizer::default(), assembler.clone(), settings());

        let outcome = pipeline.export_all(&mut switcher).await.unwrap();

        assert_eq!(outcome.pages, 5);
        assert!(outcome.failures.is_empty());
        let ops = assembler.ops.borrow();
        assert_eq!(ops.iter().filter(|op| **op == Op::Page).count(), 4);
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::Image { .. })).count(), 4);
        // Title page lists the contents first, then one title per page
        let expected: Vec<String> = ViewName::ALL.iter().map(|v| v.title().to_string()).collect();
        let titles = view_titles_in(&ops);
        assert_eq!(titles[titles.len() - 4..], expected[..]);

        let seen: Vec<String> = pipeline.rasterizer.seen.borrow().iter().map(|l| l.title.clone()).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_restores_original_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        switcher.navigate_to(ViewName::Vista3).unwrap();
        let pipeline = ExportPipeline::new(FakeRasterizer::default(), FakeAssembler::default(), settings());

        pipeline.export_all(&mut switcher).await.unwrap();

        assert_eq!(switcher.current_view(), Some(ViewName::Vista3));
        assert!(!switcher.host().export_mode());
    }

    #[tokio::test]
    async fn test_nothing_active_stays_closed() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        let pipeline = ExportPipeline::new(FakeRasterizer::default(), FakeAssembler::default(), settings());

        pipeline.export_all(&mut switcher).await.unwrap();

        assert_eq!(switcher.current_view(), None);
        assert_eq!(switcher.host().live(), None);
    }

    #[tokio::test]
    async fn test_failed_view_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        switcher.navigate_to(ViewName::Vista1).unwrap();
        let rasterizer = FakeRasterizer {
            fail_title: Some(ViewName::Vista3.title()),
            ..FakeRasterizer::default()
        };
        let assembler = FakeAssembler::default();
        let pipeline = ExportPipeline::new(rasterizer, assembler.clone(), settings());

        let outcome = pipeline.export_all(&mut switcher).await.unwrap();

        assert_eq!(outcome.pages, 5);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0],
            AppError::PerViewCapture { view: ViewName::Vista3, .. }
        ));
        let ops = assembler.ops.borrow();
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::Image { .. })).count(), 3);
        assert!(ops.contains(&Op::Text("Error procesando vista Corte: canvas exploded".into())));
        assert_eq!(switcher.current_view(), Some(ViewName::Vista1));
        assert!(!switcher.host().export_mode());
    }

    #[tokio::test]
    async fn test_unavailable_rasterizer_aborts_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        switcher.navigate_to(ViewName::Vista2).unwrap();
        let rasterizer = FakeRasterizer {
            unavailable: true,
            ..FakeRasterizer::default()
        };
        let assembler = FakeAssembler::default();
        let pipeline = ExportPipeline::new(rasterizer, assembler.clone(), settings());

        let result = pipeline.export_all(&mut switcher).await;

        assert!(matches!(result, Err(AppError::ResourceUnavailable(_))));
        assert_eq!(switcher.current_view(), Some(ViewName::Vista2));
        assert_eq!(switcher.registry().created_count(), 1);
        assert!(assembler.ops.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_captures_hide_controls_and_broken_pictures() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        let mut costs = ViewData::new();
        costs.set_text("fotoIzquierda", &png_data_uri(8, 8));
        costs.set_text("fotoDerecha", "data:image/png;base64,!!!");
        let mut views = ViewDataMap::default();
        views.set(ViewName::Vista2, costs);
        switcher.replace_all(views).unwrap();
        let pipeline = ExportPipeline::new(FakeRasterizer::default(), FakeAssembler::default(), settings());

        pipeline.export_all(&mut switcher).await.unwrap();

        let seen = pipeline.rasterizer.seen.borrow();
        assert!(seen.iter().all(|layout| !layout.has_controls()));
        let handed_over = &pipeline.rasterizer.pictures.borrow()[ViewName::Vista2.index()];
        assert_eq!(handed_over, &vec![(8, 8)]);
    }

    #[tokio::test]
    async fn test_export_keeps_unsaved_edits() {
        let dir = tempfile::tempdir().unwrap();
        let mut switcher = switcher(dir.path());
        switcher.navigate_to(ViewName::Vista1).unwrap();
        let mut edit = ViewData::new();
        edit.set_text("articulo", "A-99");
        switcher.live_view_mut().unwrap().deserialize(&edit);
        let pipeline = ExportPipeline::new(FakeRasterizer::default(), FakeAssembler::default(), settings());

        pipeline.export_all(&mut switcher).await.unwrap();

        let shown = switcher.live_view_mut().unwrap().serialize();
        assert_eq!(shown.text("articulo"), Some("A-99"));
        let captured = &pipeline.rasterizer.seen.borrow()[0];
        assert!(captured
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Field { value, .. } if value == "A-99")));
    }

    #[test]
    fn test_download_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(download_file_name(date), "ficha_tecnica_2026-03-07.pdf");
    }

    #[test]
    fn test_write_download() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_download(b"%PDF-1.3", dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("ficha_tecnica_"));
        assert_eq!(fs::read(path).unwrap(), b"%PDF-1.3");
    }

    #[test]
    fn test_write_download_keeps_earlier_exports() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_download(b"first", dir.path()).unwrap();
        let second = write_download(b"second", dir.path()).unwrap();

        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("_1.pdf"));
        assert_eq!(fs::read(first).unwrap(), b"first");
        assert_eq!(fs::read(second).unwrap(), b"second");
    }
}
