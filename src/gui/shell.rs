//! Navigation shell: view buttons, shortcuts, dialogs and the timers around the switcher

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use eframe::{egui, CreationContext, NativeOptions};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use super::components::{confirm_ui, nav_ui, notice_ui, Notice, PathAction, PathDialog, PathPurpose, Presentation};
use super::constants::*;
use crate::config::Config;
use crate::error::AppError;
use crate::export::{self, ExportPipeline, PdfAssembler, SheetRasterizer};
use crate::hotkeys::{self, ShellCommand};
use crate::model::ViewName;
use crate::persistence::{Document, LocalStorage, ViewStore};
use crate::views::{ImageCache, ViewChanged, ViewSwitcher};

struct StatusMessage {
    text: String,
    color: egui::Color32,
}

struct FichaApp {
    switcher: ViewSwitcher,
    changes: Receiver<ViewChanged>,
    pipeline: ExportPipeline<SheetRasterizer, PdfAssembler>,
    runtime: Runtime,
    images: ImageCache,
    presentation: Presentation,
    path_dialog: PathDialog,
    notice: Option<Notice>,
    confirm_clear: bool,
    status_message: Option<StatusMessage>,
    autosave_interval: Duration,
    last_autosave: Instant,
    /// Time of the first edit not yet copied to the store
    dirty_since: Option<Instant>,
}

impl FichaApp {
    fn new(
        _cc: &CreationContext<'_>,
        config: Config,
        storage: LocalStorage,
        runtime: Runtime,
        start_view: Option<String>,
    ) -> Self {
        info!("Initializing editor shell");

        let restored = ViewSwitcher::restore_active_view(&storage);
        let mut switcher = ViewSwitcher::new(ViewStore::open(storage));
        let changes = switcher.subscribe();

        let mut app = Self {
            switcher,
            changes,
            pipeline: ExportPipeline::from_settings(config.export.clone()),
            runtime,
            images: ImageCache::new(),
            presentation: Presentation::default(),
            path_dialog: PathDialog::new(),
            notice: None,
            confirm_clear: false,
            status_message: None,
            autosave_interval: Duration::from_secs(config.storage.autosave_interval_secs),
            last_autosave: Instant::now(),
            dirty_since: None,
        };

        match start_view {
            Some(id) => {
                if let Err(e) = app.switcher.navigate_to_id(&id) {
                    app.show_error("Vista desconocida", &e);
                    app.navigate(restored);
                }
            }
            None => app.navigate(restored),
        }
        app
    }

    fn set_status(&mut self, text: impl Into<String>, color: egui::Color32) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            color,
        });
    }

    fn show_error(&mut self, title: &str, error: &AppError) {
        if error.is_user_facing() {
            warn!(error = %error, "{title}");
        } else {
            error!(error = %error, "{title}");
        }
        self.notice = Some(Notice::new(title, error.to_string()));
    }

    fn navigate(&mut self, view: ViewName) {
        self.dirty_since = None;
        if let Err(e) = self.switcher.navigate_to(view) {
            self.show_error("No se pudo abrir la vista", &e);
        }
    }

    fn run(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Navigate(view) => self.navigate(view),
            ShellCommand::Save => self.path_dialog.open(PathPurpose::Save),
            ShellCommand::Load => self.path_dialog.open(PathPurpose::Load),
            ShellCommand::Export => self.export(),
            ShellCommand::NewSheet => self.confirm_clear = true,
            ShellCommand::TogglePresentation => {
                self.presentation = self.presentation.toggled();
                info!(presentation = ?self.presentation, "Toggled presentation");
            }
        }
    }

    fn export(&mut self) {
        self.dirty_since = None;
        let outcome = self
            .runtime
            .block_on(self.pipeline.export_all(&mut self.switcher));

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.show_error("No se pudo exportar", &e);
                return;
            }
        };

        match export::write_download(&outcome.bytes, &export::download_dir()) {
            Ok(path) => {
                if outcome.failures.is_empty() {
                    self.set_status(format!("PDF guardado en {}", path.display()), STATUS_OK);
                } else {
                    self.set_status(
                        format!("PDF incompleto guardado en {}", path.display()),
                        STATUS_ERROR,
                    );
                    let details: Vec<String> = outcome.failures.iter().map(|e| e.to_string()).collect();
                    self.notice = Some(Notice::new(
                        "Exportación incompleta",
                        format!(
                            "El PDF se generó, pero algunas vistas fallaron:\n{}",
                            details.join("\n")
                        ),
                    ));
                }
            }
            Err(e) => {
                error!(error = ?e, "Failed to write exported PDF");
                self.notice = Some(Notice::new("No se pudo guardar el PDF", format!("{e:#}")));
            }
        }
    }

    fn save(&mut self, path: &Path) {
        let document = Document::new(self.switcher.all_data());
        match document.save_to(path) {
            Ok(()) => self.set_status(format!("Ficha guardada en {}", path.display()), STATUS_OK),
            Err(e) => {
                error!(error = ?e, "Failed to save document");
                self.notice = Some(Notice::new("No se pudo guardar", format!("{e:#}")));
            }
        }
    }

    fn load(&mut self, path: &Path) {
        let document = match Document::load_from(path) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = ?e, "Rejected document");
                self.notice = Some(Notice::new("No se pudo cargar", format!("{e:#}")));
                return;
            }
        };

        self.dirty_since = None;
        self.images.clear();
        match self.switcher.replace_all(document.views) {
            Ok(()) => self.set_status(format!("Ficha cargada desde {}", path.display()), STATUS_OK),
            Err(e) => self.show_error("No se pudo mostrar la ficha", &e),
        }
    }

    fn clear_sheet(&mut self) {
        self.dirty_since = None;
        self.images.clear();
        match self.switcher.clear_all() {
            Ok(()) => self.set_status("Ficha vaciada", STATUS_INFO),
            Err(e) => self.show_error("No se pudo vaciar la ficha", &e),
        }
    }

    fn drain_view_changes(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            self.set_status(format!("Vista: {}", change.to.title()), STATUS_INFO);
        }
    }

    fn run_timers(&mut self) {
        if let Some(since) = self.dirty_since {
            if since.elapsed() >= Duration::from_millis(DIRTY_FLUSH_DELAY_MS) {
                self.switcher.flush_active();
                self.dirty_since = None;
            }
        }

        if self.last_autosave.elapsed() < self.autosave_interval {
            return;
        }
        self.last_autosave = Instant::now();
        self.switcher.flush_active();
        self.switcher.store().flush();
        self.dirty_since = None;
    }

    fn view_ui(&mut self, ui: &mut egui::Ui) {
        let changed = match self.switcher.live_view_mut() {
            Some(view) => egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| view.ui(ui, &mut self.images))
                .inner,
            None => {
                ui.label("Seleccione una vista.");
                false
            }
        };
        if changed && self.dirty_since.is_none() {
            self.dirty_since = Some(Instant::now());
        }
    }

    fn dialogs_ui(&mut self, ctx: &egui::Context) {
        if let Some(notice) = &self.notice {
            if notice_ui(ctx, notice) {
                self.notice = None;
            }
            return;
        }

        if self.confirm_clear {
            if let Some(answer) = confirm_ui(
                ctx,
                "Nueva ficha",
                "Se vaciarán las cuatro vistas y la copia guardada automáticamente.",
            ) {
                self.confirm_clear = false;
                if answer {
                    self.clear_sheet();
                }
            }
            return;
        }

        match self.path_dialog.ui(ctx) {
            PathAction::Confirmed(PathPurpose::Save, path) => self.save(&path),
            PathAction::Confirmed(PathPurpose::Load, path) => self.load(&path),
            PathAction::Cancelled | PathAction::None => {}
        }
    }

    fn modal_open(&self) -> bool {
        self.notice.is_some() || self.confirm_clear || self.path_dialog.is_open()
    }
}

impl eframe::App for FichaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.modal_open() {
            for command in hotkeys::poll(ctx) {
                self.run(command);
            }
        }
        self.drain_view_changes();
        self.run_timers();

        let enabled = !self.modal_open();
        let current = self.switcher.current_view();
        let mut clicked = None;

        match self.presentation {
            Presentation::Tabs => {
                egui::TopBottomPanel::top("nav").show(ctx, |ui| {
                    ui.add_space(PADDING / 2.0);
                    ui.add_enabled_ui(enabled, |ui| {
                        clicked = nav_ui(ui, current, self.presentation);
                    });
                    ui.add_space(PADDING / 2.0);
                });
            }
            Presentation::Sidebar => {
                egui::SidePanel::left("nav")
                    .exact_width(SIDEBAR_WIDTH)
                    .show(ctx, |ui| {
                        ui.add_enabled_ui(enabled, |ui| {
                            clicked = nav_ui(ui, current, self.presentation);
                        });
                    });
            }
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| match &self.status_message {
                Some(message) => {
                    ui.colored_label(message.color, &message.text);
                }
                None => {
                    ui.weak("Ctrl+1..4 vistas · Ctrl+S guardar · Ctrl+O cargar · Ctrl+P exportar · Esc barra lateral");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| self.view_ui(ui));
        });

        self.dialogs_ui(ctx);

        if let Some(command) = clicked {
            self.run(command);
        }

        ctx.request_repaint_after(Duration::from_millis(REPAINT_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.switcher.flush_active();
        self.switcher.store().flush();
        self.switcher.host_mut().detach();
        info!("Editor exiting");
    }
}

/// Open the editor window; returns when it is closed
pub fn run_gui(config: Config, storage: LocalStorage, start_view: Option<String>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title(config.export.document_title.clone()),
        ..Default::default()
    };

    let data_dir: PathBuf = storage.dir().to_path_buf();
    info!(data_dir = %data_dir.display(), "Launching editor");

    eframe::run_native(
        "Ficha Técnica",
        options,
        Box::new(|cc| Ok(Box::new(FichaApp::new(cc, config, storage, runtime, start_view)))),
    )
    .map_err(|err| anyhow!("Failed to launch editor window: {err}"))
}
