use chrono::Local;
use eframe::egui;
use std::path::PathBuf;

use crate::constants::document::FILE_STEM;
use crate::gui::constants::*;

/// What the path dialog was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPurpose {
    Save,
    Load,
}

pub enum PathAction {
    None,
    Confirmed(PathPurpose, PathBuf),
    Cancelled,
}

/// Path prompt for saving and loading documents
pub struct PathDialog {
    purpose: Option<PathPurpose>,
    path: String,
}

impl PathDialog {
    pub fn new() -> Self {
        Self {
            purpose: None,
            path: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.purpose.is_some()
    }

    pub fn open(&mut self, purpose: PathPurpose) {
        self.path = default_path(purpose).display().to_string();
        self.purpose = Some(purpose);
    }

    pub fn ui(&mut self, ctx: &egui::Context) -> PathAction {
        let Some(purpose) = self.purpose else {
            return PathAction::None;
        };
        let (title, confirm) = match purpose {
            PathPurpose::Save => ("Guardar ficha", "Guardar"),
            PathPurpose::Load => ("Cargar ficha", "Cargar"),
        };

        let mut action = PathAction::None;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .default_width(DIALOG_WIDTH)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Ruta del archivo:");
                let response = ui.add(egui::TextEdit::singleline(&mut self.path).desired_width(DIALOG_WIDTH));
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if (ui.button(confirm).clicked() || submitted) && !self.path.trim().is_empty() {
                        action = PathAction::Confirmed(purpose, PathBuf::from(self.path.trim()));
                    }
                    if ui.button("Cancelar").clicked() {
                        action = PathAction::Cancelled;
                    }
                });
            });

        if !matches!(action, PathAction::None) {
            self.purpose = None;
        }
        action
    }
}

/// Save proposes a dated file in the documents folder; load proposes the folder
fn default_path(purpose: PathPurpose) -> PathBuf {
    let dir = dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    match purpose {
        PathPurpose::Save => dir.join(format!(
            "{FILE_STEM}_{}.json",
            Local::now().format("%Y-%m-%d")
        )),
        PathPurpose::Load => dir,
    }
}

/// A message the user has to acknowledge before going on
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Draw `notice` centered; returns true once dismissed
pub fn notice_ui(ctx: &egui::Context, notice: &Notice) -> bool {
    let mut dismissed = false;
    egui::Window::new(&notice.title)
        .collapsible(false)
        .resizable(false)
        .default_width(DIALOG_WIDTH)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(&notice.text);
            ui.add_space(ITEM_SPACING);
            if ui.button("Aceptar").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                dismissed = true;
            }
        });
    dismissed
}

/// Yes/no question; `Some(answer)` once the user picks one
pub fn confirm_ui(ctx: &egui::Context, title: &str, text: &str) -> Option<bool> {
    let mut answer = None;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(DIALOG_WIDTH)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(text);
            ui.add_space(ITEM_SPACING);
            ui.horizontal(|ui| {
                if ui.button("Sí, vaciar").clicked() {
                    answer = Some(true);
                }
                if ui.button("Cancelar").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    answer = Some(false);
                }
            });
        });
    answer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_path_is_dated_json() {
        let path = default_path(PathPurpose::Save);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ficha_tecnica_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_open_prefills_path() {
        let mut dialog = PathDialog::new();
        assert!(!dialog.is_open());
        dialog.open(PathPurpose::Load);
        assert!(dialog.is_open());
        assert_eq!(dialog.path, default_path(PathPurpose::Load).display().to_string());
    }
}
