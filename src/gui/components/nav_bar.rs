use eframe::egui;

use crate::gui::constants::*;
use crate::hotkeys::ShellCommand;
use crate::model::ViewName;

/// How the view buttons are arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    /// Horizontal tab bar above the view
    #[default]
    Tabs,
    /// Classic vertical sidebar
    Sidebar,
}

impl Presentation {
    pub fn toggled(self) -> Self {
        match self {
            Presentation::Tabs => Presentation::Sidebar,
            Presentation::Sidebar => Presentation::Tabs,
        }
    }
}

/// View buttons plus the document actions; returns what was clicked
pub fn nav_ui(ui: &mut egui::Ui, current: Option<ViewName>, presentation: Presentation) -> Option<ShellCommand> {
    let mut command = None;

    match presentation {
        Presentation::Tabs => {
            ui.horizontal(|ui| {
                if let Some(action) = view_buttons(ui, current) {
                    command = Some(action);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(action) = document_buttons(ui) {
                        command = Some(action);
                    }
                });
            });
        }
        Presentation::Sidebar => {
            ui.add_space(PADDING);
            ui.label(egui::RichText::new("Vistas").strong());
            ui.add_space(ITEM_SPACING);
            ui.vertical(|ui| {
                if let Some(action) = view_buttons(ui, current) {
                    command = Some(action);
                }
            });
            ui.add_space(SECTION_SPACING);
            ui.separator();
            ui.vertical(|ui| {
                if let Some(action) = document_buttons(ui) {
                    command = Some(action);
                }
            });
        }
    }

    command
}

fn view_buttons(ui: &mut egui::Ui, current: Option<ViewName>) -> Option<ShellCommand> {
    let mut command = None;
    for view in ViewName::ALL {
        let label = format!("{}. {}", view.index() + 1, view.title());
        if ui
            .selectable_label(current == Some(view), label)
            .on_hover_text(format!("Ctrl+{}", view.index() + 1))
            .clicked()
        {
            command = Some(ShellCommand::Navigate(view));
        }
    }
    command
}

fn document_buttons(ui: &mut egui::Ui) -> Option<ShellCommand> {
    let mut command = None;
    if ui.button("📄 Exportar PDF").on_hover_text("Ctrl+P").clicked() {
        command = Some(ShellCommand::Export);
    }
    if ui.button("📂 Cargar").on_hover_text("Ctrl+O").clicked() {
        command = Some(ShellCommand::Load);
    }
    if ui.button("💾 Guardar").on_hover_text("Ctrl+S").clicked() {
        command = Some(ShellCommand::Save);
    }
    if ui.button("🗑 Nueva ficha").clicked() {
        command = Some(ShellCommand::NewSheet);
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trips() {
        assert_eq!(Presentation::Tabs.toggled(), Presentation::Sidebar);
        assert_eq!(Presentation::Tabs.toggled().toggled(), Presentation::Tabs);
    }
}
