//! vista3: cutting-room data, pieces list and the size/color consumption grid

use eframe::egui;

use super::fields::{Column, FieldSpec, TableField, TextFields};
use super::host::ViewHost;
use super::images::ImageCache;
use super::layout::SheetLayout;
use super::View;
use crate::error::Result;
use crate::gui::constants::{ITEM_SPACING, SECTION_SPACING};
use crate::model::{Cell, Row, ViewData, ViewName};

const TEXT_FIELDS: &[FieldSpec] = &[
    FieldSpec::line("tizada", "Tizada"),
    FieldSpec::line("largoTizada", "Largo de tizada"),
    FieldSpec::line("anchoTela", "Ancho de tela"),
    FieldSpec::line("capas", "Capas"),
    FieldSpec::line("fechaCorte", "Fecha de corte"),
    FieldSpec::line("cortador", "Cortador"),
];

const PIECE_COLUMNS: &[Column] = &[
    Column::text("Pieza"),
    Column::text("Cantidad"),
    Column::text("Tela"),
    Column::flag("Forrada"),
];

/// Sizes sit between the color column and the total
const CONSUMPTION_COLUMNS: &[Column] = &[
    Column::text("Color"),
    Column::text("S"),
    Column::text("M"),
    Column::text("L"),
    Column::text("XL"),
    Column::derived("Total"),
];

const COLOR_KEY: &str = "colorReferencia";
const DEFAULT_COLOR: &str = "#1F3A93";

/// Total = sum of the size cells that parse as whole numbers
fn derive_row_total(row: &mut Row) {
    let last = CONSUMPTION_COLUMNS.len() - 1;
    let total: i64 = row
        .iter()
        .take(last)
        .skip(1)
        .filter_map(|cell| match cell {
            Cell::Text(text) => text.trim().parse::<i64>().ok(),
            Cell::Flag(_) => None,
        })
        .sum();
    if let Some(cell) = row.get_mut(last) {
        *cell = Cell::Text(total.to_string());
    }
}

/// Parse `#RRGGBB` (or `#AARRGGBB`) into an egui color
fn parse_hex_color(hex: &str) -> Option<egui::Color32> {
    let hex = hex.trim().trim_start_matches('#');
    let byte = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some(egui::Color32::from_rgb(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
        8 => Some(egui::Color32::from_rgba_unmultiplied(
            byte(2..4)?,
            byte(4..6)?,
            byte(6..8)?,
            byte(0..2)?,
        )),
        _ => None,
    }
}

fn format_hex_color(color: egui::Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

#[derive(Debug, Clone)]
struct CuttingForm {
    fields: TextFields,
    reference_color: String,
    pieces: TableField,
    consumption: TableField,
}

impl Default for CuttingForm {
    fn default() -> Self {
        Self {
            fields: TextFields::new(TEXT_FIELDS),
            reference_color: DEFAULT_COLOR.to_string(),
            pieces: TableField::new("piezas", "Piezas", PIECE_COLUMNS),
            consumption: TableField::new("consumo", "Consumo por talle y color", CONSUMPTION_COLUMNS)
                .with_derive(derive_row_total),
        }
    }
}

pub struct CuttingView {
    form: CuttingForm,
    mounted: bool,
    palette_open: bool,
    /// Palette state saved by `before_capture`
    palette_was_open: Option<bool>,
}

impl CuttingView {
    pub fn new() -> Self {
        Self {
            form: CuttingForm::default(),
            mounted: false,
            palette_open: false,
            palette_was_open: None,
        }
    }

    fn palette_ui(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;
        ui.horizontal(|ui| {
            ui.label("Color de referencia:");
            if ui.text_edit_singleline(&mut self.form.reference_color).changed() {
                changed = true;
            }
            let toggle = if self.palette_open { "Cerrar paleta" } else { "🎨 Paleta" };
            if ui.button(toggle).clicked() {
                self.palette_open = !self.palette_open;
            }
        });

        if self.palette_open {
            let mut color = parse_hex_color(&self.form.reference_color)
                .unwrap_or(egui::Color32::from_rgb(0x1F, 0x3A, 0x93));
            ui.add_space(ITEM_SPACING / 2.0);
            if egui::color_picker::color_picker_color32(ui, &mut color, egui::color_picker::Alpha::Opaque) {
                self.form.reference_color = format_hex_color(color);
                changed = true;
            }
        }
        changed
    }
}

impl View for CuttingView {
    fn name(&self) -> ViewName {
        ViewName::Vista3
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn render(&mut self, host: &mut ViewHost) -> Result<()> {
        host.mount(self.name())?;
        self.form = CuttingForm::default();
        self.palette_open = false;
        self.mounted = true;
        Ok(())
    }

    fn serialize(&self) -> ViewData {
        let mut data = ViewData::new();
        self.form.fields.serialize_into(&mut data);
        data.set_text(COLOR_KEY, &self.form.reference_color);
        self.form.pieces.serialize_into(&mut data);
        self.form.consumption.serialize_into(&mut data);
        data
    }

    fn deserialize(&mut self, data: &ViewData) {
        self.form.fields.deserialize_from(data);
        if let Some(color) = data.text(COLOR_KEY) {
            self.form.reference_color = color.to_string();
        }
        self.form.pieces.deserialize_from(data);
        self.form.consumption.deserialize_from(data);
    }

    fn teardown(&mut self, host: &mut ViewHost) {
        self.mounted = false;
        self.palette_open = false;
        host.release(self.name());
    }

    fn ui(&mut self, ui: &mut egui::Ui, _images: &mut ImageCache) -> bool {
        if !self.mounted {
            return false;
        }
        let mut changed = false;

        ui.group(|ui| {
            changed |= self.form.fields.ui(ui, "cutting_fields");
            changed |= self.palette_ui(ui);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.pieces.ui(ui);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.consumption.ui(ui);
        });

        changed
    }

    fn layout(&self, export_mode: bool) -> SheetLayout {
        let mut layout = SheetLayout::new(self.name().title());
        self.form.fields.layout_into(&mut layout);
        layout.field("Color de referencia", &self.form.reference_color);
        if self.palette_open {
            layout.controls(export_mode, &["Paleta de colores"]);
        }
        self.form.pieces.layout_into(&mut layout, export_mode);
        self.form.consumption.layout_into(&mut layout, export_mode);
        layout
    }

    fn before_capture(&mut self) {
        self.palette_was_open = Some(self.palette_open);
        self.palette_open = false;
    }

    fn after_capture(&mut self) {
        if let Some(was_open) = self.palette_was_open.take() {
            self.palette_open = was_open;
        }
    }
}
