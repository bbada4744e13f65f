//! Reusable form sections shared by the four views
//!
//! Each section owns its slice of a view's form state and knows how to draw
//! itself, serialize into a data bag, read back from one, and describe itself
//! for the rasterizer.

use eframe::egui;
use std::path::PathBuf;
use tracing::warn;

use super::images::{self, ImageCache};
use super::layout::{Block, SheetLayout};
use crate::gui::constants::{ITEM_SPACING, PHOTO_MAX_HEIGHT, THUMBNAIL_MAX_HEIGHT};
use crate::model::{Cell, FieldValue, Item, Row, ViewData};

/// Key/label pair for a scalar field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub multiline: bool,
}

impl FieldSpec {
    pub const fn line(key: &'static str, label: &'static str) -> Self {
        Self { key, label, multiline: false }
    }

    pub const fn area(key: &'static str, label: &'static str) -> Self {
        Self { key, label, multiline: true }
    }
}

/// A group of text inputs
#[derive(Debug, Clone)]
pub struct TextFields {
    specs: &'static [FieldSpec],
    values: Vec<String>,
}

impl TextFields {
    pub fn new(specs: &'static [FieldSpec]) -> Self {
        Self {
            specs,
            values: vec![String::new(); specs.len()],
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|idx| self.values[idx].as_str())
    }

    #[cfg(test)]
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(idx) = self.position(key) {
            self.values[idx] = value.to_string();
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.key == key)
    }

    pub fn serialize_into(&self, data: &mut ViewData) {
        for (spec, value) in self.specs.iter().zip(&self.values) {
            data.set_text(spec.key, value);
        }
    }

    pub fn deserialize_from(&mut self, data: &ViewData) {
        for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
            if let Some(text) = data.text(spec.key) {
                *value = text.to_string();
            }
        }
    }

    /// Draw as a two-column grid, returns true if anything changed
    pub fn ui(&mut self, ui: &mut egui::Ui, id: &str) -> bool {
        let mut changed = false;
        egui::Grid::new(id)
            .num_columns(2)
            .spacing([ITEM_SPACING * 2.0, ITEM_SPACING])
            .show(ui, |ui| {
                for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
                    ui.label(format!("{}:", spec.label));
                    let response = if spec.multiline {
                        ui.add(egui::TextEdit::multiline(value).desired_rows(3))
                    } else {
                        ui.text_edit_singleline(value)
                    };
                    if response.changed() {
                        changed = true;
                    }
                    ui.end_row();
                }
            });
        changed
    }

    pub fn layout_into(&self, layout: &mut SheetLayout) {
        for (spec, value) in self.specs.iter().zip(&self.values) {
            layout.field(spec.label, value);
        }
    }
}

/// A group of checkboxes
#[derive(Debug, Clone)]
pub struct FlagFields {
    specs: &'static [FieldSpec],
    values: Vec<bool>,
}

impl FlagFields {
    pub fn new(specs: &'static [FieldSpec]) -> Self {
        Self {
            specs,
            values: vec![false; specs.len()],
        }
    }

    #[cfg(test)]
    pub fn set(&mut self, key: &str, value: bool) {
        if let Some(idx) = self.specs.iter().position(|spec| spec.key == key) {
            self.values[idx] = value;
        }
    }

    pub fn serialize_into(&self, data: &mut ViewData) {
        for (spec, value) in self.specs.iter().zip(&self.values) {
            data.set_flag(spec.key, *value);
        }
    }

    pub fn deserialize_from(&mut self, data: &ViewData) {
        for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
            if let Some(flag) = data.flag(spec.key) {
                *value = flag;
            }
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;
        ui.horizontal(|ui| {
            for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
                if ui.checkbox(value, spec.label).changed() {
                    changed = true;
                }
            }
        });
        changed
    }

    pub fn layout_into(&self, layout: &mut SheetLayout) {
        for (spec, value) in self.specs.iter().zip(&self.values) {
            layout.field(spec.label, &Cell::Flag(*value).display());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Flag,
    /// Computed from the other cells, read-only in the editor
    Derived,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn text(title: &'static str) -> Self {
        Self { title, kind: ColumnKind::Text }
    }

    pub const fn flag(title: &'static str) -> Self {
        Self { title, kind: ColumnKind::Flag }
    }

    pub const fn derived(title: &'static str) -> Self {
        Self { title, kind: ColumnKind::Derived }
    }

    fn empty_cell(&self) -> Cell {
        match self.kind {
            ColumnKind::Flag => Cell::Flag(false),
            ColumnKind::Text | ColumnKind::Derived => Cell::Text(String::new()),
        }
    }

    /// Coerce a stored cell to this column's kind
    fn coerce(&self, cell: Option<&Cell>) -> Cell {
        match (self.kind, cell) {
            (_, None) => self.empty_cell(),
            (ColumnKind::Flag, Some(Cell::Flag(flag))) => Cell::Flag(*flag),
            (ColumnKind::Flag, Some(Cell::Text(text))) => Cell::Flag(text == "true"),
            (_, Some(Cell::Text(text))) => Cell::Text(text.clone()),
            (_, Some(Cell::Flag(flag))) => Cell::Text(flag.to_string()),
        }
    }
}

/// Editable table with add/remove rows
#[derive(Debug, Clone)]
pub struct TableField {
    key: &'static str,
    title: &'static str,
    columns: &'static [Column],
    rows: Vec<Row>,
    derive: Option<fn(&mut Row)>,
}

impl TableField {
    pub fn new(key: &'static str, title: &'static str, columns: &'static [Column]) -> Self {
        Self {
            key,
            title,
            columns,
            rows: Vec::new(),
            derive: None,
        }
    }

    /// Recompute derived cells whenever a row is edited
    pub fn with_derive(mut self, derive: fn(&mut Row)) -> Self {
        self.derive = Some(derive);
        self
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn add_row(&mut self) {
        let row: Row = self.columns.iter().map(Column::empty_cell).collect();
        self.rows.push(row);
    }

    pub fn remove_row(&mut self, idx: usize) {
        if idx < self.rows.len() {
            self.rows.remove(idx);
        }
    }

    /// Set one cell, growing the table if needed
    #[cfg(test)]
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if col >= self.columns.len() {
            return;
        }
        while self.rows.len() <= row {
            self.add_row();
        }
        self.rows[row][col] = self.columns[col].coerce(Some(&cell));
        self.apply_derive(row);
    }

    fn apply_derive(&mut self, row: usize) {
        if let (Some(derive), Some(row)) = (self.derive, self.rows.get_mut(row)) {
            derive(row);
        }
    }

    pub fn serialize_into(&self, data: &mut ViewData) {
        data.insert(self.key, FieldValue::Rows(self.rows.clone()));
    }

    /// Positional read; short rows are padded, long rows truncated.
    /// Derived cells are recomputed, stored values for them are not trusted.
    pub fn deserialize_from(&mut self, data: &ViewData) {
        let Some(rows) = data.rows(self.key) else {
            return;
        };
        self.rows = rows
            .iter()
            .map(|stored| {
                if stored.len() != self.columns.len() {
                    warn!(
                        table = self.key,
                        expected = self.columns.len(),
                        found = stored.len(),
                        "Row arity mismatch, padding/truncating"
                    );
                }
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| column.coerce(stored.get(idx)))
                    .collect()
            })
            .collect();
        for row in 0..self.rows.len() {
            self.apply_derive(row);
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;
        let mut to_delete = None;
        let mut edited = Vec::new();

        ui.label(egui::RichText::new(self.title).strong());
        ui.add_space(ITEM_SPACING / 2.0);

        egui::Grid::new(("table", self.key))
            .striped(true)
            .show(ui, |ui| {
                for column in self.columns {
                    ui.label(egui::RichText::new(column.title).small().strong());
                }
                ui.label("");
                ui.end_row();

                for (row_idx, row) in self.rows.iter_mut().enumerate() {
                    for (column, cell) in self.columns.iter().zip(row.iter_mut()) {
                        let cell_changed = match (column.kind, cell) {
                            (ColumnKind::Flag, Cell::Flag(flag)) => ui.checkbox(flag, "").changed(),
                            (ColumnKind::Derived, cell) => {
                                ui.label(cell.display());
                                false
                            }
                            (_, Cell::Text(text)) => ui
                                .add(egui::TextEdit::singleline(text).desired_width(90.0))
                                .changed(),
                            (_, Cell::Flag(flag)) => ui.checkbox(flag, "").changed(),
                        };
                        if cell_changed {
                            edited.push(row_idx);
                            changed = true;
                        }
                    }
                    if ui.small_button("🗑").on_hover_text("Quitar fila").clicked() {
                        to_delete = Some(row_idx);
                        changed = true;
                    }
                    ui.end_row();
                }
            });

        for row_idx in edited {
            self.apply_derive(row_idx);
        }
        if let Some(idx) = to_delete {
            self.remove_row(idx);
        }

        if ui.button("➕ Agregar fila").clicked() {
            self.add_row();
            changed = true;
        }

        changed
    }

    pub fn layout_into(&self, layout: &mut SheetLayout, export_mode: bool) {
        layout.push(Block::Table {
            title: self.title.to_string(),
            columns: self.columns.iter().map(|c| c.title.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(Cell::display).collect())
                .collect(),
        });
        layout.controls(export_mode, &["➕ Agregar fila"]);
    }
}

/// Single picture slot with a path-based upload
#[derive(Debug, Clone)]
pub struct PhotoField {
    key: &'static str,
    label: &'static str,
    uri: String,
    path_input: String,
    error: Option<String>,
}

impl PhotoField {
    pub fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            uri: String::new(),
            path_input: String::new(),
            error: None,
        }
    }

    #[cfg(test)]
    pub fn set_uri(&mut self, uri: &str) {
        self.uri = uri.to_string();
    }

    pub fn serialize_into(&self, data: &mut ViewData) {
        data.set_text(self.key, &self.uri);
    }

    pub fn deserialize_from(&mut self, data: &ViewData) {
        if let Some(uri) = data.text(self.key) {
            self.uri = uri.to_string();
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, images: &mut ImageCache) -> bool {
        let mut changed = false;
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(self.label).strong());
            images.show(ui, &self.uri, PHOTO_MAX_HEIGHT);
            if let Some(uri) = upload_row(ui, &mut self.path_input, &mut self.error) {
                self.uri = uri;
                changed = true;
            }
            if !self.uri.is_empty() && ui.small_button("Quitar foto").clicked() {
                self.uri.clear();
                changed = true;
            }
        });
        changed
    }

    pub fn layout_into(&self, layout: &mut SheetLayout, export_mode: bool) {
        layout.push(Block::Image {
            caption: self.label.to_string(),
            source: self.uri.clone(),
        });
        layout.controls(export_mode, &["📂 Cargar foto"]);
    }
}

#[derive(Debug, Clone, Default)]
struct GalleryEntry {
    image: String,
    description: String,
    path_input: String,
    error: Option<String>,
}

/// List of picture + description items
#[derive(Debug, Clone)]
pub struct Gallery {
    key: &'static str,
    title: &'static str,
    /// Item key holding the picture ("imagen" or "foto")
    image_key: &'static str,
    entries: Vec<GalleryEntry>,
}

const DESCRIPTION_KEY: &str = "descripcion";

impl Gallery {
    pub fn new(key: &'static str, title: &'static str, image_key: &'static str) -> Self {
        Self {
            key,
            title,
            image_key,
            entries: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn push(&mut self, image: &str, description: &str) {
        self.entries.push(GalleryEntry {
            image: image.to_string(),
            description: description.to_string(),
            ..Default::default()
        });
    }

    pub fn serialize_into(&self, data: &mut ViewData) {
        let items = self
            .entries
            .iter()
            .map(|entry| {
                let mut item = Item::new();
                item.insert(self.image_key.to_string(), entry.image.clone());
                item.insert(DESCRIPTION_KEY.to_string(), entry.description.clone());
                item
            })
            .collect();
        data.insert(self.key, FieldValue::Items(items));
    }

    pub fn deserialize_from(&mut self, data: &ViewData) {
        let Some(items) = data.items(self.key) else {
            return;
        };
        self.entries = items
            .iter()
            .map(|item| GalleryEntry {
                image: item.get(self.image_key).cloned().unwrap_or_default(),
                description: item.get(DESCRIPTION_KEY).cloned().unwrap_or_default(),
                ..Default::default()
            })
            .collect();
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, images: &mut ImageCache) -> bool {
        let mut changed = false;
        let mut to_delete = None;

        ui.label(egui::RichText::new(self.title).strong());
        ui.add_space(ITEM_SPACING / 2.0);

        for (idx, entry) in self.entries.iter_mut().enumerate() {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    images.show(ui, &entry.image, THUMBNAIL_MAX_HEIGHT);
                    ui.vertical(|ui| {
                        ui.label("Descripción:");
                        if ui.text_edit_singleline(&mut entry.description).changed() {
                            changed = true;
                        }
                        if let Some(uri) = upload_row(ui, &mut entry.path_input, &mut entry.error) {
                            entry.image = uri;
                            changed = true;
                        }
                        if ui.small_button("🗑 Quitar muestra").clicked() {
                            to_delete = Some(idx);
                            changed = true;
                        }
                    });
                });
            });
        }

        if let Some(idx) = to_delete {
            self.entries.remove(idx);
        }

        if ui.button("➕ Agregar muestra").clicked() {
            self.entries.push(GalleryEntry::default());
            changed = true;
        }

        changed
    }

    pub fn layout_into(&self, layout: &mut SheetLayout, export_mode: bool) {
        layout.heading(self.title);
        for entry in &self.entries {
            layout.push(Block::Image {
                caption: entry.description.clone(),
                source: entry.image.clone(),
            });
        }
        layout.controls(export_mode, &["➕ Agregar muestra"]);
    }
}

/// Path input + load button; returns the new data URI when a picture was loaded.
/// Pictures never go back into this input; they only live as data URIs.
fn upload_row(ui: &mut egui::Ui, path_input: &mut String, error: &mut Option<String>) -> Option<String> {
    let mut loaded = None;
    ui.horizontal(|ui| {
        ui.add(
            egui::TextEdit::singleline(path_input)
                .hint_text("/ruta/a/foto.png")
                .desired_width(200.0),
        );
        if ui.button("📂 Cargar").clicked() && !path_input.trim().is_empty() {
            match images::load_file_as_data_uri(&PathBuf::from(path_input.trim())) {
                Ok(uri) => {
                    *error = None;
                    path_input.clear();
                    loaded = Some(uri);
                }
                Err(e) => {
                    warn!(error = ?e, "Failed to load picture");
                    *error = Some(format!("{e:#}"));
                }
            }
        }
    });
    if let Some(message) = error {
        ui.colored_label(egui::Color32::from_rgb(200, 0, 0), message.as_str());
    }
    loaded
}

/// Parse "1.234,5" / "12,50" / "12.5" style numbers
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[Column::text("Pieza"), Column::text("Cantidad"), Column::flag("Forrada")];

    #[test]
    fn test_table_pads_short_rows_and_truncates_long_rows() {
        let mut data = ViewData::new();
        data.insert(
            "piezas",
            FieldValue::Rows(vec![
                vec![Cell::Text("Delantero".into())],
                vec![
                    Cell::Text("Espalda".into()),
                    Cell::Text("1".into()),
                    Cell::Flag(true),
                    Cell::Text("extra".into()),
                ],
            ]),
        );

        let mut table = TableField::new("piezas", "Piezas", COLUMNS);
        table.deserialize_from(&data);

        assert_eq!(
            table.rows()[0],
            vec![Cell::Text("Delantero".into()), Cell::Text(String::new()), Cell::Flag(false)]
        );
        assert_eq!(table.rows()[1].len(), 3);
        assert_eq!(table.rows()[1][2], Cell::Flag(true));
    }

    #[test]
    fn test_table_coerces_cells_to_column_kind() {
        let mut data = ViewData::new();
        data.insert(
            "piezas",
            FieldValue::Rows(vec![vec![Cell::Flag(true), Cell::Text("2".into()), Cell::Text("true".into())]]),
        );
        let mut table = TableField::new("piezas", "Piezas", COLUMNS);
        table.deserialize_from(&data);
        assert_eq!(
            table.rows()[0],
            vec![Cell::Text("true".into()), Cell::Text("2".into()), Cell::Flag(true)]
        );
    }

    #[test]
    fn test_table_recomputes_derived_cells_on_load() {
        const SUMMED: &[Column] = &[Column::text("A"), Column::text("B"), Column::derived("Suma")];
        fn sum(row: &mut Row) {
            let total: i64 = row[..2]
                .iter()
                .filter_map(|cell| match cell {
                    Cell::Text(text) => text.parse::<i64>().ok(),
                    Cell::Flag(_) => None,
                })
                .sum();
            row[2] = Cell::Text(total.to_string());
        }

        let mut data = ViewData::new();
        data.insert(
            "sumas",
            FieldValue::Rows(vec![
                vec![Cell::Text("2".into()), Cell::Text("3".into()), Cell::Text("999".into())],
                vec![Cell::Text("4".into())],
            ]),
        );
        let mut table = TableField::new("sumas", "Sumas", SUMMED).with_derive(sum);
        table.deserialize_from(&data);

        assert_eq!(table.rows()[0][2], Cell::Text("5".into()));
        assert_eq!(table.rows()[1][2], Cell::Text("4".into()));
    }

    #[test]
    fn test_table_missing_key_keeps_default() {
        let mut table = TableField::new("piezas", "Piezas", COLUMNS);
        table.add_row();
        table.deserialize_from(&ViewData::new());
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_gallery_round_trip_with_custom_image_key() {
        let mut gallery = Gallery::new("muestraMateriales", "Muestras", "foto");
        gallery.push("data:image/png;base64,AAAA", "botón");

        let mut data = ViewData::new();
        gallery.serialize_into(&mut data);
        let item = &data.items("muestraMateriales").unwrap()[0];
        assert_eq!(item["foto"], "data:image/png;base64,AAAA");
        assert_eq!(item["descripcion"], "botón");

        let mut fresh = Gallery::new("muestraMateriales", "Muestras", "foto");
        fresh.deserialize_from(&data);
        let mut again = ViewData::new();
        fresh.serialize_into(&mut again);
        assert_eq!(again, data);
    }

    #[test]
    fn test_text_fields_ignore_wrong_types() {
        const SPECS: &[FieldSpec] = &[FieldSpec::line("articulo", "Artículo")];
        let mut fields = TextFields::new(SPECS);
        fields.set("articulo", "A-1");

        let mut data = ViewData::new();
        data.set_flag("articulo", true);
        fields.deserialize_from(&data);

        assert_eq!(fields.get("articulo"), Some("A-1"));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal("1.234,50"), Some(1234.5));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }
}
