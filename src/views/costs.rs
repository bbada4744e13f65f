//! vista2: trims, cost breakdown and front/back photos

use eframe::egui;

use super::fields::{parse_decimal, Column, FieldSpec, PhotoField, TableField, TextFields};
use super::host::ViewHost;
use super::images::ImageCache;
use super::layout::SheetLayout;
use super::View;
use crate::error::Result;
use crate::gui::constants::SECTION_SPACING;
use crate::model::{Cell, Row, ViewData, ViewName};

const TEXT_FIELDS: &[FieldSpec] = &[
    FieldSpec::line("taller", "Taller"),
    FieldSpec::line("moneda", "Moneda"),
    FieldSpec::line("precioVenta", "Precio de venta"),
    FieldSpec::line("margen", "Margen"),
];

const TRIM_COLUMNS: &[Column] = &[
    Column::text("Avío"),
    Column::text("Descripción"),
    Column::text("Cantidad"),
    Column::text("Ubicación"),
];

const COST_COLUMNS: &[Column] = &[
    Column::text("Concepto"),
    Column::text("Cantidad"),
    Column::text("Precio unitario"),
    Column::derived("Subtotal"),
];

const QUANTITY: usize = 1;
const UNIT_PRICE: usize = 2;
const SUBTOTAL: usize = 3;

/// Subtotal = quantity × unit price, blank when either is not a number
fn derive_subtotal(row: &mut Row) {
    let number = |idx: usize| match row.get(idx) {
        Some(Cell::Text(text)) => parse_decimal(text),
        _ => None,
    };
    let subtotal = match (number(QUANTITY), number(UNIT_PRICE)) {
        (Some(qty), Some(price)) => format!("{:.2}", qty * price),
        _ => String::new(),
    };
    if let Some(cell) = row.get_mut(SUBTOTAL) {
        *cell = Cell::Text(subtotal);
    }
}

/// Sum of all parseable subtotals
fn cost_total(rows: &[Row]) -> f64 {
    rows.iter()
        .filter_map(|row| match row.get(SUBTOTAL) {
            Some(Cell::Text(text)) => parse_decimal(text),
            _ => None,
        })
        .sum()
}

#[derive(Debug, Clone)]
struct CostsForm {
    fields: TextFields,
    trims: TableField,
    costs: TableField,
    photo_left: PhotoField,
    photo_right: PhotoField,
}

impl Default for CostsForm {
    fn default() -> Self {
        Self {
            fields: TextFields::new(TEXT_FIELDS),
            trims: TableField::new("avios", "Avíos", TRIM_COLUMNS),
            costs: TableField::new("costos", "Costos", COST_COLUMNS).with_derive(derive_subtotal),
            photo_left: PhotoField::new("fotoIzquierda", "Frente"),
            photo_right: PhotoField::new("fotoDerecha", "Espalda"),
        }
    }
}

pub struct CostsView {
    form: CostsForm,
    mounted: bool,
}

impl CostsView {
    pub fn new() -> Self {
        Self {
            form: CostsForm::default(),
            mounted: false,
        }
    }

    fn total_label(&self) -> String {
        let currency = self.form.fields.get("moneda").unwrap_or_default();
        format!("{currency} {:.2}", cost_total(self.form.costs.rows()))
            .trim()
            .to_string()
    }
}

impl View for CostsView {
    fn name(&self) -> ViewName {
        ViewName::Vista2
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn render(&mut self, host: &mut ViewHost) -> Result<()> {
        host.mount(self.name())?;
        self.form = CostsForm::default();
        self.mounted = true;
        Ok(())
    }

    fn serialize(&self) -> ViewData {
        let mut data = ViewData::new();
        self.form.fields.serialize_into(&mut data);
        self.form.trims.serialize_into(&mut data);
        self.form.costs.serialize_into(&mut data);
        self.form.photo_left.serialize_into(&mut data);
        self.form.photo_right.serialize_into(&mut data);
        data
    }

    fn deserialize(&mut self, data: &ViewData) {
        self.form.fields.deserialize_from(data);
        self.form.trims.deserialize_from(data);
        self.form.costs.deserialize_from(data);
        self.form.photo_left.deserialize_from(data);
        self.form.photo_right.deserialize_from(data);
    }

    fn teardown(&mut self, host: &mut ViewHost) {
        self.mounted = false;
        host.release(self.name());
    }

    fn ui(&mut self, ui: &mut egui::Ui, images: &mut ImageCache) -> bool {
        if !self.mounted {
            return false;
        }
        let mut changed = false;

        ui.group(|ui| {
            changed |= self.form.fields.ui(ui, "costs_fields");
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.trims.ui(ui);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.costs.ui(ui);
            ui.label(egui::RichText::new(format!("Total: {}", self.total_label())).strong());
        });
        ui.add_space(SECTION_SPACING);
        ui.horizontal(|ui| {
            changed |= self.form.photo_left.ui(ui, images);
            changed |= self.form.photo_right.ui(ui, images);
        });

        changed
    }

    fn layout(&self, export_mode: bool) -> SheetLayout {
        let mut layout = SheetLayout::new(self.name().title());
        self.form.fields.layout_into(&mut layout);
        self.form.trims.layout_into(&mut layout, export_mode);
        self.form.costs.layout_into(&mut layout, export_mode);
        layout.field("Total", &self.total_label());
        self.form.photo_left.layout_into(&mut layout, export_mode);
        self.form.photo_right.layout_into(&mut layout, export_mode);
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;
    use crate::views::layout::Block;

    #[test]
    fn test_subtotal_is_derived_from_quantity_and_price() {
        let mut table = TableField::new("costos", "Costos", COST_COLUMNS).with_derive(derive_subtotal);
        table.set_cell(0, 0, Cell::Text("Tela".into()));
        table.set_cell(0, 1, Cell::Text("2".into()));
        table.set_cell(0, 2, Cell::Text("3,25".into()));
        assert_eq!(table.rows()[0][SUBTOTAL], Cell::Text("6.50".into()));

        table.set_cell(0, 2, Cell::Text("a convenir".into()));
        assert_eq!(table.rows()[0][SUBTOTAL], Cell::Text(String::new()));
    }

    #[test]
    fn test_stale_subtotals_are_recomputed_on_load() {
        let mut data = ViewData::new();
        data.insert(
            "costos",
            FieldValue::Rows(vec![vec![
                Cell::Text("Tela".into()),
                Cell::Text("2".into()),
                Cell::Text("10".into()),
                Cell::Text("1.00".into()),
            ]]),
        );
        let mut host = ViewHost::new();
        let mut view = CostsView::new();
        view.render(&mut host).unwrap();
        view.deserialize(&data);

        assert_eq!(view.form.costs.rows()[0][SUBTOTAL], Cell::Text("20.00".into()));
        assert!(view.total_label().ends_with("20.00"));
    }

    #[test]
    fn test_total_sums_subtotals() {
        let mut view = CostsView::new();
        let mut host = ViewHost::new();
        view.render(&mut host).unwrap();
        view.form.fields.set("moneda", "ARS");
        view.form.costs.set_cell(0, 1, Cell::Text("2".into()));
        view.form.costs.set_cell(0, 2, Cell::Text("10".into()));
        view.form.costs.set_cell(1, 1, Cell::Text("1".into()));
        view.form.costs.set_cell(1, 2, Cell::Text("5.5".into()));

        assert_eq!(view.total_label(), "ARS 25.50");
    }

    #[test]
    fn test_round_trip_through_fresh_instance() {
        let mut host = ViewHost::new();
        let mut view = CostsView::new();
        view.render(&mut host).unwrap();
        view.form.fields.set("taller", "Confecciones Norte");
        view.form.trims.set_cell(0, 0, Cell::Text("Cierre".into()));
        view.form.costs.set_cell(0, 1, Cell::Text("3".into()));
        view.form.costs.set_cell(0, 2, Cell::Text("4".into()));
        view.form.photo_left.set_uri("data:image/png;base64,AAAA");
        let original = view.serialize();

        let mut fresh = CostsView::new();
        fresh.render(&mut host).unwrap();
        fresh.deserialize(&original);
        assert_eq!(fresh.serialize(), original);
        assert_eq!(original.text("fotoIzquierda"), Some("data:image/png;base64,AAAA"));
        assert_eq!(original.text("fotoDerecha"), Some(""));
    }

    #[test]
    fn test_layout_hides_controls_in_export_mode() {
        let mut host = ViewHost::new();
        let mut view = CostsView::new();
        view.render(&mut host).unwrap();

        assert!(view.layout(false).has_controls());
        let exported = view.layout(true);
        assert!(!exported.has_controls());
        assert!(exported.blocks.iter().any(|b| matches!(b, Block::Image { caption, .. } if caption == "Frente")));
    }
}
