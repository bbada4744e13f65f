//! vista1: article identification, materials table and material samples

use eframe::egui;

use super::fields::{Column, FieldSpec, FlagFields, Gallery, TableField, TextFields};
use super::host::ViewHost;
use super::images::ImageCache;
use super::layout::SheetLayout;
use super::View;
use crate::error::Result;
use crate::gui::constants::SECTION_SPACING;
use crate::model::{ViewData, ViewName};

const TEXT_FIELDS: &[FieldSpec] = &[
    FieldSpec::line("articulo", "Artículo"),
    FieldSpec::line("descripcion", "Descripción"),
    FieldSpec::line("cliente", "Cliente"),
    FieldSpec::line("temporada", "Temporada"),
    FieldSpec::line("fecha", "Fecha"),
    FieldSpec::line("disenador", "Diseñador"),
    FieldSpec::line("linea", "Línea"),
    FieldSpec::line("talles", "Talles"),
    FieldSpec::area("observaciones", "Observaciones"),
];

const FLAG_FIELDS: &[FieldSpec] = &[
    FieldSpec::line("aprobado", "Aprobado"),
    FieldSpec::line("urgente", "Urgente"),
];

const MATERIAL_COLUMNS: &[Column] = &[
    Column::text("Material"),
    Column::text("Proveedor"),
    Column::text("Color"),
    Column::text("Composición"),
    Column::text("Ancho"),
];

#[derive(Debug, Clone)]
struct GeneralForm {
    fields: TextFields,
    flags: FlagFields,
    materials: TableField,
    samples: Gallery,
}

impl Default for GeneralForm {
    fn default() -> Self {
        Self {
            fields: TextFields::new(TEXT_FIELDS),
            flags: FlagFields::new(FLAG_FIELDS),
            materials: TableField::new("materiales", "Materiales", MATERIAL_COLUMNS),
            samples: Gallery::new("muestraMateriales", "Muestras de materiales", "imagen"),
        }
    }
}

pub struct GeneralView {
    form: GeneralForm,
    mounted: bool,
}

impl GeneralView {
    pub fn new() -> Self {
        Self {
            form: GeneralForm::default(),
            mounted: false,
        }
    }
}

impl View for GeneralView {
    fn name(&self) -> ViewName {
        ViewName::Vista1
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn render(&mut self, host: &mut ViewHost) -> Result<()> {
        host.mount(self.name())?;
        self.form = GeneralForm::default();
        self.mounted = true;
        Ok(())
    }

    fn serialize(&self) -> ViewData {
        let mut data = ViewData::new();
        self.form.fields.serialize_into(&mut data);
        self.form.flags.serialize_into(&mut data);
        self.form.materials.serialize_into(&mut data);
        self.form.samples.serialize_into(&mut data);
        data
    }

    fn deserialize(&mut self, data: &ViewData) {
        self.form.fields.deserialize_from(data);
        self.form.flags.deserialize_from(data);
        self.form.materials.deserialize_from(data);
        self.form.samples.deserialize_from(data);
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
            changed |= self.form.fields.ui(ui, "general_fields");
            changed |= self.form.flags.ui(ui);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.materials.ui(ui);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.samples.ui(ui, images);
        });

        changed
    }

    fn layout(&self, export_mode: bool) -> SheetLayout {
        let mut layout = SheetLayout::new(self.name().title());
        self.form.fields.layout_into(&mut layout);
        self.form.flags.layout_into(&mut layout);
        self.form.materials.layout_into(&mut layout, export_mode);
        self.form.samples.layout_into(&mut layout, export_mode);
        layout
    }
}
