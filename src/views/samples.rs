//! vista4: main sample photo, material sample gallery and approval

use eframe::egui;

use super::fields::{FieldSpec, Gallery, PhotoField, TextFields};
use super::host::ViewHost;
use super::images::ImageCache;
use super::layout::SheetLayout;
use super::View;
use crate::error::Result;
use crate::gui::constants::SECTION_SPACING;
use crate::model::{ViewData, ViewName};

const TEXT_FIELDS: &[FieldSpec] = &[
    FieldSpec::line("aprobadoPor", "Aprobado por"),
    FieldSpec::line("fechaAprobacion", "Fecha de aprobación"),
    FieldSpec::area("observacionesMuestra", "Observaciones de la muestra"),
];

#[derive(Debug, Clone)]
struct SamplesForm {
    main_photo: PhotoField,
    samples: Gallery,
    fields: TextFields,
}

impl Default for SamplesForm {
    fn default() -> Self {
        Self {
            main_photo: PhotoField::new("fotoPrincipal", "Foto principal"),
            samples: Gallery::new("muestraMateriales", "Muestras de materiales", "foto"),
            fields: TextFields::new(TEXT_FIELDS),
        }
    }
}

pub struct SamplesView {
    form: SamplesForm,
    mounted: bool,
}

impl SamplesView {
    pub fn new() -> Self {
        Self {
            form: SamplesForm::default(),
            mounted: false,
        }
    }
}

impl View for SamplesView {
    fn name(&self) -> ViewName {
        ViewName::Vista4
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn render(&mut self, host: &mut ViewHost) -> Result<()> {
        host.mount(self.name())?;
        self.form = SamplesForm::default();
        self.mounted = true;
        Ok(())
    }

    fn serialize(&self) -> ViewData {
        let mut data = ViewData::new();
        self.form.main_photo.serialize_into(&mut data);
        self.form.samples.serialize_into(&mut data);
        self.form.fields.serialize_into(&mut data);
        data
    }

    fn deserialize(&mut self, data: &ViewData) {
        self.form.main_photo.deserialize_from(data);
        self.form.samples.deserialize_from(data);
        self.form.fields.deserialize_from(data);
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
            changed |= self.form.main_photo.ui(ui, images);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.samples.ui(ui, images);
        });
        ui.add_space(SECTION_SPACING);
        ui.group(|ui| {
            changed |= self.form.fields.ui(ui, "samples_fields");
        });

        changed
    }

    fn layout(&self, export_mode: bool) -> SheetLayout {
        let mut layout = SheetLayout::new(self.name().title());
        self.form.main_photo.layout_into(&mut layout, export_mode);
        self.form.samples.layout_into(&mut layout, export_mode);
        self.form.fields.layout_into(&mut layout);
        layout
    }
}
