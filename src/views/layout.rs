//! Declarative projection of a mounted view, read by the rasterizer

/// One visual block of a view, top to bottom
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(String),
    Field {
        label: String,
        value: String,
    },
    Table {
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Embedded picture; `source` is a data URI, empty when no picture is set
    Image {
        caption: String,
        source: String,
    },
    /// Interactive-only chrome (buttons, palettes) hidden in export mode
    Controls(Vec<String>),
}

/// Everything visible in the view container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetLayout {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl SheetLayout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn heading(&mut self, text: &str) {
        self.push(Block::Heading(text.to_string()));
    }

    pub fn field(&mut self, label: &str, value: &str) {
        self.push(Block::Field {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    /// Interactive chrome only appears outside export mode
    pub fn controls(&mut self, export_mode: bool, labels: &[&str]) {
        if !export_mode {
            self.push(Block::Controls(
                labels.iter().map(|l| l.to_string()).collect(),
            ));
        }
    }

    /// Data URIs of every non-empty image block, in layout order
    pub fn image_sources(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Image { source, .. } if !source.is_empty() => Some(source.clone()),
                _ => None,
            })
            .collect()
    }

    #[cfg(test)]
    pub fn has_controls(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, Block::Controls(_)))
    }
}
