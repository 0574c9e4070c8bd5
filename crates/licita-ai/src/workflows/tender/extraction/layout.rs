//! Layout JSON produced by an upstream OCR/layout service.

use serde::Deserialize;

use super::normalizer::{clean_line, is_noise};
use crate::workflows::tender::domain::BoundingBox;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LayoutDocument {
    pub(crate) pages: Vec<LayoutPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LayoutPage {
    #[serde(default)]
    pub(crate) number: Option<u32>,
    #[serde(default)]
    pub(crate) blocks: Vec<LayoutBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LayoutBlock {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) bbox: Option<[f32; 4]>,
}

impl LayoutBlock {
    /// Cleaned block text, or `None` for noise and empty blocks.
    pub(crate) fn cleaned(&self) -> Option<(String, Option<BoundingBox>)> {
        let text = self
            .text
            .lines()
            .filter(|line| !is_noise(line))
            .map(clean_line)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            None
        } else {
            Some((text, self.bbox.map(BoundingBox::from)))
        }
    }
}
