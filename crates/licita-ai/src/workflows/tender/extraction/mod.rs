//! Document extractor: raw bytes into ordered text segments with positions.
//!
//! Two inputs are understood, both sniffed from content. A UTF-8 text layer
//! (pages separated by form feeds) is grouped into paragraph, list-item and
//! heading blocks. Layout JSON (`{"pages":[{"blocks":[{"text","bbox"}]}]}`)
//! maps each block to one segment and keeps its bounding box. Raw PDF is
//! refused; callers convert it to a text layer first.

pub(crate) mod blocks;
mod layout;
pub(crate) mod normalizer;

use std::collections::VecDeque;

use serde::Serialize;

use super::domain::{BoundingBox, SourceSpan};
use layout::{LayoutBlock, LayoutDocument};

/// Smallest extraction unit: a paragraph, list item, heading or layout block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSegment {
    pub text: String,
    pub page: u32,
    /// Document-wide ordinal, starting at zero.
    pub index: usize,
    pub bbox: Option<BoundingBox>,
}

impl TextSegment {
    pub fn span(&self) -> SourceSpan {
        SourceSpan {
            page: self.page,
            segment_index: self.index,
            bbox: self.bbox,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    TextLayer,
    LayoutJson,
}

/// Fatal extraction failure; never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnreadableDocumentError {
    #[error("document is empty")]
    Empty,
    #[error("document contains binary data")]
    Binary,
    #[error("unsupported document format: {detected}")]
    UnsupportedFormat { detected: &'static str },
    #[error("document is not valid UTF-8 (invalid byte at offset {offset})")]
    InvalidEncoding { offset: usize },
    #[error("layout document is malformed: {0}")]
    MalformedLayout(String),
    #[error("document contains no extractable text")]
    NoText,
}

#[derive(Debug, Clone)]
enum PageContent {
    Text(String),
    Blocks(Vec<LayoutBlock>),
}

#[derive(Debug, Clone)]
struct Page {
    number: u32,
    content: PageContent,
}

impl Page {
    fn segment_parts(&self) -> Vec<(String, Option<BoundingBox>)> {
        match &self.content {
            PageContent::Text(text) => blocks::split_blocks(text)
                .into_iter()
                .map(|block| (block, None))
                .collect(),
            PageContent::Blocks(blocks) => blocks.iter().filter_map(LayoutBlock::cleaned).collect(),
        }
    }
}

/// Validated document whose segments are produced page by page on demand.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    format: DocumentFormat,
    pages: Vec<Page>,
}

impl ExtractedDocument {
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Fresh pass over the segments. Every call yields the same sequence.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            pages: self.pages.iter(),
            buffer: VecDeque::new(),
            next_index: 0,
        }
    }
}

/// Lazy iterator over a document's segments, bounded by its page count.
pub struct Segments<'a> {
    pages: std::slice::Iter<'a, Page>,
    buffer: VecDeque<TextSegment>,
    next_index: usize,
}

impl Iterator for Segments<'_> {
    type Item = TextSegment;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() {
            let page = self.pages.next()?;
            for (text, bbox) in page.segment_parts() {
                self.buffer.push_back(TextSegment {
                    text,
                    page: page.number,
                    index: self.next_index,
                    bbox,
                });
                self.next_index += 1;
            }
        }
        self.buffer.pop_front()
    }
}

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sniff, validate and load a document.
pub fn extract(bytes: &[u8]) -> Result<ExtractedDocument, UnreadableDocumentError> {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(UnreadableDocumentError::Empty);
    }
    if let Some(detected) = sniff_binary(bytes) {
        return Err(UnreadableDocumentError::UnsupportedFormat { detected });
    }
    if bytes.contains(&0) {
        return Err(UnreadableDocumentError::Binary);
    }
    let text = std::str::from_utf8(bytes).map_err(|err| {
        UnreadableDocumentError::InvalidEncoding {
            offset: err.valid_up_to(),
        }
    })?;

    let document = if text.trim_start().starts_with('{') {
        let layout: LayoutDocument = serde_json::from_str(text)
            .map_err(|err| UnreadableDocumentError::MalformedLayout(err.to_string()))?;
        ExtractedDocument {
            format: DocumentFormat::LayoutJson,
            pages: layout
                .pages
                .into_iter()
                .enumerate()
                .map(|(position, page)| Page {
                    number: page.number.unwrap_or(position as u32 + 1),
                    content: PageContent::Blocks(page.blocks),
                })
                .collect(),
        }
    } else {
        ExtractedDocument {
            format: DocumentFormat::TextLayer,
            pages: text
                .split('\u{c}')
                .enumerate()
                .map(|(position, page)| Page {
                    number: position as u32 + 1,
                    content: PageContent::Text(page.to_string()),
                })
                .collect(),
        }
    };

    if document.segments().next().is_none() {
        return Err(UnreadableDocumentError::NoText);
    }
    Ok(document)
}

fn sniff_binary(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "pdf"),
        (b"PK\x03\x04", "zip"),
        (b"\xD0\xCF\x11\xE0", "ole2"),
        (b"\x89PNG", "png"),
        (b"\xFF\xD8\xFF", "jpeg"),
        (b"GIF8", "gif"),
        (b"II*\x00", "tiff"),
        (b"MM\x00*", "tiff"),
    ];
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, name)| *name)
}
