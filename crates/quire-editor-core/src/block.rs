//! Block model: the data shape of one editable unit.
//!
//! A document is a plain `Vec<Block>` owned by the host. Reading order is the
//! position in that vector; there is no separate ordering field.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::markup::{Segment, parse};
use crate::sanitize::is_break_artifact;

/// Opaque block identifier, stable across edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(SmolStr);

impl BlockId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

/// Block-level content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum BlockType {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Todo,
    Bullet,
    Code,
}

impl BlockType {
    /// Name used in the host record (`"heading1"`, `"todo"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Todo => "todo",
            Self::Bullet => "bullet",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One editable unit of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockType,
    /// Constrained inline HTML (bold/italic/underline/strike spans and text).
    #[serde(default)]
    pub content: String,
    /// Only meaningful for [`BlockType::Todo`].
    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockType) -> Self {
        Self {
            id,
            kind,
            content: String::new(),
            checked: false,
        }
    }

    pub fn paragraph(id: BlockId) -> Self {
        Self::new(id, BlockType::Paragraph)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// True when the content is empty or only a leftover line break.
    pub fn is_blank(&self) -> bool {
        is_blank_content(&self.content)
    }
}

/// Content that renders as an empty line: no text and at most one break,
/// whatever formatting wrappers are left around it (`<strong><br></strong>`).
pub fn is_blank_content(content: &str) -> bool {
    if content.is_empty() || is_break_artifact(content) {
        return true;
    }
    let mut breaks = 0;
    for segment in parse(content) {
        match segment {
            Segment::Run(run) if !run.text.is_empty() => return false,
            Segment::Run(_) => {}
            Segment::Break => breaks += 1,
        }
    }
    breaks <= 1
}

/// Index of the block with the given id.
pub fn position(blocks: &[Block], id: &BlockId) -> Option<usize> {
    blocks.iter().position(|b| &b.id == id)
}

/// The block with the given id.
pub fn find<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    blocks.iter().find(|b| &b.id == id)
}

/// Source of fresh block ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> BlockId;
}

/// Random v4 UUIDs. The default for interactive hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> BlockId {
        BlockId(format_smolstr!("{}", uuid::Uuid::new_v4()))
    }
}

/// Deterministic `prefix-N` ids.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: SmolStr,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("b")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> BlockId {
        let id = BlockId(format_smolstr!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// Draw ids until one is not already used in `blocks`.
pub fn fresh_id<G: IdGenerator + ?Sized>(blocks: &[Block], ids: &mut G) -> BlockId {
    loop {
        let id = ids.next_id();
        if position(blocks, &id).is_none() {
            return id;
        }
        tracing::trace!(target: "quire::ops", block_id = %id, "id already in use, drawing again");
    }
}

/// A new document: one empty paragraph.
pub fn new_document<G: IdGenerator + ?Sized>(ids: &mut G) -> Vec<Block> {
    vec![Block::paragraph(ids.next_id())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let block = Block::new("a".into(), BlockType::Todo)
            .with_content("Done")
            .with_checked(true);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "a", "type": "todo", "content": "Done", "checked": true})
        );

        let plain = Block::paragraph("p".into());
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("checked").is_none());
    }

    #[test]
    fn test_deserialize_defaults() {
        let block: Block = serde_json::from_str(r#"{"id": "x", "type": "heading2"}"#).unwrap();
        assert_eq!(block.kind, BlockType::Heading2);
        assert_eq!(block.content, "");
        assert!(!block.checked);
    }

    #[test]
    fn test_blank_content() {
        assert!(Block::paragraph("a".into()).is_blank());
        assert!(Block::paragraph("a".into()).with_content("<br>").is_blank());
        assert!(!Block::paragraph("a".into()).with_content("x").is_blank());
    }

    #[test]
    fn test_blank_ignores_empty_wrappers() {
        assert!(is_blank_content("<strong><br></strong>"));
        assert!(is_blank_content("<em></em>"));
        assert!(is_blank_content("<u><s></s></u><br/>"));
        assert!(!is_blank_content("<br><br>"));
        assert!(!is_blank_content("<em>a</em>"));
        assert!(!is_blank_content("&nbsp;"));
    }

    #[test]
    fn test_fresh_id_skips_used() {
        let blocks = vec![
            Block::paragraph("b1".into()),
            Block::paragraph("b2".into()),
        ];
        let mut ids = SequentialIds::default();
        assert_eq!(fresh_id(&blocks, &mut ids).as_str(), "b3");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn test_new_document() {
        let doc = new_document(&mut SequentialIds::default());
        assert_eq!(doc.len(), 1);
        assert_eq!(doc[0].kind, BlockType::Paragraph);
        assert!(doc[0].content.is_empty());
    }
}
