//! Structural operations over the block sequence.
//!
//! Every operation takes the host's current blocks and returns a new
//! sequence in an [`Edit`], together with the block that should receive
//! focus afterwards. Inputs are never mutated. Guard violations (unknown
//! ids, removing the last block, merging without a previous block) come back
//! as unchanged edits rather than errors.

use crate::block::{Block, BlockId, BlockType, IdGenerator, fresh_id, position};
use crate::sanitize::commit_content;
use crate::types::CaretEdge;

/// Where focus should land after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusRequest {
    pub block: BlockId,
    pub edge: CaretEdge,
}

impl FocusRequest {
    pub fn start(block: BlockId) -> Self {
        Self {
            block,
            edge: CaretEdge::Start,
        }
    }

    pub fn end(block: BlockId) -> Self {
        Self {
            block,
            edge: CaretEdge::End,
        }
    }
}

/// Result of a document operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub blocks: Vec<Block>,
    pub focus: Option<FocusRequest>,
    /// False when a guard turned the operation into a no-op.
    pub changed: bool,
}

impl Edit {
    fn unchanged(blocks: &[Block]) -> Self {
        Self {
            blocks: blocks.to_vec(),
            focus: None,
            changed: false,
        }
    }

    fn changed(blocks: Vec<Block>, focus: Option<FocusRequest>) -> Self {
        Self {
            blocks,
            focus,
            changed: true,
        }
    }
}

/// Live content of a block captured at the moment of a split.
///
/// `head` is the content before the caret, `tail` the content after it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitCapture {
    pub head: String,
    pub tail: String,
}

impl SplitCapture {
    /// Caret at the end of the block: everything stays in the original block.
    pub fn whole(content: impl Into<String>) -> Self {
        Self {
            head: content.into(),
            tail: String::new(),
        }
    }

    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
        }
    }
}

/// Split a block at the caret (Enter).
///
/// The original block keeps its id and takes the committed head; a fresh
/// paragraph holding the committed tail is inserted right after it and
/// receives focus at its start.
pub fn split_at<G: IdGenerator + ?Sized>(
    blocks: &[Block],
    id: &BlockId,
    capture: &SplitCapture,
    ids: &mut G,
) -> Edit {
    let Some(idx) = position(blocks, id) else {
        tracing::debug!(target: "quire::ops", block_id = %id, "split: unknown block");
        return Edit::unchanged(blocks);
    };

    let new_id = fresh_id(blocks, ids);
    let mut next = blocks.to_vec();
    next[idx].content = commit_content(id, &capture.head);

    let tail = commit_content(&new_id, &capture.tail);
    next.insert(idx + 1, Block::paragraph(new_id.clone()).with_content(tail));

    tracing::trace!(target: "quire::ops", block_id = %id, new_block = %new_id, "split block");
    Edit::changed(next, Some(FocusRequest::start(new_id)))
}

/// Remove an empty block and return focus to the end of the previous one
/// (Backspace on an empty block).
///
/// No-op for the first block, for a sole block, and for any block whose
/// content is not blank: content is never discarded on this path.
pub fn merge_with_previous(blocks: &[Block], id: &BlockId) -> Edit {
    let Some(idx) = position(blocks, id) else {
        return Edit::unchanged(blocks);
    };
    if idx == 0 || blocks.len() == 1 {
        tracing::debug!(target: "quire::ops", block_id = %id, "merge: no previous block");
        return Edit::unchanged(blocks);
    }
    if !blocks[idx].is_blank() {
        tracing::debug!(target: "quire::ops", block_id = %id, "merge: block not empty");
        return Edit::unchanged(blocks);
    }

    let mut next = blocks.to_vec();
    next.remove(idx);
    let previous = next[idx - 1].id.clone();
    Edit::changed(next, Some(FocusRequest::end(previous)))
}

/// Insert a new empty block of `kind` right after `after`.
pub fn insert_after<G: IdGenerator + ?Sized>(
    blocks: &[Block],
    after: &BlockId,
    kind: Option<BlockType>,
    ids: &mut G,
) -> Edit {
    let Some(idx) = position(blocks, after) else {
        tracing::debug!(target: "quire::ops", block_id = %after, "insert: unknown anchor block");
        return Edit::unchanged(blocks);
    };

    let new_id = fresh_id(blocks, ids);
    let mut next = blocks.to_vec();
    next.insert(idx + 1, Block::new(new_id.clone(), kind.unwrap_or_default()));
    Edit::changed(next, Some(FocusRequest::start(new_id)))
}

/// Re-type a block in place, clearing its content. Keeps the id.
///
/// Used by autoformat only. Applying the same type twice gives the same
/// result as applying it once.
pub fn coerce_type(blocks: &[Block], id: &BlockId, kind: BlockType) -> Edit {
    let Some(idx) = position(blocks, id) else {
        return Edit::unchanged(blocks);
    };

    let current = &blocks[idx];
    if current.kind == kind && current.content.is_empty() && !current.checked {
        return Edit::unchanged(blocks);
    }

    let mut next = blocks.to_vec();
    let block = &mut next[idx];
    block.kind = kind;
    block.content.clear();
    block.checked = false;

    tracing::trace!(target: "quire::ops", block_id = %id, kind = %kind, "coerced block type");
    Edit::changed(next, Some(FocusRequest::start(id.clone())))
}

/// Delete a block. Never removes the last remaining one.
pub fn remove(blocks: &[Block], id: &BlockId) -> Edit {
    if blocks.len() <= 1 {
        tracing::debug!(target: "quire::ops", block_id = %id, "remove: refusing to empty document");
        return Edit::unchanged(blocks);
    }
    let Some(idx) = position(blocks, id) else {
        return Edit::unchanged(blocks);
    };

    let mut next = blocks.to_vec();
    next.remove(idx);
    let focus = idx
        .checked_sub(1)
        .map(|prev| FocusRequest::end(next[prev].id.clone()));
    Edit::changed(next, focus)
}

/// Commit raw live content into a block (blur, polish result).
pub fn set_content(blocks: &[Block], id: &BlockId, raw: &str) -> Edit {
    let Some(idx) = position(blocks, id) else {
        return Edit::unchanged(blocks);
    };

    let content = commit_content(id, raw);
    if blocks[idx].content == content {
        return Edit::unchanged(blocks);
    }

    let mut next = blocks.to_vec();
    next[idx].content = content;
    Edit::changed(next, None)
}

/// Flip the checked flag of a to-do block.
pub fn toggle_checked(blocks: &[Block], id: &BlockId) -> Edit {
    let Some(idx) = position(blocks, id) else {
        return Edit::unchanged(blocks);
    };
    if blocks[idx].kind != BlockType::Todo {
        return Edit::unchanged(blocks);
    }

    let mut next = blocks.to_vec();
    next[idx].checked = !next[idx].checked;
    Edit::changed(next, None)
}
