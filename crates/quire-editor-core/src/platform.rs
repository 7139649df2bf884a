//! Platform abstraction traits for selection and clipboard access.
//!
//! These traits define the interface between the editor logic and the host
//! runtime (browser DOM, native UI, or the in-memory bridge used by tests).
//! The editor only ever talks to the live editable content through them.

use crate::error::BridgeError;
use crate::markup::Marks;
use crate::types::{ActiveSelection, CaretEdge, NodeId, NodeRange, Rect, RegionHandle};

/// Inline content written by [`SelectionBridge::replace_range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub marks: Marks,
}

impl Fragment {
    pub fn new(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Marks::plain())
    }
}

/// Formatting command issued against the current native selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl FormatCommand {
    pub fn format(&self) -> crate::markup::InlineFormat {
        use crate::markup::InlineFormat;
        match self {
            Self::Bold => InlineFormat::Bold,
            Self::Italic => InlineFormat::Italic,
            Self::Underline => InlineFormat::Underline,
            Self::Strikethrough => InlineFormat::Strikethrough,
        }
    }
}

/// Host-side selection and editable-region access.
///
/// Implementations own the one global selection object. Callers only read or
/// write it for the block that currently has focus.
pub trait SelectionBridge {
    /// The current selection, if the host has one.
    fn active_selection(&self) -> Option<ActiveSelection>;

    /// Whether the node is a text node (as opposed to an element).
    fn is_text_node(&self, node: &NodeId) -> bool;

    /// Text of a text node. `None` for elements and unknown nodes.
    fn text_of(&self, node: &NodeId) -> Option<String>;

    /// Whether the node lives inside the editor's container element.
    fn container_contains(&self, node: &NodeId) -> bool;

    /// Collapse the selection to a caret at `offset` inside `node`.
    fn set_caret(&mut self, node: &NodeId, offset: usize) -> Result<(), BridgeError>;

    /// Collapse the selection at the start or end of a region's content.
    fn collapse_region(&mut self, region: &RegionHandle, edge: CaretEdge)
    -> Result<(), BridgeError>;

    /// Replace a range inside one text node with inline fragments and leave
    /// the caret right after the inserted content.
    fn replace_range(&mut self, range: &NodeRange, fragments: &[Fragment])
    -> Result<(), BridgeError>;

    /// Bounding box of a range, in host coordinates.
    fn bounding_rect_of(&self, range: &NodeRange) -> Option<Rect>;

    /// Live text content of a region (tags dropped, entities decoded).
    fn region_text(&self, region: &RegionHandle) -> Option<String>;

    /// Live markup of a region.
    fn region_html(&self, region: &RegionHandle) -> Option<String>;

    /// Replace a region's live content wholesale.
    fn reset_region(&mut self, region: &RegionHandle, html: &str) -> Result<(), BridgeError>;

    /// Apply an inline format to the current native selection.
    fn apply_format(&mut self, command: FormatCommand) -> Result<(), BridgeError>;

    /// Markup of a region before and after the caret, when the caret sits
    /// inside it. Hosts that cannot split live content return `None` and the
    /// whole region is kept in the original block on Enter.
    fn split_at_caret(&self, _region: &RegionHandle) -> Option<(String, String)> {
        None
    }
}

/// Platform-specific clipboard access.
pub trait ClipboardPlatform {
    /// Write plain text to the system clipboard.
    fn write_text(&self, text: &str);
}

/// Clipboard that keeps the last written text. Useful for headless hosts.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: std::cell::RefCell<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl ClipboardPlatform for MemoryClipboard {
    fn write_text(&self, text: &str) {
        *self.contents.borrow_mut() = Some(text.to_string());
    }
}
