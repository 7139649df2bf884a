//! Core editor types: node handles, selection points, geometry.
//!
//! These types are framework-agnostic. A host bridge maps its native nodes
//! and regions onto the opaque handles defined here.

use std::fmt;

use smol_str::SmolStr;

use crate::block::BlockId;

/// Opaque handle to a node in the host's rendered tree (text node or element).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub SmolStr);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to the editable region rendered for one block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionHandle(pub SmolStr);

impl RegionHandle {
    pub fn new(handle: impl Into<SmolStr>) -> Self {
        Self(handle.into())
    }

    /// Conventional handle for a block's region.
    pub fn for_block(id: &BlockId) -> Self {
        Self(smol_str::format_smolstr!("block-{}", id))
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A boundary point of a selection.
///
/// `offset` counts chars inside a text node, or children inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The host's current selection.
///
/// The anchor is where the selection started, the focus is where it is now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSelection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl ActiveSelection {
    pub fn new(anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        Self { anchor, focus }
    }

    /// A caret.
    pub fn collapsed(point: SelectionPoint) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn to_range(&self) -> NodeRange {
        NodeRange {
            start: self.anchor.clone(),
            end: self.focus.clone(),
        }
    }
}

/// A range between two selection points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRange {
    pub start: SelectionPoint,
    pub end: SelectionPoint,
}

impl NodeRange {
    /// Char range `start..end` inside a single text node.
    pub fn within(node: NodeId, start: usize, end: usize) -> Self {
        Self {
            start: SelectionPoint::new(node.clone(), start),
            end: SelectionPoint::new(node, end),
        }
    }

    pub fn is_single_node(&self) -> bool {
        self.start.node == self.end.node
    }
}

/// Axis-aligned rectangle in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// A position in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Which edge of a region the caret collapses to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaretEdge {
    Start,
    End,
}

/// Vertical navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}
