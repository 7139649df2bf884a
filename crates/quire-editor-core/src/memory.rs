//! In-memory [`SelectionBridge`] for headless hosts and tests.
//!
//! Each mounted region holds a flat list of nodes: styled text runs and line
//! breaks, the shape a browser gives an editable block after normalization.
//! Node ids are regenerated whenever a region's content changes, so callers
//! must re-read the selection after every edit, as they would with a live
//! DOM.
//!
//! Geometry is deterministic: every char is `char_width` wide and every
//! region occupies one `line_height` row, in mount order.

use smol_str::format_smolstr;

use crate::error::BridgeError;
use crate::markup::{Marks, Segment, TextRun, parse, render};
use crate::platform::{Fragment, FormatCommand, SelectionBridge};
use crate::types::{ActiveSelection, CaretEdge, NodeId, NodeRange, Rect, RegionHandle, SelectionPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    /// Prefer the end of the preceding node.
    Left,
    /// Prefer the start of the following node.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Char(char, Marks),
    Break,
}

fn segments_of(items: &[Item]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for item in items {
        match *item {
            Item::Char(c, marks) => match segments.last_mut() {
                Some(Segment::Run(run)) if run.marks == marks => run.text.push(c),
                _ => segments.push(Segment::Run(TextRun::new(c.to_string(), marks))),
            },
            Item::Break => segments.push(Segment::Break),
        }
    }
    segments
}

#[derive(Debug, Clone)]
struct MemoryNode {
    id: NodeId,
    segment: Segment,
}

impl MemoryNode {
    fn len(&self) -> usize {
        match &self.segment {
            Segment::Run(run) => run.len(),
            Segment::Break => 1,
        }
    }
}

#[derive(Debug)]
struct MountedRegion {
    handle: RegionHandle,
    element: NodeId,
    in_container: bool,
    nodes: Vec<MemoryNode>,
    generation: u64,
}

impl MountedRegion {
    fn new(handle: RegionHandle, html: &str) -> Self {
        let mut region = Self {
            element: NodeId(handle.0.clone()),
            handle,
            in_container: true,
            nodes: Vec::new(),
            generation: 0,
        };
        region.set_segments(parse(html));
        region
    }

    fn set_segments(&mut self, segments: Vec<Segment>) {
        self.generation += 1;
        self.nodes = segments
            .into_iter()
            .enumerate()
            .map(|(i, segment)| MemoryNode {
                id: NodeId(format_smolstr!("{}/{}.{}", self.handle, self.generation, i)),
                segment,
            })
            .collect();
    }

    fn len(&self) -> usize {
        self.nodes.iter().map(MemoryNode::len).sum()
    }

    fn items(&self) -> Vec<Item> {
        let mut items = Vec::with_capacity(self.len());
        for node in &self.nodes {
            match &node.segment {
                Segment::Run(run) => items.extend(run.text.chars().map(|c| Item::Char(c, run.marks))),
                Segment::Break => items.push(Item::Break),
            }
        }
        items
    }

    fn set_items(&mut self, items: &[Item]) {
        self.set_segments(segments_of(items));
    }

    fn owns(&self, node: &NodeId) -> bool {
        *node == self.element || self.nodes.iter().any(|n| n.id == *node)
    }

    fn node(&self, node: &NodeId) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| n.id == *node)
    }

    /// Region-level offset of a selection point.
    fn offset_of(&self, point: &SelectionPoint) -> Result<usize, BridgeError> {
        if point.node == self.element {
            if point.offset > self.nodes.len() {
                return Err(BridgeError::OutOfBounds {
                    node: point.node.to_string(),
                    offset: point.offset,
                    len: self.nodes.len(),
                });
            }
            return Ok(self.nodes[..point.offset].iter().map(MemoryNode::len).sum());
        }

        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == point.node)
            .ok_or_else(|| BridgeError::NodeNotFound(point.node.to_string()))?;
        let len = self.nodes[idx].len();
        if point.offset > len {
            return Err(BridgeError::OutOfBounds {
                node: point.node.to_string(),
                offset: point.offset,
                len,
            });
        }
        let before: usize = self.nodes[..idx].iter().map(MemoryNode::len).sum();
        Ok(before + point.offset)
    }

    /// Selection point for a region-level offset.
    fn point_at(&self, offset: usize, affinity: Affinity) -> SelectionPoint {
        let mut acc = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            match &node.segment {
                Segment::Run(run) => {
                    let end = acc + run.len();
                    let inside = match affinity {
                        Affinity::Left => offset <= end,
                        Affinity::Right => offset < end,
                    };
                    if inside {
                        return SelectionPoint::new(node.id.clone(), offset - acc);
                    }
                    acc = end;
                }
                Segment::Break => {
                    if offset <= acc {
                        return SelectionPoint::new(self.element.clone(), i);
                    }
                    acc += 1;
                }
            }
        }
        match affinity {
            Affinity::Right => self.point_at(offset, Affinity::Left),
            Affinity::Left => SelectionPoint::new(self.element.clone(), self.nodes.len()),
        }
    }

    fn text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(|n| match &n.segment {
                Segment::Run(run) => Some(run.text.as_str()),
                Segment::Break => None,
            })
            .collect()
    }

    fn html(&self) -> String {
        let segments: Vec<Segment> = self.nodes.iter().map(|n| n.segment.clone()).collect();
        render(&segments)
    }
}

/// Deterministic in-memory host.
#[derive(Debug)]
pub struct MemoryBridge {
    regions: Vec<MountedRegion>,
    selection: Option<ActiveSelection>,
    char_width: f64,
    line_height: f64,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::with_geometry(8.0, 20.0)
    }

    pub fn with_geometry(char_width: f64, line_height: f64) -> Self {
        Self {
            regions: Vec::new(),
            selection: None,
            char_width,
            line_height,
        }
    }

    /// Mount (or re-mount) a region with initial markup.
    pub fn mount_region(&mut self, handle: RegionHandle, html: &str) {
        if let Some(region) = self.region_mut(&handle) {
            region.set_segments(parse(html));
            return;
        }
        tracing::trace!(target: "quire::bridge", region = %handle, "mount");
        self.regions.push(MountedRegion::new(handle, html));
    }

    pub fn unmount_region(&mut self, handle: &RegionHandle) {
        let Some(idx) = self.regions.iter().position(|r| r.handle == *handle) else {
            return;
        };
        if self.selection_region().as_ref() == Some(handle) {
            self.selection = None;
        }
        self.regions.remove(idx);
        tracing::trace!(target: "quire::bridge", region = %handle, "unmount");
    }

    pub fn is_mounted(&self, handle: &RegionHandle) -> bool {
        self.region(handle).is_some()
    }

    /// Reorder rows to match `order`. Regions not listed keep their relative
    /// order after the listed ones.
    pub fn arrange(&mut self, order: &[RegionHandle]) {
        let rank = |r: &MountedRegion| {
            order
                .iter()
                .position(|h| *h == r.handle)
                .unwrap_or(order.len())
        };
        self.regions.sort_by_key(rank);
    }

    /// Mark a region as living outside (or inside) the editor container.
    pub fn set_in_container(&mut self, handle: &RegionHandle, in_container: bool) {
        if let Some(region) = self.region_mut(handle) {
            region.in_container = in_container;
        }
    }

    pub fn set_selection(&mut self, selection: ActiveSelection) -> Result<(), BridgeError> {
        for point in [&selection.anchor, &selection.focus] {
            let region = self
                .region_of(&point.node)
                .ok_or_else(|| BridgeError::NodeNotFound(point.node.to_string()))?;
            region.offset_of(point)?;
        }
        self.selection = Some(selection);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Select `start..end` (region-level char offsets) inside one region.
    pub fn select_in_region(
        &mut self,
        handle: &RegionHandle,
        start: usize,
        end: usize,
    ) -> Result<(), BridgeError> {
        let region = self
            .region(handle)
            .ok_or_else(|| BridgeError::RegionNotMounted(handle.to_string()))?;
        let len = region.len();
        if start > len || end > len {
            return Err(BridgeError::OutOfBounds {
                node: region.element.to_string(),
                offset: start.max(end),
                len,
            });
        }

        let selection = if start == end {
            ActiveSelection::collapsed(region.point_at(start, Affinity::Left))
        } else {
            let (lo, hi) = (start.min(end), start.max(end));
            let lo_point = region.point_at(lo, Affinity::Right);
            let hi_point = region.point_at(hi, Affinity::Left);
            if start < end {
                ActiveSelection::new(lo_point, hi_point)
            } else {
                ActiveSelection::new(hi_point, lo_point)
            }
        };
        self.selection = Some(selection);
        Ok(())
    }

    /// Region holding the selection anchor.
    pub fn selection_region(&self) -> Option<RegionHandle> {
        let selection = self.selection.as_ref()?;
        self.region_of(&selection.anchor.node)
            .map(|r| r.handle.clone())
    }

    /// Caret offset inside a region, when the selection is a caret there.
    pub fn caret_in(&self, handle: &RegionHandle) -> Option<usize> {
        let selection = self.selection.as_ref()?;
        if !selection.is_collapsed() {
            return None;
        }
        let region = self.region(handle)?;
        if !region.owns(&selection.anchor.node) {
            return None;
        }
        region.offset_of(&selection.anchor).ok()
    }

    /// Native typing: insert text at the caret, replacing any selection.
    ///
    /// Inserted text takes the marks of the text node holding the caret.
    pub fn insert_text(&mut self, text: &str) -> Result<(), BridgeError> {
        let (idx, start, end) = self.selected_span()?;
        let region = &self.regions[idx];
        let point = region.point_at(start, Affinity::Left);
        let marks = match region.node(&point.node).map(|n| &n.segment) {
            Some(Segment::Run(run)) => run.marks,
            _ => Marks::plain(),
        };
        let inserted: Vec<Item> = text.chars().map(|c| Item::Char(c, marks)).collect();
        self.splice(idx, start, end, inserted)
    }

    /// Native soft line break at the caret.
    pub fn insert_line_break(&mut self) -> Result<(), BridgeError> {
        let (idx, start, end) = self.selected_span()?;
        self.splice(idx, start, end, vec![Item::Break])
    }

    /// Native Backspace: delete the selection, or the item before the caret.
    pub fn delete_backward(&mut self) -> Result<(), BridgeError> {
        let (idx, start, end) = self.selected_span()?;
        if start != end {
            return self.splice(idx, start, end, Vec::new());
        }
        if start == 0 {
            return Ok(());
        }
        self.splice(idx, start - 1, start, Vec::new())
    }

    fn region(&self, handle: &RegionHandle) -> Option<&MountedRegion> {
        self.regions.iter().find(|r| r.handle == *handle)
    }

    fn region_mut(&mut self, handle: &RegionHandle) -> Option<&mut MountedRegion> {
        self.regions.iter_mut().find(|r| r.handle == *handle)
    }

    fn region_of(&self, node: &NodeId) -> Option<&MountedRegion> {
        self.regions.iter().find(|r| r.owns(node))
    }

    fn region_index_of(&self, node: &NodeId) -> Option<usize> {
        self.regions.iter().position(|r| r.owns(node))
    }

    /// Region index and ordered offsets of the current selection.
    fn selected_span(&self) -> Result<(usize, usize, usize), BridgeError> {
        let selection = self.selection.as_ref().ok_or(BridgeError::NoSelection)?;
        let idx = self
            .region_index_of(&selection.anchor.node)
            .ok_or_else(|| BridgeError::NodeNotFound(selection.anchor.node.to_string()))?;
        let region = &self.regions[idx];
        if !region.owns(&selection.focus.node) {
            return Err(BridgeError::Unsupported(
                "selection spans several regions".into(),
            ));
        }
        let a = region.offset_of(&selection.anchor)?;
        let f = region.offset_of(&selection.focus)?;
        Ok((idx, a.min(f), a.max(f)))
    }

    /// Replace `start..end` of a region with `inserted` and put the caret
    /// after it.
    fn splice(
        &mut self,
        idx: usize,
        start: usize,
        end: usize,
        inserted: Vec<Item>,
    ) -> Result<(), BridgeError> {
        let region = &mut self.regions[idx];
        let mut items = region.items();
        let caret = start + inserted.len();
        items.splice(start..end, inserted);
        region.set_items(&items);
        self.selection = Some(ActiveSelection::collapsed(
            region.point_at(caret, Affinity::Left),
        ));
        Ok(())
    }

    fn row_of(&self, node: &NodeId) -> Option<usize> {
        self.region_index_of(node)
    }
}

impl SelectionBridge for MemoryBridge {
    fn active_selection(&self) -> Option<ActiveSelection> {
        self.selection.clone()
    }

    fn is_text_node(&self, node: &NodeId) -> bool {
        self.regions
            .iter()
            .find_map(|r| r.node(node))
            .is_some_and(|n| matches!(n.segment, Segment::Run(_)))
    }

    fn text_of(&self, node: &NodeId) -> Option<String> {
        match &self.regions.iter().find_map(|r| r.node(node))?.segment {
            Segment::Run(run) => Some(run.text.clone()),
            Segment::Break => None,
        }
    }

    fn container_contains(&self, node: &NodeId) -> bool {
        self.region_of(node).is_some_and(|r| r.in_container)
    }

    fn set_caret(&mut self, node: &NodeId, offset: usize) -> Result<(), BridgeError> {
        self.set_selection(ActiveSelection::collapsed(SelectionPoint::new(
            node.clone(),
            offset,
        )))
    }

    fn collapse_region(
        &mut self,
        region: &RegionHandle,
        edge: CaretEdge,
    ) -> Result<(), BridgeError> {
        let mounted = self
            .region(region)
            .ok_or_else(|| BridgeError::RegionNotMounted(region.to_string()))?;
        let point = match edge {
            CaretEdge::Start => mounted.point_at(0, Affinity::Left),
            CaretEdge::End => mounted.point_at(mounted.len(), Affinity::Left),
        };
        tracing::trace!(target: "quire::bridge", region = %region, ?edge, "collapse caret");
        self.selection = Some(ActiveSelection::collapsed(point));
        Ok(())
    }

    fn replace_range(
        &mut self,
        range: &NodeRange,
        fragments: &[Fragment],
    ) -> Result<(), BridgeError> {
        if !range.is_single_node() || !self.is_text_node(&range.start.node) {
            return Err(BridgeError::Unsupported(
                "replace_range needs a range inside one text node".into(),
            ));
        }
        let idx = self
            .region_index_of(&range.start.node)
            .ok_or_else(|| BridgeError::NodeNotFound(range.start.node.to_string()))?;
        let region = &self.regions[idx];
        let a = region.offset_of(&range.start)?;
        let b = region.offset_of(&range.end)?;

        let inserted = fragments
            .iter()
            .flat_map(|f| f.text.chars().map(|c| Item::Char(c, f.marks)))
            .collect();
        self.splice(idx, a.min(b), a.max(b), inserted)
    }

    fn bounding_rect_of(&self, range: &NodeRange) -> Option<Rect> {
        let start_row = self.row_of(&range.start.node)?;
        let end_row = self.row_of(&range.end.node)?;
        let start = self.regions[start_row].offset_of(&range.start).ok()?;
        let end = self.regions[end_row].offset_of(&range.end).ok()?;

        let (top, bottom) = (start_row.min(end_row), start_row.max(end_row));
        let (x0, x1) = (
            start as f64 * self.char_width,
            end as f64 * self.char_width,
        );
        Some(Rect::new(
            x0.min(x1),
            top as f64 * self.line_height,
            (x1 - x0).abs(),
            (bottom - top + 1) as f64 * self.line_height,
        ))
    }

    fn region_text(&self, region: &RegionHandle) -> Option<String> {
        self.region(region).map(MountedRegion::text)
    }

    fn region_html(&self, region: &RegionHandle) -> Option<String> {
        self.region(region).map(MountedRegion::html)
    }

    fn reset_region(&mut self, region: &RegionHandle, html: &str) -> Result<(), BridgeError> {
        let had_selection = self.selection_region().as_ref() == Some(region);
        let mounted = self
            .region_mut(region)
            .ok_or_else(|| BridgeError::RegionNotMounted(region.to_string()))?;
        mounted.set_segments(parse(html));
        let element = mounted.element.clone();
        if had_selection {
            self.selection = Some(ActiveSelection::collapsed(SelectionPoint::new(element, 0)));
        }
        Ok(())
    }

    fn apply_format(&mut self, command: FormatCommand) -> Result<(), BridgeError> {
        let (idx, start, end) = self.selected_span()?;
        if start == end {
            return Err(BridgeError::NoSelection);
        }
        let format = command.format();
        let region = &mut self.regions[idx];
        let mut items = region.items();

        let all_marked = items[start..end].iter().all(|item| match item {
            Item::Char(_, marks) => marks.has(format),
            Item::Break => true,
        });
        for item in &mut items[start..end] {
            if let Item::Char(_, marks) = item {
                *marks = marks.with(format, !all_marked);
            }
        }
        region.set_items(&items);

        self.selection = Some(ActiveSelection::new(
            region.point_at(start, Affinity::Right),
            region.point_at(end, Affinity::Left),
        ));
        Ok(())
    }

    fn split_at_caret(&self, region: &RegionHandle) -> Option<(String, String)> {
        let caret = self.caret_in(region)?;
        let items = self.region(region)?.items();
        let (head, tail) = items.split_at(caret);
        Some((render(&segments_of(head)), render(&segments_of(tail))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::InlineFormat;

    fn mounted(html: &str) -> (MemoryBridge, RegionHandle) {
        let mut bridge = MemoryBridge::new();
        let region = RegionHandle::new("r");
        bridge.mount_region(region.clone(), html);
        (bridge, region)
    }

    #[test]
    fn test_typing_and_caret() {
        let (mut bridge, region) = mounted("");
        bridge.collapse_region(&region, CaretEdge::Start).unwrap();
        bridge.insert_text("hello").unwrap();
        assert_eq!(bridge.region_text(&region).as_deref(), Some("hello"));
        assert_eq!(bridge.caret_in(&region), Some(5));

        bridge.delete_backward().unwrap();
        assert_eq!(bridge.region_text(&region).as_deref(), Some("hell"));
    }

    #[test]
    fn test_line_break_markup() {
        let (mut bridge, region) = mounted("one");
        bridge.collapse_region(&region, CaretEdge::End).unwrap();
        bridge.insert_line_break().unwrap();
        bridge.insert_text("two").unwrap();
        assert_eq!(bridge.region_html(&region).as_deref(), Some("one<br>two"));
        assert_eq!(bridge.region_text(&region).as_deref(), Some("onetwo"));
    }

    #[test]
    fn test_replace_range_places_caret_after() {
        let (mut bridge, region) = mounted("say **hi**");
        bridge.collapse_region(&region, CaretEdge::End).unwrap();
        let selection = bridge.active_selection().unwrap();
        let node = selection.anchor.node.clone();
        assert!(bridge.is_text_node(&node));

        bridge
            .replace_range(
                &NodeRange::within(node, 4, 10),
                &[
                    Fragment::new("hi", Marks::only(InlineFormat::Bold)),
                    Fragment::plain("\u{a0}"),
                ],
            )
            .unwrap();
        assert_eq!(
            bridge.region_html(&region).as_deref(),
            Some("say <strong>hi</strong>&nbsp;")
        );
        assert_eq!(bridge.caret_in(&region), Some(7));

        // Typing continues outside the bold run.
        bridge.insert_text("x").unwrap();
        assert_eq!(
            bridge.region_html(&region).as_deref(),
            Some("say <strong>hi</strong>&nbsp;x")
        );
    }

    #[test]
    fn test_apply_format_toggles() {
        let (mut bridge, region) = mounted("hello world");
        bridge.select_in_region(&region, 6, 11).unwrap();
        bridge.apply_format(FormatCommand::Italic).unwrap();
        assert_eq!(
            bridge.region_html(&region).as_deref(),
            Some("hello <em>world</em>")
        );

        bridge.apply_format(FormatCommand::Italic).unwrap();
        assert_eq!(bridge.region_html(&region).as_deref(), Some("hello world"));
    }

    #[test]
    fn test_collapsed_format_is_error() {
        let (mut bridge, region) = mounted("hello");
        bridge.select_in_region(&region, 2, 2).unwrap();
        assert_eq!(
            bridge.apply_format(FormatCommand::Bold),
            Err(BridgeError::NoSelection)
        );
    }

    #[test]
    fn test_geometry() {
        let mut bridge = MemoryBridge::with_geometry(10.0, 20.0);
        bridge.mount_region(RegionHandle::new("a"), "first");
        bridge.mount_region(RegionHandle::new("b"), "second line");
        bridge.select_in_region(&RegionHandle::new("b"), 2, 6).unwrap();

        let range = bridge.active_selection().unwrap().to_range();
        assert_eq!(
            bridge.bounding_rect_of(&range),
            Some(Rect::new(20.0, 20.0, 40.0, 20.0))
        );
    }

    #[test]
    fn test_unmount_drops_selection() {
        let (mut bridge, region) = mounted("x");
        bridge.collapse_region(&region, CaretEdge::End).unwrap();
        bridge.unmount_region(&region);
        assert!(bridge.active_selection().is_none());
        assert_eq!(
            bridge.collapse_region(&region, CaretEdge::End),
            Err(BridgeError::RegionNotMounted("r".into()))
        );
    }

    #[test]
    fn test_split_at_caret() {
        let (mut bridge, region) = mounted("ab<em>cd</em>");
        bridge.select_in_region(&region, 3, 3).unwrap();
        assert_eq!(
            bridge.split_at_caret(&region),
            Some(("ab<em>c</em>".to_string(), "<em>d</em>".to_string()))
        );

        bridge.clear_selection();
        assert_eq!(bridge.split_at_caret(&region), None);
    }

    #[test]
    fn test_stale_node_rejected() {
        let (mut bridge, region) = mounted("abc");
        bridge.collapse_region(&region, CaretEdge::End).unwrap();
        let old = bridge.active_selection().unwrap().anchor.node;
        bridge.insert_text("d").unwrap();
        assert!(matches!(
            bridge.set_caret(&old, 0),
            Err(BridgeError::NodeNotFound(_))
        ));
    }
}
