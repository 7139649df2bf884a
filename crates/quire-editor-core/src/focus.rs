//! Focus tracking and caret placement across block regions.
//!
//! The controller owns the table of mounted regions for one open document.
//! Handles are added as the host mounts block regions and dropped when blocks
//! are destroyed or the document unmounts.
//!
//! A focus request for a block whose region has not mounted yet (a block
//! created by the same keystroke) is parked and retried on the next
//! [`FocusController::tick`], after the host has rendered.

use std::collections::HashMap;

use crate::block::{Block, BlockId, position};
use crate::document::FocusRequest;
use crate::platform::SelectionBridge;
use crate::types::{Direction, RegionHandle};

/// What happened to a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Caret placed in the target region.
    Placed,
    /// Target not mounted yet; will retry on the next tick.
    Deferred,
    /// Target never showed up, or the bridge refused.
    Dropped,
}

#[derive(Debug, Clone)]
struct PendingFocus {
    request: FocusRequest,
    retries_left: u8,
}

/// Per-document focus state.
#[derive(Debug)]
pub struct FocusController {
    regions: HashMap<BlockId, RegionHandle>,
    active: Option<BlockId>,
    pending: Option<PendingFocus>,
    retries: u8,
}

impl Default for FocusController {
    fn default() -> Self {
        Self::new(1)
    }
}

impl FocusController {
    /// `retries` is how many ticks a request for an unmounted block survives.
    pub fn new(retries: u8) -> Self {
        Self {
            regions: HashMap::new(),
            active: None,
            pending: None,
            retries,
        }
    }

    /// Register the editable region rendered for a block.
    pub fn mount(&mut self, block: BlockId, region: RegionHandle) {
        tracing::trace!(target: "quire::focus", block_id = %block, region = %region, "mounted region");
        self.regions.insert(block, region);
    }

    /// Release the region of a destroyed block.
    pub fn unmount(&mut self, block: &BlockId) {
        self.regions.remove(block);
        if self.active.as_ref() == Some(block) {
            self.active = None;
        }
    }

    /// Release handles of every block not in `blocks`.
    pub fn retain(&mut self, blocks: &[Block]) {
        self.regions.retain(|id, _| position(blocks, id).is_some());
        if let Some(active) = &self.active {
            if position(blocks, active).is_none() {
                self.active = None;
            }
        }
    }

    /// Release everything (document unmount).
    pub fn teardown(&mut self) {
        self.regions.clear();
        self.active = None;
        self.pending = None;
    }

    pub fn region(&self, block: &BlockId) -> Option<&RegionHandle> {
        self.regions.get(block)
    }

    pub fn is_mounted(&self, block: &BlockId) -> bool {
        self.regions.contains_key(block)
    }

    pub fn active(&self) -> Option<&BlockId> {
        self.active.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The host reports that a block's region received focus.
    pub fn set_active(&mut self, block: BlockId) {
        self.active = Some(block);
    }

    /// The host reports that a block's region lost focus.
    pub fn clear_active(&mut self, block: &BlockId) {
        if self.active.as_ref() == Some(block) {
            self.active = None;
        }
    }

    /// Move focus to a block and collapse the caret at the requested edge.
    ///
    /// Safe to call before the target region exists: the request then waits
    /// for the next [`tick`](Self::tick). A newer request replaces a parked
    /// one.
    pub fn focus<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        request: FocusRequest,
    ) -> FocusOutcome {
        let Some(region) = self.regions.get(&request.block).cloned() else {
            tracing::trace!(
                target: "quire::focus",
                block_id = %request.block,
                "region not mounted, deferring focus"
            );
            self.pending = Some(PendingFocus {
                request,
                retries_left: self.retries,
            });
            return FocusOutcome::Deferred;
        };

        self.pending = None;
        match bridge.collapse_region(&region, request.edge) {
            Ok(()) => {
                self.active = Some(request.block);
                FocusOutcome::Placed
            }
            Err(e) => {
                tracing::warn!(
                    target: "quire::focus",
                    block_id = %request.block,
                    error = %e,
                    "failed to place caret"
                );
                FocusOutcome::Dropped
            }
        }
    }

    /// Retry a parked request. Call after the host has rendered.
    pub fn tick<B: SelectionBridge + ?Sized>(&mut self, bridge: &mut B) -> Option<FocusOutcome> {
        let pending = self.pending.take()?;

        if self.regions.contains_key(&pending.request.block) {
            return Some(self.focus(bridge, pending.request));
        }
        if pending.retries_left > 1 {
            self.pending = Some(PendingFocus {
                retries_left: pending.retries_left - 1,
                ..pending
            });
            return Some(FocusOutcome::Deferred);
        }

        tracing::debug!(
            target: "quire::focus",
            block_id = %pending.request.block,
            "focus target never mounted, dropping request"
        );
        Some(FocusOutcome::Dropped)
    }

    /// The block adjacent to `from`, or `None` at the document boundary.
    ///
    /// Moving up lands at the end of the previous block, moving down at the
    /// start of the next.
    pub fn navigate(
        &self,
        blocks: &[Block],
        direction: Direction,
        from: &BlockId,
    ) -> Option<FocusRequest> {
        let idx = position(blocks, from)?;
        match direction {
            Direction::Up => idx
                .checked_sub(1)
                .map(|prev| FocusRequest::end(blocks[prev].id.clone())),
            Direction::Down => blocks
                .get(idx + 1)
                .map(|next| FocusRequest::start(next.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;
    use crate::memory::MemoryBridge;
    use crate::types::CaretEdge;

    fn blocks() -> Vec<Block> {
        ["a", "b", "c"]
            .into_iter()
            .map(|id| Block::new(id.into(), BlockType::Paragraph).with_content(id))
            .collect()
    }

    fn mounted(bridge: &mut MemoryBridge, focus: &mut FocusController, blocks: &[Block]) {
        for block in blocks {
            let region = RegionHandle::for_block(&block.id);
            bridge.mount_region(region.clone(), &block.content);
            focus.mount(block.id.clone(), region);
        }
    }

    #[test]
    fn test_focus_places_caret() {
        let blocks = blocks();
        let mut bridge = MemoryBridge::new();
        let mut focus = FocusController::default();
        mounted(&mut bridge, &mut focus, &blocks);

        let outcome = focus.focus(&mut bridge, FocusRequest::end("b".into()));
        assert_eq!(outcome, FocusOutcome::Placed);
        assert_eq!(focus.active(), Some(&"b".into()));
        assert_eq!(
            bridge.caret_in(&RegionHandle::for_block(&"b".into())),
            Some(1)
        );

        // Idempotent.
        let outcome = focus.focus(&mut bridge, FocusRequest::end("b".into()));
        assert_eq!(outcome, FocusOutcome::Placed);
        assert_eq!(
            bridge.caret_in(&RegionHandle::for_block(&"b".into())),
            Some(1)
        );
    }

    #[test]
    fn test_focus_deferred_until_mounted() {
        let blocks = blocks();
        let mut bridge = MemoryBridge::new();
        let mut focus = FocusController::default();

        let request = FocusRequest {
            block: "a".into(),
            edge: CaretEdge::Start,
        };
        assert_eq!(focus.focus(&mut bridge, request), FocusOutcome::Deferred);
        assert!(focus.has_pending());

        mounted(&mut bridge, &mut focus, &blocks);
        assert_eq!(focus.tick(&mut bridge), Some(FocusOutcome::Placed));
        assert_eq!(focus.active(), Some(&"a".into()));
        assert_eq!(focus.tick(&mut bridge), None);
    }

    #[test]
    fn test_focus_dropped_after_retries() {
        let mut bridge = MemoryBridge::new();
        let mut focus = FocusController::new(2);

        focus.focus(&mut bridge, FocusRequest::start("ghost".into()));
        assert_eq!(focus.tick(&mut bridge), Some(FocusOutcome::Deferred));
        assert_eq!(focus.tick(&mut bridge), Some(FocusOutcome::Dropped));
        assert!(!focus.has_pending());
    }

    #[test]
    fn test_navigate_boundaries() {
        let blocks = blocks();
        let focus = FocusController::default();

        assert_eq!(focus.navigate(&blocks, Direction::Up, &"a".into()), None);
        assert_eq!(focus.navigate(&blocks, Direction::Down, &"c".into()), None);
        assert_eq!(
            focus.navigate(&blocks, Direction::Down, &"a".into()),
            Some(FocusRequest::start("b".into()))
        );
        assert_eq!(
            focus.navigate(&blocks, Direction::Up, &"c".into()),
            Some(FocusRequest::end("b".into()))
        );
    }

    #[test]
    fn test_retain_releases_destroyed() {
        let blocks = blocks();
        let mut bridge = MemoryBridge::new();
        let mut focus = FocusController::default();
        mounted(&mut bridge, &mut focus, &blocks);
        focus.set_active("c".into());

        focus.retain(&blocks[..2]);
        assert!(!focus.is_mounted(&"c".into()));
        assert!(focus.is_mounted(&"a".into()));
        assert_eq!(focus.active(), None);

        focus.teardown();
        assert!(!focus.is_mounted(&"a".into()));
    }
}
