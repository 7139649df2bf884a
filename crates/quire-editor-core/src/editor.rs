//! Editor session: routes host events to the document operations.
//!
//! [`BlockEditor`] never owns the blocks. Every event receives the host's
//! current sequence and reports changes through an `on_change` callback
//! with the complete new sequence. Focus placement and toolbar state are
//! the only things it keeps between events.

use std::future::Future;

use crate::actions::{EditorAction, KeyCombo, Keybindings, KeydownResult};
use crate::autoformat::{detect_block_shortcut, detect_inline_shortcut, text_before};
use crate::block::{Block, BlockId, BlockType, IdGenerator, UuidIds, find};
use crate::config::EditorConfig;
use crate::document::{
    self, Edit, FocusRequest, SplitCapture, coerce_type, merge_with_previous, set_content,
};
use crate::error::PolishError;
use crate::export::{ExportOptions, serialize};
use crate::focus::{FocusController, FocusOutcome};
use crate::markup::{Marks, NBSP, plain_text};
use crate::platform::{ClipboardPlatform, FormatCommand, Fragment, SelectionBridge};
use crate::toolbar::{PointerPolicy, ToolbarController, ToolbarState};
use crate::types::{NodeRange, RegionHandle};

/// External service that rewrites a block's text (e.g. an AI polish call).
///
/// The editor treats it as opaque: plain text in, replacement content out.
pub trait TextPolisher {
    fn polish(&self, text: &str) -> impl Future<Output = Result<String, PolishError>>;
}

pub struct BlockEditor {
    config: EditorConfig,
    ids: Box<dyn IdGenerator>,
    keys: Keybindings,
    focus: FocusController,
    toolbar: ToolbarController,
}

impl BlockEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_ids(config, UuidIds)
    }

    pub fn with_ids(config: EditorConfig, ids: impl IdGenerator + 'static) -> Self {
        Self {
            focus: FocusController::new(config.focus.retries),
            toolbar: ToolbarController::new(config.toolbar),
            keys: Keybindings::default(),
            ids: Box::new(ids),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn keybindings_mut(&mut self) -> &mut Keybindings {
        &mut self.keys
    }

    pub fn focused_block(&self) -> Option<&BlockId> {
        self.focus.active()
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        self.toolbar.state()
    }

    pub fn region_of(&self, block: &BlockId) -> Option<&RegionHandle> {
        self.focus.region(block)
    }

    // === Region lifecycle ===

    pub fn mount_region(&mut self, block: BlockId, region: RegionHandle) {
        self.focus.mount(block, region);
    }

    pub fn unmount_region(&mut self, block: &BlockId) {
        self.focus.unmount(block);
    }

    /// Release every region handle (document unmount).
    pub fn teardown(&mut self) {
        self.focus.teardown();
        self.toolbar.hide();
    }

    /// Retry deferred focus. Call after the host has rendered.
    pub fn tick<B: SelectionBridge + ?Sized>(&mut self, bridge: &mut B) -> Option<FocusOutcome> {
        self.focus.tick(bridge)
    }

    pub fn focus_block<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        request: FocusRequest,
    ) -> FocusOutcome {
        self.focus.focus(bridge, request)
    }

    // === Keyboard ===

    /// Handle a keydown inside a block's region.
    ///
    /// Combos without a binding report `NotHandled`; bound keys the editor
    /// leaves to the host report `PassThrough`. Neither prevents the default.
    pub fn handle_key<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        block_id: &BlockId,
        combo: &KeyCombo,
        mut on_change: impl FnMut(Vec<Block>),
    ) -> KeydownResult {
        let Some(action) = self.keys.lookup(combo) else {
            return KeydownResult::NotHandled;
        };
        tracing::trace!(target: "quire::editor", block_id = %block_id, ?action, "keydown");

        if self.config.read_only && !matches!(action, EditorAction::Navigate(_)) {
            return KeydownResult::PassThrough;
        }

        match action {
            EditorAction::SplitBlock => {
                self.split(bridge, blocks, block_id, &mut on_change);
                KeydownResult::Handled
            }
            EditorAction::SoftBreak => KeydownResult::PassThrough,
            EditorAction::MergeBackward => self.merge(bridge, blocks, block_id, &mut on_change),
            EditorAction::Autoformat => self.autoformat(bridge, blocks, block_id, &mut on_change),
            EditorAction::Navigate(direction) => {
                match self.focus.navigate(blocks, direction, block_id) {
                    Some(request) => {
                        self.focus.focus(bridge, request);
                        KeydownResult::Handled
                    }
                    None => KeydownResult::PassThrough,
                }
            }
            EditorAction::Format(command) => {
                self.toolbar.on_selection_change(bridge);
                self.toolbar.apply(bridge, command);
                KeydownResult::Handled
            }
        }
    }

    fn split<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        block_id: &BlockId,
        on_change: &mut impl FnMut(Vec<Block>),
    ) {
        let region = self.focus.region(block_id).cloned();
        let capture = match &region {
            Some(region) => match bridge.split_at_caret(region) {
                Some((head, tail)) => SplitCapture::new(head, tail),
                None => SplitCapture::whole(bridge.region_html(region).unwrap_or_else(|| {
                    stored_content(blocks, block_id)
                })),
            },
            None => SplitCapture::whole(stored_content(blocks, block_id)),
        };

        let edit = document::split_at(blocks, block_id, &capture, self.ids.as_mut());
        if !edit.changed {
            return;
        }

        // The tail moved to the new block; drop it from the live region.
        if let Some(region) = region.as_ref().filter(|_| !capture.tail.is_empty()) {
            let head = stored_content(&edit.blocks, block_id);
            if let Err(e) = bridge.reset_region(region, &head) {
                tracing::warn!(target: "quire::editor", block_id = %block_id, error = %e, "failed to trim split region");
            }
        }
        self.emit(bridge, edit, on_change);
    }

    fn merge<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        block_id: &BlockId,
        on_change: &mut impl FnMut(Vec<Block>),
    ) -> KeydownResult {
        let region = self.focus.region(block_id).cloned();
        let live_text = region
            .as_ref()
            .and_then(|r| bridge.region_text(r))
            .unwrap_or_else(|| plain_text(&stored_content(blocks, block_id)));
        if !live_text.is_empty() {
            return KeydownResult::PassThrough;
        }

        // The stored content may lag behind the live region.
        let live_html = region
            .as_ref()
            .and_then(|r| bridge.region_html(r))
            .unwrap_or_default();
        let committed = set_content(blocks, block_id, &live_html);

        let edit = merge_with_previous(&committed.blocks, block_id);
        if !edit.changed {
            return KeydownResult::PassThrough;
        }
        self.focus.unmount(block_id);
        self.emit(bridge, edit, on_change);
        KeydownResult::Handled
    }

    fn autoformat<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        block_id: &BlockId,
        on_change: &mut impl FnMut(Vec<Block>),
    ) -> KeydownResult {
        if self.config.autoformat.block_shortcuts {
            if let Some(result) = self.block_shortcut(bridge, blocks, block_id, on_change) {
                return result;
            }
        }
        if self.config.autoformat.inline_shortcuts && self.inline_shortcut(bridge) {
            return KeydownResult::Handled;
        }
        KeydownResult::PassThrough
    }

    fn block_shortcut<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        block_id: &BlockId,
        on_change: &mut impl FnMut(Vec<Block>),
    ) -> Option<KeydownResult> {
        let current = find(blocks, block_id)?;
        let region = self.focus.region(block_id).cloned();
        let text = region
            .as_ref()
            .and_then(|r| bridge.region_text(r))
            .unwrap_or_else(|| plain_text(&current.content));

        let kind = detect_block_shortcut(&text, current.kind)?;
        tracing::debug!(target: "quire::editor", block_id = %block_id, %kind, "block shortcut");

        let edit = coerce_type(blocks, block_id, kind);
        if let Some(region) = &region {
            if let Err(e) = bridge.reset_region(region, "") {
                tracing::warn!(target: "quire::editor", block_id = %block_id, error = %e, "failed to clear region");
            }
        }
        if edit.changed {
            self.emit(bridge, edit, on_change);
        }
        Some(KeydownResult::Handled)
    }

    /// Replace an inline shortcut ending at the caret with a formatted run.
    fn inline_shortcut<B: SelectionBridge + ?Sized>(&mut self, bridge: &mut B) -> bool {
        let Some(selection) = bridge.active_selection() else {
            return false;
        };
        if !selection.is_collapsed() {
            return false;
        }
        let node = selection.anchor.node;
        if !bridge.is_text_node(&node) || !bridge.container_contains(&node) {
            return false;
        }
        let Some(text) = bridge.text_of(&node) else {
            return false;
        };
        let Some(found) = detect_inline_shortcut(text_before(&text, selection.anchor.offset)) else {
            return false;
        };

        let range = NodeRange::within(node, found.start, found.end);
        let fragments = [
            Fragment::new(found.captured, Marks::only(found.format)),
            Fragment::plain(NBSP.to_string()),
        ];
        match bridge.replace_range(&range, &fragments) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: "quire::editor", error = %e, "inline shortcut replacement failed");
                false
            }
        }
    }

    fn emit<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        edit: Edit,
        on_change: &mut impl FnMut(Vec<Block>),
    ) {
        self.focus.retain(&edit.blocks);
        on_change(edit.blocks);
        if let Some(request) = edit.focus {
            self.focus.focus(bridge, request);
        }
    }

    // === Focus & commit ===

    /// The host reports focus entering a block.
    pub fn handle_focus(&mut self, block_id: &BlockId) {
        self.focus.set_active(block_id.clone());
    }

    /// Commit the live content of a block losing focus.
    pub fn handle_blur<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &B,
        blocks: &[Block],
        block_id: &BlockId,
        on_change: impl FnMut(Vec<Block>),
    ) -> bool {
        let changed = self.commit_block(bridge, blocks, block_id, on_change);
        self.focus.clear_active(block_id);
        changed
    }

    /// Commit the live content of a block without moving focus.
    pub fn commit_block<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &B,
        blocks: &[Block],
        block_id: &BlockId,
        mut on_change: impl FnMut(Vec<Block>),
    ) -> bool {
        if self.config.read_only {
            return false;
        }
        let Some(html) = self
            .focus
            .region(block_id)
            .and_then(|r| bridge.region_html(r))
        else {
            return false;
        };
        let edit = set_content(blocks, block_id, &html);
        if edit.changed {
            tracing::trace!(target: "quire::editor", block_id = %block_id, "committed block");
            on_change(edit.blocks);
        }
        edit.changed
    }

    // === Toolbar ===

    pub fn handle_selection_change<B: SelectionBridge + ?Sized>(&mut self, bridge: &B) -> ToolbarState {
        if self.config.read_only {
            self.toolbar.hide();
            return ToolbarState::Hidden;
        }
        self.toolbar.on_selection_change(bridge)
    }

    pub fn toolbar_pointer_down(&self) -> PointerPolicy {
        self.toolbar.pointer_down()
    }

    /// Toolbar button press. Returns whether a command was issued.
    pub fn apply_format<B: SelectionBridge + ?Sized>(&mut self, bridge: &mut B, command: FormatCommand) -> bool {
        if self.config.read_only {
            return false;
        }
        self.toolbar.apply(bridge, command)
    }

    // === Explicit block commands ===

    /// Insert a new block after `after`. Returns its id.
    pub fn insert_block<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        after: &BlockId,
        kind: Option<BlockType>,
        mut on_change: impl FnMut(Vec<Block>),
    ) -> Option<BlockId> {
        if self.config.read_only {
            return None;
        }
        let edit = document::insert_after(blocks, after, kind, self.ids.as_mut());
        if !edit.changed {
            return None;
        }
        let new_id = edit.focus.as_ref().map(|f| f.block.clone());
        self.emit(bridge, edit, &mut on_change);
        new_id
    }

    pub fn delete_block<B: SelectionBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
        blocks: &[Block],
        block_id: &BlockId,
        mut on_change: impl FnMut(Vec<Block>),
    ) -> bool {
        if self.config.read_only {
            return false;
        }
        let edit = document::remove(blocks, block_id);
        if !edit.changed {
            return false;
        }
        self.emit(bridge, edit, &mut on_change);
        true
    }

    pub fn toggle_checked(
        &mut self,
        blocks: &[Block],
        block_id: &BlockId,
        mut on_change: impl FnMut(Vec<Block>),
    ) -> bool {
        if self.config.read_only {
            return false;
        }
        let edit = document::toggle_checked(blocks, block_id);
        if edit.changed {
            on_change(edit.blocks);
            return true;
        }
        false
    }

    // === Export ===

    /// Serialize the page and put it on the clipboard. Works in read-only mode.
    pub fn copy_page(&self, blocks: &[Block], clipboard: &impl ClipboardPlatform) -> String {
        let text = serialize(blocks, &ExportOptions::from(self.config.export));
        clipboard.write_text(&text);
        text
    }

    /// Run a block through an external polish service.
    ///
    /// Returns the new sequence on success. On failure nothing is modified.
    pub async fn polish_block<P: TextPolisher + ?Sized>(
        &self,
        blocks: &[Block],
        block_id: &BlockId,
        polisher: &P,
    ) -> Result<Vec<Block>, PolishError> {
        if self.config.read_only {
            return Err(PolishError::ReadOnly);
        }
        let block =
            find(blocks, block_id).ok_or_else(|| PolishError::BlockNotFound(block_id.to_string()))?;
        let text = plain_text(&block.content);

        match polisher.polish(&text).await {
            Ok(polished) => Ok(set_content(blocks, block_id, &polished).blocks),
            Err(e) => {
                tracing::warn!(target: "quire::editor", block_id = %block_id, error = %e, "polish failed");
                Err(e)
            }
        }
    }
}

fn stored_content(blocks: &[Block], id: &BlockId) -> String {
    find(blocks, id).map(|b| b.content.clone()).unwrap_or_default()
}
