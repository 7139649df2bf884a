//! Headless host: the editor wired to an in-memory bridge.
//!
//! The session plays the host's role. It owns the blocks, renders regions
//! into a [`MemoryBridge`] after every change, and performs the native
//! default action (typing, soft breaks, deletion) for keys the editor lets
//! through.

use std::collections::HashMap;

use crate::actions::{Key, KeyCombo, KeydownResult};
use crate::block::{Block, BlockId, position};
use crate::document::FocusRequest;
use crate::editor::BlockEditor;
use crate::error::BridgeError;
use crate::memory::MemoryBridge;
use crate::platform::{ClipboardPlatform, FormatCommand, SelectionBridge};
use crate::toolbar::ToolbarState;
use crate::types::RegionHandle;

/// One step of a scripted editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Text(String),
    Key(KeyCombo),
}

/// Parse a replay script: literal text with `{enter}`, `{shift+enter}`,
/// `{backspace}`, `{up}` and `{down}` tokens. Unknown tokens are typed
/// literally.
pub fn parse_script(script: &str) -> Vec<ScriptStep> {
    let mut steps = Vec::new();
    let mut text = String::new();
    let mut rest = script;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('}') else {
            rest = after;
            break;
        };
        let token = &after[1..close];
        let combo = match token.to_ascii_lowercase().as_str() {
            "enter" => Some(KeyCombo::new(Key::Enter)),
            "shift+enter" => Some(KeyCombo::shift(Key::Enter)),
            "backspace" => Some(KeyCombo::new(Key::Backspace)),
            "up" => Some(KeyCombo::new(Key::ArrowUp)),
            "down" => Some(KeyCombo::new(Key::ArrowDown)),
            _ => None,
        };
        match combo {
            Some(combo) => {
                if !text.is_empty() {
                    steps.push(ScriptStep::Text(std::mem::take(&mut text)));
                }
                steps.push(ScriptStep::Key(combo));
            }
            None => text.push_str(&after[..=close]),
        }
        rest = &after[close + 1..];
    }
    text.push_str(rest);
    if !text.is_empty() {
        steps.push(ScriptStep::Text(text));
    }
    steps
}

pub struct HeadlessSession {
    blocks: Vec<Block>,
    editor: BlockEditor,
    bridge: MemoryBridge,
    /// Content last written into each mounted region.
    rendered: HashMap<BlockId, String>,
}

impl HeadlessSession {
    pub fn new(editor: BlockEditor, blocks: Vec<Block>) -> Self {
        let mut session = Self {
            blocks,
            editor,
            bridge: MemoryBridge::new(),
            rendered: HashMap::new(),
        };
        session.render();
        session
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn editor(&self) -> &BlockEditor {
        &self.editor
    }

    pub fn bridge(&self) -> &MemoryBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut MemoryBridge {
        &mut self.bridge
    }

    /// Sync mounted regions with the block sequence, then let deferred
    /// focus land.
    pub fn render(&mut self) {
        let stale: Vec<BlockId> = self
            .rendered
            .keys()
            .filter(|id| position(&self.blocks, id).is_none())
            .cloned()
            .collect();
        for id in stale {
            self.bridge.unmount_region(&RegionHandle::for_block(&id));
            self.editor.unmount_region(&id);
            self.rendered.remove(&id);
        }

        let caret_region = self.bridge.selection_region();
        for block in &self.blocks {
            let region = RegionHandle::for_block(&block.id);
            match self.rendered.get(&block.id) {
                None => {
                    self.bridge.mount_region(region.clone(), &block.content);
                    self.editor.mount_region(block.id.clone(), region);
                }
                // Never rewrite the region under the caret.
                Some(prev) if *prev != block.content && caret_region.as_ref() != Some(&region) => {
                    self.bridge.mount_region(region, &block.content);
                }
                Some(_) => continue,
            }
            self.rendered.insert(block.id.clone(), block.content.clone());
        }

        let order: Vec<RegionHandle> = self
            .blocks
            .iter()
            .map(|b| RegionHandle::for_block(&b.id))
            .collect();
        self.bridge.arrange(&order);
        self.editor.tick(&mut self.bridge);
    }

    /// Put the caret at the end of a block.
    pub fn focus_end(&mut self, id: &BlockId) {
        self.editor.focus_block(&mut self.bridge, FocusRequest::end(id.clone()));
    }

    pub fn focus_start(&mut self, id: &BlockId) {
        self.editor
            .focus_block(&mut self.bridge, FocusRequest::start(id.clone()));
    }

    /// Type text key by key.
    pub fn type_text(&mut self, text: &str) -> Result<(), BridgeError> {
        for c in text.chars() {
            self.press(KeyCombo::new(Key::character(c.to_string())))?;
        }
        Ok(())
    }

    /// Dispatch a keydown, then perform the native action if the editor let
    /// it through.
    pub fn press(&mut self, combo: KeyCombo) -> Result<KeydownResult, BridgeError> {
        let block_id = self
            .editor
            .focused_block()
            .cloned()
            .ok_or(BridgeError::NoSelection)?;

        let mut changed = None;
        let result = self.editor.handle_key(
            &mut self.bridge,
            &self.blocks,
            &block_id,
            &combo,
            |next| changed = Some(next),
        );
        if let Some(next) = changed {
            self.blocks = next;
        }

        if result != KeydownResult::Handled && !self.editor.config().read_only {
            match &combo.key {
                Key::Character(s) if !combo.modifiers.ctrl && !combo.modifiers.meta => {
                    self.bridge.insert_text(s)?
                }
                Key::Space => self.bridge.insert_text(" ")?,
                Key::Enter if combo.modifiers.shift => self.bridge.insert_line_break()?,
                Key::Backspace => self.bridge.delete_backward()?,
                _ => {}
            }
        }

        self.render();

        // Focus moved away: the host's blur commits the block left behind.
        if self.editor.focused_block() != Some(&block_id)
            && position(&self.blocks, &block_id).is_some()
        {
            let mut committed = None;
            self.editor
                .commit_block(&self.bridge, &self.blocks, &block_id, |next| committed = Some(next));
            if let Some(next) = committed {
                self.blocks = next;
                self.render();
            }
        }

        self.editor.handle_selection_change(&self.bridge);
        Ok(result)
    }

    pub fn replay(&mut self, steps: &[ScriptStep]) -> Result<(), BridgeError> {
        for step in steps {
            match step {
                ScriptStep::Text(text) => self.type_text(text)?,
                ScriptStep::Key(combo) => {
                    self.press(combo.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Commit the focused block's live content.
    pub fn commit(&mut self) -> bool {
        let Some(id) = self.editor.focused_block().cloned() else {
            return false;
        };
        let mut changed = None;
        self.editor
            .commit_block(&self.bridge, &self.blocks, &id, |next| changed = Some(next));
        self.apply(changed)
    }

    /// Blur the focused block, committing it.
    pub fn blur(&mut self) -> bool {
        let Some(id) = self.editor.focused_block().cloned() else {
            return false;
        };
        let mut changed = None;
        self.editor
            .handle_blur(&self.bridge, &self.blocks, &id, |next| changed = Some(next));
        self.bridge.clear_selection();
        self.apply(changed)
    }

    /// Select a char range inside a block and update the toolbar.
    pub fn select(&mut self, id: &BlockId, start: usize, end: usize) -> Result<ToolbarState, BridgeError> {
        self.bridge
            .select_in_region(&RegionHandle::for_block(id), start, end)?;
        self.editor.handle_focus(id);
        Ok(self.editor.handle_selection_change(&self.bridge))
    }

    pub fn apply_format(&mut self, command: FormatCommand) -> bool {
        self.editor.apply_format(&mut self.bridge, command)
    }

    pub fn copy_page(&self, clipboard: &impl ClipboardPlatform) -> String {
        self.editor.copy_page(&self.blocks, clipboard)
    }

    /// Live markup of a block's region.
    pub fn live_html(&self, id: &BlockId) -> Option<String> {
        self.bridge.region_html(&RegionHandle::for_block(id))
    }

    fn apply(&mut self, changed: Option<Vec<Block>>) -> bool {
        let Some(next) = changed else {
            self.render();
            return false;
        };
        self.blocks = next;
        self.render();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SequentialIds;
    use crate::config::EditorConfig;

    #[test]
    fn test_parse_script() {
        let steps = parse_script("# Hello{enter}World{shift+enter}x{bogus}{backspace}");
        assert_eq!(
            steps,
            vec![
                ScriptStep::Text("# Hello".into()),
                ScriptStep::Key(KeyCombo::new(Key::Enter)),
                ScriptStep::Text("World".into()),
                ScriptStep::Key(KeyCombo::shift(Key::Enter)),
                ScriptStep::Text("x{bogus}".into()),
                ScriptStep::Key(KeyCombo::new(Key::Backspace)),
            ]
        );
        assert_eq!(
            parse_script("open {brace"),
            vec![ScriptStep::Text("open {brace".into())]
        );
        assert!(parse_script("").is_empty());
    }

    #[test]
    fn test_session_renders_and_unmounts() {
        let editor = BlockEditor::with_ids(EditorConfig::default(), SequentialIds::default());
        let blocks = vec![
            Block::paragraph("a".into()).with_content("one"),
            Block::paragraph("b".into()),
        ];
        let mut session = HeadlessSession::new(editor, blocks);
        assert!(session.bridge().is_mounted(&RegionHandle::for_block(&"b".into())));

        session.focus_end(&"b".into());
        session.press(KeyCombo::new(Key::Backspace)).unwrap();
        assert_eq!(session.blocks().len(), 1);
        assert!(!session.bridge().is_mounted(&RegionHandle::for_block(&"b".into())));
        assert_eq!(session.editor().focused_block(), Some(&"a".into()));
    }

    #[test]
    fn test_press_without_focus() {
        let editor = BlockEditor::with_ids(EditorConfig::default(), SequentialIds::default());
        let mut session = HeadlessSession::new(editor, vec![Block::paragraph("a".into())]);
        assert_eq!(
            session.press(KeyCombo::new(Key::Enter)),
            Err(BridgeError::NoSelection)
        );
    }
}
