//! quire-editor-core: block-structured rich-text editor logic without
//! framework dependencies.
//!
//! This crate provides:
//! - `Block` / `BlockType` - the host-owned document model
//! - Document operations (split, merge, insert, coerce, remove) over `&[Block]`
//! - Autoformat detection for markdown-style shortcuts
//! - `SelectionBridge` / `ClipboardPlatform` traits the host runtime implements
//! - `BlockEditor` - the event-driven session tying it together
//! - `MemoryBridge` / `HeadlessSession` - an in-memory host for tests and tools

pub mod actions;
pub mod autoformat;
pub mod block;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod focus;
pub mod headless;
pub mod markup;
pub mod memory;
pub mod platform;
pub mod sanitize;
pub mod toolbar;
pub mod types;

pub use actions::{EditorAction, Key, KeyCombo, Keybindings, KeydownResult, Modifiers};
pub use autoformat::{InlineMatch, detect_block_shortcut, detect_inline_shortcut};
pub use block::{
    Block, BlockId, BlockType, IdGenerator, SequentialIds, UuidIds, fresh_id, new_document,
};
pub use config::{EditorConfig, InlineMarkup};
pub use document::{Edit, FocusRequest, SplitCapture};
pub use editor::{BlockEditor, TextPolisher};
pub use error::{BridgeError, ConfigError, PolishError};
pub use export::{ExportOptions, serialize};
pub use focus::{FocusController, FocusOutcome};
pub use headless::{HeadlessSession, ScriptStep, parse_script};
pub use markup::{InlineFormat, Marks};
pub use memory::MemoryBridge;
pub use platform::{ClipboardPlatform, FormatCommand, Fragment, MemoryClipboard, SelectionBridge};
pub use sanitize::commit_content;
pub use smol_str::SmolStr;
pub use toolbar::{PointerPolicy, ToolbarController, ToolbarState};
pub use types::{
    ActiveSelection, CaretEdge, Direction, NodeId, NodeRange, Rect, RegionHandle, ScreenPoint,
    SelectionPoint,
};
