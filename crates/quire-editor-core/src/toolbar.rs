//! Floating formatting toolbar.
//!
//! The toolbar follows the native selection: it shows above a non-empty
//! selection inside the editor container and hides otherwise. Commands act
//! on the native selection, so pressing a toolbar button must not move it.

use crate::config::ToolbarConfig;
use crate::platform::{FormatCommand, SelectionBridge};
use crate::types::{Rect, ScreenPoint};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolbarState {
    #[default]
    Hidden,
    Shown {
        /// Bounding box of the selection.
        anchor: Rect,
        /// Top-left corner of the toolbar.
        position: ScreenPoint,
    },
}

impl ToolbarState {
    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Shown { .. })
    }
}

/// What the host should do with a pointer-down on the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPolicy {
    /// Suppress the default action so the native selection survives.
    PreventDefault,
    Allow,
}

#[derive(Debug, Default)]
pub struct ToolbarController {
    config: ToolbarConfig,
    state: ToolbarState,
}

impl ToolbarController {
    pub fn new(config: ToolbarConfig) -> Self {
        Self {
            config,
            state: ToolbarState::Hidden,
        }
    }

    pub fn state(&self) -> ToolbarState {
        self.state
    }

    pub fn hide(&mut self) {
        self.state = ToolbarState::Hidden;
    }

    /// Recompute visibility and position from the current selection.
    pub fn on_selection_change<B: SelectionBridge + ?Sized>(&mut self, bridge: &B) -> ToolbarState {
        self.state = self.compute(bridge);
        tracing::trace!(target: "quire::toolbar", state = ?self.state, "selection changed");
        self.state
    }

    fn compute<B: SelectionBridge + ?Sized>(&self, bridge: &B) -> ToolbarState {
        let Some(selection) = bridge.active_selection() else {
            return ToolbarState::Hidden;
        };
        if selection.is_collapsed() {
            return ToolbarState::Hidden;
        }
        if !bridge.container_contains(&selection.anchor.node)
            || !bridge.container_contains(&selection.focus.node)
        {
            return ToolbarState::Hidden;
        }
        let Some(anchor) = bridge.bounding_rect_of(&selection.to_range()) else {
            return ToolbarState::Hidden;
        };

        ToolbarState::Shown {
            anchor,
            position: self.position_for(anchor),
        }
    }

    /// Above the selection, horizontally centered on it.
    pub fn position_for(&self, anchor: Rect) -> ScreenPoint {
        ScreenPoint {
            x: anchor.center_x() - self.config.width / 2.0,
            y: anchor.y - self.config.height - self.config.gap,
        }
    }

    pub fn pointer_down(&self) -> PointerPolicy {
        PointerPolicy::PreventDefault
    }

    /// Issue a format command against the native selection.
    ///
    /// Returns whether a command was issued. Nothing happens while hidden.
    pub fn apply<B: SelectionBridge + ?Sized>(&mut self, bridge: &mut B, command: FormatCommand) -> bool {
        if !self.state.is_shown() {
            tracing::trace!(target: "quire::toolbar", ?command, "toolbar hidden, ignoring command");
            return false;
        }
        if let Err(e) = bridge.apply_format(command) {
            tracing::warn!(target: "quire::toolbar", ?command, error = %e, "format command failed");
            return false;
        }
        // Formatting changes geometry; follow the selection.
        self.on_selection_change(bridge);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBridge;
    use crate::types::RegionHandle;

    fn bridge_with(text: &str) -> (MemoryBridge, RegionHandle) {
        let mut bridge = MemoryBridge::new();
        let region = RegionHandle::new("r1");
        bridge.mount_region(region.clone(), text);
        (bridge, region)
    }

    #[test]
    fn test_hidden_without_selection() {
        let (bridge, _) = bridge_with("hello");
        let mut toolbar = ToolbarController::default();
        assert_eq!(toolbar.on_selection_change(&bridge), ToolbarState::Hidden);
    }

    #[test]
    fn test_hidden_when_collapsed() {
        let (mut bridge, region) = bridge_with("hello");
        bridge.select_in_region(&region, 2, 2).unwrap();
        let mut toolbar = ToolbarController::default();
        assert_eq!(toolbar.on_selection_change(&bridge), ToolbarState::Hidden);
    }

    #[test]
    fn test_shown_above_selection() {
        let (mut bridge, region) = bridge_with("hello world");
        bridge.select_in_region(&region, 0, 5).unwrap();
        let mut toolbar = ToolbarController::new(ToolbarConfig::default());

        let ToolbarState::Shown { anchor, position } = toolbar.on_selection_change(&bridge) else {
            panic!("toolbar should be shown");
        };
        assert_eq!(position.x, anchor.center_x() - 90.0);
        assert_eq!(position.y, anchor.y - 36.0 - 8.0);
    }

    #[test]
    fn test_hidden_outside_container() {
        let (mut bridge, region) = bridge_with("hello");
        bridge.set_in_container(&region, false);
        bridge.select_in_region(&region, 0, 5).unwrap();
        let mut toolbar = ToolbarController::default();
        assert_eq!(toolbar.on_selection_change(&bridge), ToolbarState::Hidden);
    }

    #[test]
    fn test_apply_requires_shown() {
        let (mut bridge, region) = bridge_with("hello");
        let mut toolbar = ToolbarController::default();
        assert!(!toolbar.apply(&mut bridge, FormatCommand::Bold));
        assert_eq!(bridge.region_html(&region).as_deref(), Some("hello"));

        bridge.select_in_region(&region, 0, 5).unwrap();
        toolbar.on_selection_change(&bridge);
        assert!(toolbar.apply(&mut bridge, FormatCommand::Bold));
        assert_eq!(
            bridge.region_html(&region).as_deref(),
            Some("<strong>hello</strong>")
        );
    }

    #[test]
    fn test_pointer_down_keeps_selection() {
        let toolbar = ToolbarController::default();
        assert_eq!(toolbar.pointer_down(), PointerPolicy::PreventDefault);
    }
}
