//! Editor configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AutoformatConfig {
    /// `#`, `##`, `-`, `[]` followed by Space.
    pub block_shortcuts: bool,
    /// `**x**`, `*x*`, `~x~` followed by Space.
    pub inline_shortcuts: bool,
}

impl Default for AutoformatConfig {
    fn default() -> Self {
        Self {
            block_shortcuts: true,
            inline_shortcuts: true,
        }
    }
}

/// Size of the floating toolbar, used to position it over a selection.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ToolbarConfig {
    pub width: f64,
    pub height: f64,
    /// Space between the toolbar's bottom edge and the selection.
    pub gap: f64,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            width: 180.0,
            height: 36.0,
            gap: 8.0,
        }
    }
}

/// What export does with inline formatting tags.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InlineMarkup {
    /// Drop tags and decode entities.
    #[default]
    Strip,
    /// Keep block content verbatim.
    Preserve,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ExportConfig {
    pub inline_markup: InlineMarkup,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct FocusConfig {
    /// Render passes a focus request waits for its target to mount.
    pub retries: u8,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self { retries: 1 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EditorConfig {
    pub read_only: bool,
    pub autoformat: AutoformatConfig,
    pub toolbar: ToolbarConfig,
    pub export: ExportConfig,
    pub focus: FocusConfig,
}

impl EditorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }
}
