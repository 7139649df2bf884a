use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use quire_editor_core::{
    Block, BlockEditor, EditorConfig, ExportOptions, HeadlessSession, IdGenerator, InlineMarkup,
    UuidIds, new_document, parse_script, serialize,
};
use serde::Deserialize;

#[derive(Parser)]
#[command(version, about = "Quire - headless block editor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file (defaults to <config dir>/quire/config.toml)
    #[arg(long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a block document as plain text
    Export {
        /// Block document (JSON array)
        doc: PathBuf,

        /// Keep inline formatting tags in the output
        #[arg(long)]
        preserve_markup: bool,
    },
    /// Replay typed input against a block document
    Replay {
        /// Block document (JSON array)
        doc: PathBuf,

        /// Input script: text with {enter}, {shift+enter}, {backspace}, {up}, {down}
        #[arg(long)]
        input: String,

        /// Write the resulting document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a new empty document
    New,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LogConfig {
    level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LogSection {
    log: LogConfig,
}

struct Settings {
    editor: EditorConfig,
    log_level: String,
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings.log_level);

    match cli.command {
        Commands::Export {
            doc,
            preserve_markup,
        } => {
            let blocks = load_document(&doc)?;
            let mut options = ExportOptions::from(settings.editor.export);
            if preserve_markup {
                options.inline_markup = InlineMarkup::Preserve;
            }
            println!("{}", serialize(&blocks, &options));
        }
        Commands::Replay { doc, input, out } => {
            let blocks = load_document(&doc)?;
            let result = replay(settings.editor, blocks, &input, UuidIds)?;
            let json = serde_json::to_string_pretty(&result).into_diagnostic()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), blocks = result.len(), "wrote document");
                }
                None => println!("{json}"),
            }
        }
        Commands::New => {
            let blocks = new_document(&mut UuidIds);
            println!("{}", serde_json::to_string_pretty(&blocks).into_diagnostic()?);
        }
    }

    Ok(())
}

/// Replay a script against a document. New blocks draw ids from `ids`, which
/// must not repeat across runs on the same persisted document.
fn replay(
    config: EditorConfig,
    blocks: Vec<Block>,
    input: &str,
    ids: impl IdGenerator + 'static,
) -> Result<Vec<Block>> {
    let last = blocks
        .last()
        .map(|b| b.id.clone())
        .ok_or_else(|| miette::miette!("document has no blocks"))?;

    let editor = BlockEditor::with_ids(config, ids);
    let mut session = HeadlessSession::new(editor, blocks);
    session.focus_end(&last);

    let steps = parse_script(input);
    tracing::debug!(steps = steps.len(), "replaying input");
    session.replay(&steps).into_diagnostic()?;
    session.commit();
    Ok(session.into_blocks())
}

fn load_document(path: &Path) -> Result<Vec<Block>> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_document(&text).wrap_err_with(|| format!("invalid block document {}", path.display()))
}

fn parse_document(text: &str) -> Result<Vec<Block>> {
    let blocks: Vec<Block> = serde_json::from_str(text).into_diagnostic()?;
    if blocks.is_empty() {
        miette::bail!("document has no blocks");
    }
    Ok(blocks)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quire").join("config.toml"))
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|p| p.exists()),
    };
    let Some(path) = path else {
        return parse_settings("");
    };

    let text = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("error reading config file {}", path.display()))?;
    parse_settings(&text).wrap_err_with(|| format!("error parsing config file {}", path.display()))
}

fn parse_settings(text: &str) -> Result<Settings> {
    let editor = EditorConfig::from_toml_str(text).into_diagnostic()?;
    let log: LogSection = toml::from_str(text).into_diagnostic()?;
    Ok(Settings {
        editor,
        log_level: log.log.level.unwrap_or_else(|| "info".to_string()),
    })
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_editor_core::{BlockType, SequentialIds};

    #[test]
    fn test_settings_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.editor, EditorConfig::default());
    }

    #[test]
    fn test_settings_with_log_section() {
        let settings = parse_settings(
            r#"
read_only = true

[log]
level = "quire=trace"

[export]
inline_markup = "preserve"
"#,
        )
        .unwrap();
        assert_eq!(settings.log_level, "quire=trace");
        assert!(settings.editor.read_only);
        assert_eq!(settings.editor.export.inline_markup, InlineMarkup::Preserve);
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(parse_document("[]").is_err());
        assert!(parse_document("{").is_err());
    }

    #[test]
    fn test_replay_script() {
        let blocks = parse_document(r#"[{"id": "a", "type": "paragraph", "content": ""}]"#).unwrap();
        let result = replay(
            EditorConfig::default(),
            blocks,
            "## Plan{enter}[] write it",
            SequentialIds::default(),
        )
        .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].kind, BlockType::Heading2);
        assert_eq!(result[0].content, "Plan");
        assert_eq!(result[1].kind, BlockType::Todo);
        assert_eq!(result[1].content, "write it");
        assert_eq!(result[1].id.as_str(), "b1");
    }

    #[test]
    fn test_replay_runs_never_reuse_ids() {
        let doc = r#"[{"id": "a", "type": "paragraph", "content": "x"}]"#;
        let first = replay(EditorConfig::default(), parse_document(doc).unwrap(), "{enter}", UuidIds)
            .unwrap();
        // The block added by the first run was deleted before the second.
        let second = replay(EditorConfig::default(), parse_document(doc).unwrap(), "{enter}", UuidIds)
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_ne!(first[1].id, second[1].id);
        assert_ne!(second[1].id.as_str(), "a");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["quire", "export", "doc.json", "--preserve-markup"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export {
                preserve_markup: true,
                ..
            }
        ));
    }
}
