//! Plain-text serialization for copy and export.

use crate::block::{Block, BlockType};
use crate::config::InlineMarkup;
use crate::markup::plain_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub inline_markup: InlineMarkup,
}

impl ExportOptions {
    pub fn preserve_markup() -> Self {
        Self {
            inline_markup: InlineMarkup::Preserve,
        }
    }
}

impl From<crate::config::ExportConfig> for ExportOptions {
    fn from(config: crate::config::ExportConfig) -> Self {
        Self {
            inline_markup: config.inline_markup,
        }
    }
}

fn prefix(block: &Block) -> &'static str {
    match block.kind {
        BlockType::Todo if block.checked => "[x] ",
        BlockType::Todo => "[ ] ",
        BlockType::Bullet => "- ",
        BlockType::Heading1 => "# ",
        BlockType::Heading2 => "## ",
        _ => "",
    }
}

/// Render one block as a line of text.
pub fn serialize_block(block: &Block, options: &ExportOptions) -> String {
    let body = match options.inline_markup {
        InlineMarkup::Strip => plain_text(&block.content),
        InlineMarkup::Preserve => block.content.clone(),
    };
    format!("{}{}", prefix(block), body)
}

/// Render a document, blocks separated by a blank line.
pub fn serialize(blocks: &[Block], options: &ExportOptions) -> String {
    blocks
        .iter()
        .map(|block| serialize_block(block, options))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Block> {
        vec![
            Block::new("a".into(), BlockType::Heading1).with_content("Title"),
            Block::new("b".into(), BlockType::Todo)
                .with_content("Done")
                .with_checked(true),
            Block::new("c".into(), BlockType::Bullet).with_content("Item"),
        ]
    }

    #[test]
    fn test_serialize_prefixes() {
        assert_eq!(
            serialize(&sample(), &ExportOptions::default()),
            "# Title\n\n[x] Done\n\n- Item"
        );
    }

    #[test]
    fn test_unchecked_and_plain_kinds() {
        let blocks = vec![
            Block::new("a".into(), BlockType::Todo).with_content("Later"),
            Block::new("b".into(), BlockType::Heading2).with_content("Sub"),
            Block::new("c".into(), BlockType::Code).with_content("let x = 1;"),
            Block::paragraph("d".into()),
        ];
        assert_eq!(
            serialize(&blocks, &ExportOptions::default()),
            "[ ] Later\n\n## Sub\n\nlet x = 1;\n\n"
        );
    }

    #[test]
    fn test_strip_vs_preserve() {
        let blocks = vec![
            Block::paragraph("a".into()).with_content("<strong>Bold</strong>&nbsp;&amp; more"),
        ];
        assert_eq!(
            serialize(&blocks, &ExportOptions::default()),
            "Bold & more"
        );
        assert_eq!(
            serialize(&blocks, &ExportOptions::preserve_markup()),
            "<strong>Bold</strong>&nbsp;&amp; more"
        );
    }

    #[test]
    fn test_serialize_snapshot() {
        let mut blocks = sample();
        blocks.push(Block::paragraph("d".into()).with_content("line one<br>line <em>two</em>"));
        blocks.push(Block::new("e".into(), BlockType::Todo).with_content("Open"));
        insta::assert_snapshot!(serialize(&blocks, &ExportOptions::default()), @r"
        # Title

        [x] Done

        - Item

        line one
        line two

        [ ] Open
        ");
    }
}
