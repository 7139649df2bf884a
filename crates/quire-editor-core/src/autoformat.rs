//! Markdown-style shortcuts detected while typing.
//!
//! Both detectors are pure: they look at text and report a match. The editor
//! session decides what to do with it (coerce the block, or replace the
//! matched span through the bridge).

use std::sync::LazyLock;

use regex::Regex;

use crate::block::BlockType;
use crate::markup::InlineFormat;

/// Block-level trigger tokens. The whole live text must equal the token.
const BLOCK_TRIGGERS: [(&str, BlockType); 4] = [
    ("#", BlockType::Heading1),
    ("##", BlockType::Heading2),
    ("-", BlockType::Bullet),
    ("[]", BlockType::Todo),
];

/// Inline patterns in precedence order, each anchored at the caret.
static INLINE_PATTERNS: LazyLock<[(InlineFormat, Regex); 3]> = LazyLock::new(|| {
    [
        (InlineFormat::Strikethrough, Regex::new(r"~([^~]+)~$").unwrap()),
        (InlineFormat::Bold, Regex::new(r"\*\*([^*]+)\*\*$").unwrap()),
        (InlineFormat::Italic, Regex::new(r"\*([^*]+)\*$").unwrap()),
    ]
});

/// Block type a Space keystroke should coerce to, if any.
///
/// `text` is the block's full live text. Returns `None` when the block is
/// already of the target type, so repeating a trigger in a converted block
/// types a literal space.
pub fn detect_block_shortcut(text: &str, current: BlockType) -> Option<BlockType> {
    let target = BLOCK_TRIGGERS
        .iter()
        .find(|(token, _)| *token == text)
        .map(|(_, kind)| *kind)?;

    if target == current {
        tracing::trace!(target: "quire::autoformat", kind = %target, "block already converted");
        return None;
    }
    Some(target)
}

/// An inline shortcut ending at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMatch {
    pub format: InlineFormat,
    /// Text between the delimiters.
    pub captured: String,
    /// Char offset of the opening delimiter inside the text node.
    pub start: usize,
    /// Char offset just past the closing delimiter (the caret).
    pub end: usize,
}

/// Look for an inline shortcut in the text node content before the caret.
pub fn detect_inline_shortcut(before_caret: &str) -> Option<InlineMatch> {
    for (format, pattern) in INLINE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(before_caret) else {
            continue;
        };
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let start = before_caret[..whole.start()].chars().count();
        let end = before_caret.chars().count();
        tracing::trace!(
            target: "quire::autoformat",
            format = ?format,
            start,
            end,
            "inline shortcut matched"
        );
        return Some(InlineMatch {
            format: *format,
            captured: inner.as_str().to_string(),
            start,
            end,
        });
    }
    None
}

/// Text of a node before a char offset.
pub fn text_before(text: &str, char_offset: usize) -> &str {
    match text.char_indices().nth(char_offset) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_triggers() {
        let cases = [
            ("#", BlockType::Heading1),
            ("##", BlockType::Heading2),
            ("-", BlockType::Bullet),
            ("[]", BlockType::Todo),
        ];
        for (text, expected) in cases {
            assert_eq!(
                detect_block_shortcut(text, BlockType::Paragraph),
                Some(expected),
                "trigger {text:?}"
            );
        }
    }

    #[test]
    fn test_block_trigger_must_be_exact() {
        assert_eq!(detect_block_shortcut("# ", BlockType::Paragraph), None);
        assert_eq!(detect_block_shortcut("a#", BlockType::Paragraph), None);
        assert_eq!(detect_block_shortcut("###", BlockType::Paragraph), None);
        assert_eq!(detect_block_shortcut("", BlockType::Paragraph), None);
    }

    #[test]
    fn test_block_trigger_idempotent() {
        assert_eq!(detect_block_shortcut("#", BlockType::Heading1), None);
        assert_eq!(
            detect_block_shortcut("##", BlockType::Heading1),
            Some(BlockType::Heading2)
        );
    }

    #[test]
    fn test_inline_bold() {
        let m = detect_inline_shortcut("say **hello**").unwrap();
        assert_eq!(m.format, InlineFormat::Bold);
        assert_eq!(m.captured, "hello");
        assert_eq!((m.start, m.end), (4, 13));
    }

    #[test]
    fn test_inline_italic() {
        let m = detect_inline_shortcut("*hello*").unwrap();
        assert_eq!(m.format, InlineFormat::Italic);
        assert_eq!(m.captured, "hello");
        assert_eq!((m.start, m.end), (0, 7));
    }

    #[test]
    fn test_inline_strike() {
        let m = detect_inline_shortcut("x ~hello~").unwrap();
        assert_eq!(m.format, InlineFormat::Strikethrough);
        assert_eq!(m.captured, "hello");
    }

    #[test]
    fn test_inline_anchored_at_caret() {
        assert_eq!(detect_inline_shortcut("**hello** there"), None);
        assert_eq!(detect_inline_shortcut("*open"), None);
        assert_eq!(detect_inline_shortcut("**"), None);
    }

    #[test]
    fn test_inline_offsets_are_chars() {
        let m = detect_inline_shortcut("héllo *wörld*").unwrap();
        assert_eq!((m.start, m.end), (6, 13));
        assert_eq!(m.captured, "wörld");
    }

    #[test]
    fn test_text_before() {
        assert_eq!(text_before("héllo", 2), "hé");
        assert_eq!(text_before("abc", 10), "abc");
        assert_eq!(text_before("abc", 0), "");
    }
}
