//! Content sanitizing applied on every commit.

use std::sync::LazyLock;

use regex::Regex;

use crate::block::BlockId;

static BREAK_ARTIFACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*<br\s*/?\s*>\s*$").unwrap());

/// Opening tag through the matching close, or through end of input when the
/// fragment is unterminated.
static SCRIPT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*script\b.*?(?:<\s*/\s*script\s*>|$)").unwrap());

static SCRIPT_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*/\s*script\s*>").unwrap());

/// True for the lone line break a contenteditable leaves behind when emptied.
pub fn is_break_artifact(content: &str) -> bool {
    BREAK_ARTIFACT_RE.is_match(content)
}

/// Clean raw editable content before it is stored in a block.
///
/// Inline markup produced by the editor's own formatting commands is kept
/// verbatim.
pub fn commit_content(block_id: &BlockId, raw: &str) -> String {
    if is_break_artifact(raw) {
        return String::new();
    }

    let cleaned = strip_scripts(raw);
    if cleaned.len() != raw.len() {
        tracing::debug!(
            target: "quire::sanitize",
            block_id = %block_id,
            removed_bytes = raw.len() - cleaned.len(),
            "stripped script markup"
        );
    }

    if is_break_artifact(&cleaned) {
        return String::new();
    }
    cleaned
}

/// Remove script fragments until none are left, so pieces that join up after
/// one pass are caught by the next.
fn strip_scripts(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = SCRIPT_BLOCK_RE.replace_all(&current, "").into_owned();
        if next != current {
            current = next;
            continue;
        }
        // Stray closers only once no complete fragment is left.
        let next = SCRIPT_CLOSE_RE.replace_all(&current, "").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(raw: &str) -> String {
        commit_content(&BlockId::from("b"), raw)
    }

    #[test]
    fn test_break_artifact() {
        assert_eq!(commit("<br>"), "");
        assert_eq!(commit("<BR/>"), "");
        assert_eq!(commit("  <br />\n"), "");
        assert_eq!(commit("a<br>b"), "a<br>b");
    }

    #[test]
    fn test_script_removed() {
        assert_eq!(commit("<script>alert(1)</script>hello"), "hello");
    }

    #[test]
    fn test_script_case_and_attributes() {
        assert_eq!(
            commit(r#"hi<SCRIPT type="text/javascript">x()</ScRiPt >there"#),
            "hithere"
        );
        assert_eq!(commit("a<script\nsrc=x></script>b"), "ab");
    }

    #[test]
    fn test_unterminated_script() {
        assert_eq!(commit("keep<script>evil()"), "keep");
        assert_eq!(commit("keep</script>this"), "keepthis");
    }

    #[test]
    fn test_reassembled_script() {
        let out = commit("<scr<script></script>ipt>alert(1)</script>ok");
        assert!(!out.to_lowercase().contains("<script"));
        assert!(out.ends_with("ok"));
    }

    #[test]
    fn test_script_leaving_break() {
        assert_eq!(commit("<script>x</script><br>"), "");
    }

    #[test]
    fn test_inline_markup_preserved() {
        let raw = "<strong>bold</strong> <em>it</em> <u>u</u> <s>gone</s>&nbsp;";
        assert_eq!(commit(raw), raw);
    }
}
