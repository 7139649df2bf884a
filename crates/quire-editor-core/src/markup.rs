//! Constrained inline markup used in block content.
//!
//! Block content is a small HTML-like fragment: text, `<br>`, and the four
//! inline formats the editor itself produces. This module flattens it into
//! styled runs and renders runs back to a canonical fragment.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

/// Non-breaking space, inserted after an autoformatted span.
pub const NBSP: char = '\u{a0}';

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/)?\s*([a-zA-Z][a-zA-Z0-9]*)\b[^>]*?(/)?\s*>").unwrap()
});

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

/// Inline formats the toolbar and autoformat can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl InlineFormat {
    /// Tag written when rendering this format.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bold => "strong",
            Self::Italic => "em",
            Self::Underline => "u",
            Self::Strikethrough => "s",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "strong" | "b" => Some(Self::Bold),
            "em" | "i" => Some(Self::Italic),
            "u" => Some(Self::Underline),
            "s" | "strike" | "del" => Some(Self::Strikethrough),
            _ => None,
        }
    }

    /// Rendering order, outermost first.
    pub const ALL: [InlineFormat; 4] = [
        InlineFormat::Bold,
        InlineFormat::Italic,
        InlineFormat::Underline,
        InlineFormat::Strikethrough,
    ];
}

/// Set of formats active on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl Marks {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn only(format: InlineFormat) -> Self {
        Self::default().with(format, true)
    }

    pub fn has(&self, format: InlineFormat) -> bool {
        match format {
            InlineFormat::Bold => self.bold,
            InlineFormat::Italic => self.italic,
            InlineFormat::Underline => self.underline,
            InlineFormat::Strikethrough => self.strikethrough,
        }
    }

    pub fn with(mut self, format: InlineFormat, on: bool) -> Self {
        match format {
            InlineFormat::Bold => self.bold = on,
            InlineFormat::Italic => self.italic = on,
            InlineFormat::Underline => self.underline = on,
            InlineFormat::Strikethrough => self.strikethrough = on,
        }
        self
    }

    pub fn toggled(self, format: InlineFormat) -> Self {
        let on = !self.has(format);
        self.with(format, on)
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A run of text with uniform marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: Marks,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Marks::plain())
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One piece of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Run(TextRun),
    Break,
}

/// Parse a content fragment into segments.
///
/// Unknown tags are transparent. A `div`/`p` opening after existing content
/// becomes a line break, which is how browsers wrap soft breaks.
pub fn parse(html: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    // Nesting depth per format, in `InlineFormat::ALL` order.
    let mut depth = [0usize; 4];
    let mut last = 0;

    let current_marks = |depth: &[usize; 4]| {
        InlineFormat::ALL
            .iter()
            .zip(depth.iter())
            .fold(Marks::plain(), |marks, (f, d)| marks.with(*f, *d > 0))
    };

    for caps in TAG_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut segments, &html[last..whole.start()], current_marks(&depth));
        last = whole.end();

        let closing = caps.get(1).is_some();
        let tag = caps
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        if let Some(format) = InlineFormat::from_tag(&tag) {
            let idx = format_index(format);
            if closing {
                depth[idx] = depth[idx].saturating_sub(1);
            } else if caps.get(3).is_none() {
                depth[idx] += 1;
            }
            continue;
        }

        match tag.as_str() {
            "br" if !closing => segments.push(Segment::Break),
            "div" | "p" if !closing && !segments.is_empty() => segments.push(Segment::Break),
            _ => {}
        }
    }
    push_text(&mut segments, &html[last..], current_marks(&depth));
    segments
}

fn format_index(format: InlineFormat) -> usize {
    match format {
        InlineFormat::Bold => 0,
        InlineFormat::Italic => 1,
        InlineFormat::Underline => 2,
        InlineFormat::Strikethrough => 3,
    }
}

fn push_text(segments: &mut Vec<Segment>, raw: &str, marks: Marks) {
    if raw.is_empty() {
        return;
    }
    let text = decode_entities(raw);
    if let Some(Segment::Run(prev)) = segments.last_mut() {
        if prev.marks == marks {
            prev.text.push_str(&text);
            return;
        }
    }
    segments.push(Segment::Run(TextRun::new(text, marks)));
}

/// Decode the character references that can appear in editable content.
pub fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "nbsp" => Some(NBSP),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Text escaping for editable content: NBSP must come back as `&nbsp;` so the
/// stored fragment keeps it visible, which a generic HTML escaper leaves raw.
fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            NBSP => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Render segments to a canonical fragment. Adjacent runs with equal marks
/// are coalesced.
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut pending: Option<TextRun> = None;

    let flush = |out: &mut String, run: TextRun| {
        if run.is_empty() {
            return;
        }
        let open: Vec<_> = InlineFormat::ALL
            .iter()
            .filter(|f| run.marks.has(**f))
            .collect();
        for f in &open {
            let _ = write!(out, "<{}>", f.tag());
        }
        escape_into(out, &run.text);
        for f in open.iter().rev() {
            let _ = write!(out, "</{}>", f.tag());
        }
    };

    for segment in segments {
        match segment {
            Segment::Run(run) => match pending.as_mut() {
                Some(prev) if prev.marks == run.marks => prev.text.push_str(&run.text),
                _ => {
                    if let Some(prev) = pending.take() {
                        flush(&mut out, prev);
                    }
                    pending = Some(run.clone());
                }
            },
            Segment::Break => {
                if let Some(prev) = pending.take() {
                    flush(&mut out, prev);
                }
                out.push_str("<br>");
            }
        }
    }
    if let Some(prev) = pending.take() {
        flush(&mut out, prev);
    }
    out
}

/// Flatten a fragment to plain text: tags dropped, entities decoded, breaks
/// become newlines and non-breaking spaces become spaces.
pub fn plain_text(html: &str) -> String {
    parse(html)
        .iter()
        .map(|segment| match segment {
            Segment::Run(run) => run.text.replace(NBSP, " "),
            Segment::Break => "\n".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse("hello"), vec![Segment::Run(TextRun::plain("hello"))]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_nested_marks() {
        let segments = parse("a<strong>b<em>c</em></strong><b>d</b>");
        assert_eq!(
            segments,
            vec![
                Segment::Run(TextRun::plain("a")),
                Segment::Run(TextRun::new("b", Marks::only(InlineFormat::Bold))),
                Segment::Run(TextRun::new(
                    "c",
                    Marks::only(InlineFormat::Bold).with(InlineFormat::Italic, true)
                )),
                Segment::Run(TextRun::new("d", Marks::only(InlineFormat::Bold))),
            ]
        );
    }

    #[test]
    fn test_parse_breaks_and_blocks() {
        let segments = parse("one<br>two<div>three</div>");
        assert_eq!(
            segments,
            vec![
                Segment::Run(TextRun::plain("one")),
                Segment::Break,
                Segment::Run(TextRun::plain("two")),
                Segment::Break,
                Segment::Run(TextRun::plain("three")),
            ]
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a&amp;b&nbsp;&lt;&#65;&#x42;&bogus;"), "a&b\u{a0}<AB&bogus;");
    }

    #[test]
    fn test_render_canonical() {
        let html = render(&parse("<b>x</b><strong>y</strong>&nbsp;<i>z</i>"));
        assert_eq!(html, "<strong>xy</strong>&nbsp;<em>z</em>");
    }

    #[test]
    fn test_render_escapes() {
        let html = render(&[Segment::Run(TextRun::plain("1 < 2 & 3"))]);
        assert_eq!(html, "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            plain_text("<strong>Bold</strong>&nbsp;and <s>gone</s><br>next"),
            "Bold and gone\nnext"
        );
    }

    #[test]
    fn test_marks_toggle() {
        let marks = Marks::plain().toggled(InlineFormat::Underline);
        assert!(marks.has(InlineFormat::Underline));
        assert!(marks.toggled(InlineFormat::Underline).is_plain());
    }
}
