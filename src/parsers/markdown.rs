// Line-oriented markdown renderer for generated PRD documents

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A block-level node produced by [`render`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderNode {
    /// `#`, `##` or `###` heading
    Heading { level: u8, text: String },
    /// `- ` list item
    ListItem { spans: Vec<InlineSpan> },
    /// `---`
    HorizontalRule,
    /// Blank line
    LineBreak,
    /// Any other line
    Paragraph { spans: Vec<InlineSpan> },
}

/// An inline run inside a list item or paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum InlineSpan {
    Text(String),
    Bold(String),
    Code(String),
}

impl InlineSpan {
    /// The visible text of the span without delimiters
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::Text(t) | InlineSpan::Bold(t) | InlineSpan::Code(t) => t,
        }
    }
}

static INLINE_PATTERN: OnceLock<Regex> = OnceLock::new();

// Bold and code are alternatives of one pattern so spans never nest
fn get_inline_pattern() -> &'static Regex {
    INLINE_PATTERN
        .get_or_init(|| Regex::new(r"\*\*(.+?)\*\*|`([^`]+)`").expect("inline span pattern"))
}

/// Render a restricted markdown subset into display nodes.
///
/// Each line is classified on its own, in this order:
///
/// | Line                | Node              |
/// |---------------------|-------------------|
/// | `# text`            | heading level 1   |
/// | `## text`           | heading level 2   |
/// | `### text`          | heading level 3   |
/// | starts with ```` ``` ```` | nothing     |
/// | exactly `---`       | horizontal rule   |
/// | `- text`            | list item         |
/// | blank               | line break        |
/// | anything else       | paragraph         |
///
/// Fence lines are dropped but the lines between them are classified like any
/// other line; there is no block state.
pub fn render(content: &str) -> Vec<RenderNode> {
    content
        .split('\n')
        .filter_map(|raw| render_line(raw.strip_suffix('\r').unwrap_or(raw)))
        .collect()
}

/// Classify a single line
pub fn render_line(line: &str) -> Option<RenderNode> {
    if let Some(text) = line.strip_prefix("# ") {
        return Some(heading(1, text));
    }
    if let Some(text) = line.strip_prefix("## ") {
        return Some(heading(2, text));
    }
    if let Some(text) = line.strip_prefix("### ") {
        return Some(heading(3, text));
    }
    if line.starts_with("```") {
        return None;
    }
    if line == "---" {
        return Some(RenderNode::HorizontalRule);
    }
    if let Some(text) = line.strip_prefix("- ") {
        return Some(RenderNode::ListItem {
            spans: parse_inline(text),
        });
    }
    if line.trim().is_empty() {
        return Some(RenderNode::LineBreak);
    }
    Some(RenderNode::Paragraph {
        spans: parse_inline(line),
    })
}

fn heading(level: u8, text: &str) -> RenderNode {
    RenderNode::Heading {
        level,
        text: text.to_string(),
    }
}

/// Split text into plain, bold and code spans.
///
/// Unmatched `**` or backticks stay in the surrounding text.
pub fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in get_inline_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            spans.push(InlineSpan::Text(text[last..whole.start()].to_string()));
        }
        if let Some(bold) = caps.get(1) {
            spans.push(InlineSpan::Bold(bold.as_str().to_string()));
        } else if let Some(code) = caps.get(2) {
            spans.push(InlineSpan::Code(code.as_str().to_string()));
        }
        last = whole.end();
    }

    if last < text.len() {
        spans.push(InlineSpan::Text(text[last..].to_string()));
    }

    spans
}

/// Flatten render nodes back into plain terminal text
pub fn to_plain_text(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            RenderNode::Heading { level, text } => {
                out.push_str(text);
                out.push('\n');
                let underline = if *level == 1 { '=' } else { '-' };
                out.push_str(&underline.to_string().repeat(text.chars().count()));
            }
            RenderNode::ListItem { spans } => {
                out.push_str("  • ");
                out.push_str(&join_spans(spans));
            }
            RenderNode::HorizontalRule => out.push_str(&"─".repeat(40)),
            RenderNode::LineBreak => {}
            RenderNode::Paragraph { spans } => out.push_str(&join_spans(spans)),
        }
        out.push('\n');
    }
    out
}

fn join_spans(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InlineSpan {
        InlineSpan::Text(s.to_string())
    }

    #[test]
    fn test_heading_levels() {
        let nodes = render("# One\n## Two\n### Three\n#### Four");
        assert_eq!(nodes[0], heading(1, "One"));
        assert_eq!(nodes[1], heading(2, "Two"));
        assert_eq!(nodes[2], heading(3, "Three"));
        // Level 4 is not recognized
        assert_eq!(
            nodes[3],
            RenderNode::Paragraph {
                spans: vec![text("#### Four")]
            }
        );
    }

    #[test]
    fn test_title_list_and_inline_spans() {
        let nodes = render("# Title\n\n- item one\n- **bold** and `code`");
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0], heading(1, "Title"));
        assert_eq!(nodes[1], RenderNode::LineBreak);
        assert_eq!(
            nodes[2],
            RenderNode::ListItem {
                spans: vec![text("item one")]
            }
        );
        assert_eq!(
            nodes[3],
            RenderNode::ListItem {
                spans: vec![
                    InlineSpan::Bold("bold".to_string()),
                    text(" and "),
                    InlineSpan::Code("code".to_string()),
                ]
            }
        );
    }

    #[test]
    fn test_fence_lines_produce_nothing() {
        let nodes = render("```typescript\ninterface User {\n- id: string\n```");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0],
            RenderNode::Paragraph {
                spans: vec![text("interface User {")]
            }
        );
        // Lines inside a fence still follow the per-line rules
        assert!(matches!(nodes[1], RenderNode::ListItem { .. }));
    }

    #[test]
    fn test_horizontal_rule_must_be_exact() {
        assert_eq!(render_line("---"), Some(RenderNode::HorizontalRule));
        assert!(matches!(
            render_line("----"),
            Some(RenderNode::Paragraph { .. })
        ));
        assert!(matches!(
            render_line(" ---"),
            Some(RenderNode::Paragraph { .. })
        ));
    }

    #[test]
    fn test_whitespace_line_is_line_break() {
        assert_eq!(render_line("   "), Some(RenderNode::LineBreak));
        assert_eq!(render_line(""), Some(RenderNode::LineBreak));
    }

    #[test]
    fn test_crlf_lines() {
        let nodes = render("# Title\r\n---\r\n");
        assert_eq!(nodes[0], heading(1, "Title"));
        assert_eq!(nodes[1], RenderNode::HorizontalRule);
        assert_eq!(nodes[2], RenderNode::LineBreak);
    }

    #[test]
    fn test_unmatched_delimiters_pass_through() {
        assert_eq!(parse_inline("a **b c"), vec![text("a **b c")]);
        assert_eq!(parse_inline("run `ls"), vec![text("run `ls")]);
        assert_eq!(parse_inline("****"), vec![text("****")]);
    }

    #[test]
    fn test_spans_do_not_nest() {
        assert_eq!(
            parse_inline("**use `npm`**"),
            vec![InlineSpan::Bold("use `npm`".to_string())]
        );
        assert_eq!(
            parse_inline("`**x**`"),
            vec![InlineSpan::Code("**x**".to_string())]
        );
    }

    #[test]
    fn test_headings_skip_inline_pass() {
        assert_eq!(render_line("## **Auth**"), Some(heading(2, "**Auth**")));
    }

    #[test]
    fn test_render_is_deterministic() {
        let input = "# A\n- **b**\n```\n`c`";
        assert_eq!(render(input), render(input));
    }

    #[test]
    fn test_to_plain_text() {
        let nodes = render("# PRD\n- **Vision**: ship it");
        let plain = to_plain_text(&nodes);
        assert!(plain.starts_with("PRD\n===\n"));
        assert!(plain.contains("  • Vision: ship it"));
    }
}
