//! Terminal rendering of page text.
//!
//! Page text may hold code blocks fenced by directive lines:
//!
//! ```text
//! %bash monokai --line-numbers
//! git log --oneline
//! /%bash
//! ```
//!
//! The opening line names the language, optionally a style and flags. A block
//! without its closing line is left as plain text.

use crate::parser::PageStyle;
use console::Style;
use regex::Regex;
use std::sync::LazyLock;

/// Opening directive: `%lang [style] [--flag]...`
static OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%([A-Za-z0-9_+#-]+)((?:[ \t]+\S+)*)[ \t]*$").unwrap());

/// Closing directive: `/%lang`
static CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/%([A-Za-z0-9_+#-]+)[ \t]*$").unwrap());

const CODE_INDENT: &str = "    ";
const LINE_NUMBERS_FLAG: &str = "--line-numbers";

/// Turns page text into what gets printed
pub trait Renderer {
    fn render(&self, text: &str, style: &PageStyle) -> String;
}

/// Returns text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, text: &str, _style: &PageStyle) -> String {
        text.to_string()
    }
}

/// Renders code blocks indented and coloured, and headings in bold
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    color: bool,
    line_numbers: bool,
}

struct CodeBlock<'a> {
    language: &'a str,
    style: Option<&'a str>,
    line_numbers: bool,
    lines: &'a [&'a str],
}

impl TerminalRenderer {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            line_numbers: false,
        }
    }

    /// Number the lines of every code block, not just flagged ones
    pub fn with_line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn prose(&self, line: &str) -> String {
        if line.starts_with('#') {
            self.paint(Style::new().bold(), line)
        } else {
            line.to_string()
        }
    }

    fn code(&self, block: &CodeBlock<'_>, page_style: &PageStyle) -> Vec<String> {
        let style = block
            .style
            .or_else(|| page_style.for_language(block.language));
        let numbered = block.line_numbers || self.line_numbers;
        let width = block.lines.len().to_string().len();

        block
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let code = self.paint(code_style(style), line);
                if numbered {
                    let gutter = self.paint(Style::new().dim(), &format!("{:>width$}", i + 1));
                    format!("{}{} {}", CODE_INDENT, gutter, code)
                } else {
                    format!("{}{}", CODE_INDENT, code)
                }
            })
            .collect()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, text: &str, style: &PageStyle) -> String {
        let lines: Vec<&str> = text.lines().collect();
        let mut out = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            match open_block(&lines, i) {
                Some((block, end)) => {
                    out.extend(self.code(&block, style));
                    i = end + 1;
                }
                None => {
                    out.push(self.prose(lines[i]));
                    i += 1;
                }
            }
        }

        out.join("\n")
    }
}

/// Code block opened at `start`, with the index of its closing line
fn open_block<'a>(lines: &'a [&'a str], start: usize) -> Option<(CodeBlock<'a>, usize)> {
    let caps = OPEN_RE.captures(lines[start])?;
    let language = caps.get(1)?.as_str();

    let end = (start + 1..lines.len()).find(|&j| {
        CLOSE_RE
            .captures(lines[j])
            .and_then(|c| c.get(1))
            .is_some_and(|m| m.as_str() == language)
    });
    let Some(end) = end else {
        tracing::debug!(language, line = start + 1, "unterminated code block");
        return None;
    };

    let mut block = CodeBlock {
        language,
        style: None,
        line_numbers: false,
        lines: &lines[start + 1..end],
    };
    for arg in caps.get(2).map_or("", |m| m.as_str()).split_whitespace() {
        if arg == LINE_NUMBERS_FLAG {
            block.line_numbers = true;
        } else if !arg.starts_with("--") && block.style.is_none() {
            block.style = Some(arg);
        }
    }

    Some((block, end))
}

/// Terminal colour standing in for a highlighting style
fn code_style(style: Option<&str>) -> Style {
    match style {
        Some("monokai" | "native" | "vim") => Style::new().yellow(),
        Some("friendly" | "emacs" | "default") => Style::new().green(),
        Some(name) if name.contains("dark") => Style::new().magenta(),
        _ => Style::new().cyan(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> TerminalRenderer {
        TerminalRenderer::new(false)
    }

    #[test]
    fn test_plain_renderer_is_identity() {
        let text = "%bash\nls\n/%bash";
        assert_eq!(PlainRenderer.render(text, &PageStyle::default()), text);
    }

    #[test]
    fn test_code_block_is_indented() {
        let text = "# Git\n%bash\ngit status\ngit log\n/%bash\nafter";
        let rendered = plain().render(text, &PageStyle::default());
        assert_eq!(rendered, "# Git\n    git status\n    git log\nafter");
    }

    #[test]
    fn test_line_numbers_flag() {
        let text = "%python friendly --line-numbers\na = 1\nb = 2\n/%python";
        let rendered = plain().render(text, &PageStyle::default());
        assert_eq!(rendered, "    1 a = 1\n    2 b = 2");
    }

    #[test]
    fn test_line_numbers_everywhere() {
        let renderer = plain().with_line_numbers(true);
        let rendered = renderer.render("%sh\nls\n/%sh", &PageStyle::default());
        assert_eq!(rendered, "    1 ls");
    }

    #[test]
    fn test_unterminated_block_is_plain() {
        let text = "%bash\necho hi";
        assert_eq!(plain().render(text, &PageStyle::default()), text);
    }

    #[test]
    fn test_mismatched_close_is_plain() {
        let text = "%bash\necho hi\n/%python";
        assert_eq!(plain().render(text, &PageStyle::default()), text);
    }

    #[test]
    fn test_open_block_arguments() {
        let lines = vec!["%python monokai --line-numbers", "x", "/%python"];
        let (block, end) = open_block(&lines, 0).unwrap();
        assert_eq!(block.language, "python");
        assert_eq!(block.style, Some("monokai"));
        assert!(block.line_numbers);
        assert_eq!(block.lines, &["x"]);
        assert_eq!(end, 2);
    }

    #[test]
    fn test_colored_output() {
        let renderer = TerminalRenderer::new(true);
        let rendered = renderer.render("# Title\n%bash\nls\n/%bash", &PageStyle::default());
        assert!(rendered.contains("\u{1b}["));
        assert!(rendered.contains("Title"));
        assert!(rendered.contains("ls"));
        assert_eq!(console::strip_ansi_codes(&rendered), "# Title\n    ls");
    }

    #[test]
    fn test_page_style_applies_per_language() {
        let mut style = PageStyle::default();
        style.languages.insert("bash".to_string(), "monokai".to_string());

        let renderer = TerminalRenderer::new(true);
        let rendered = renderer.render("%bash\nls\n/%bash", &style);
        let expected = format!("{}{}", CODE_INDENT, code_style(Some("monokai")).force_styling(true).apply_to("ls"));
        assert_eq!(rendered, expected);
    }
}
