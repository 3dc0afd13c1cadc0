//! Minimal Markdown → ratatui lines, enough for model-written explanations
//! (headings, emphasis, lists, inline and fenced code).

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

#[derive(Clone, Debug)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<ListKind>,
    in_code_block: bool,
}

impl LineBuilder {
    fn style(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, style| acc.patch(*style))
    }

    fn push_span(&mut self, text: impl Into<String>, style: Style) {
        let text = text.into();
        if !text.is_empty() {
            self.current.push(Span::styled(text, style));
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank(&mut self) {
        self.flush();
        let last_is_blank = self
            .lines
            .last()
            .is_none_or(|line| line.spans.is_empty());
        if !last_is_blank {
            self.lines.push(Line::default());
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => {
                let style = self.style();
                for line in text.lines() {
                    self.push_span(format!("  {line}"), style);
                    self.flush();
                }
            }
            Event::Text(text) => {
                let style = self.style();
                self.push_span(text.into_string(), style);
            }
            Event::Code(code) => {
                let style = self.style().fg(Color::Yellow);
                self.push_span(code.into_string(), style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.push_span(" ", style);
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.push_span("────────", Style::default().fg(Color::DarkGray));
                self.blank();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.styles.push(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                );
            }
            Tag::Strong => self.styles.push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Emphasis => self
                .styles
                .push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strikethrough => self
                .styles
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
                self.styles.push(Style::default().fg(Color::Yellow));
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.push_span(format!("{indent}{marker}"), Style::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank();
                } else {
                    self.flush();
                }
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.blank();
            }
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.styles.pop();
                self.blank();
            }
            TagEnd::Item => self.flush(),
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::default();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        builder.handle(event);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn headings_and_paragraphs_are_separated_by_blank_lines() {
        let lines = render_markdown("## 📚 Definition\n\nRecursion is when a function\ncalls itself.");
        assert_eq!(
            plain(&lines),
            vec![
                "📚 Definition",
                "",
                "Recursion is when a function calls itself."
            ]
        );
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn lists_get_markers() {
        let lines = render_markdown("1. first\n2. second\n\n- dot");
        assert_eq!(plain(&lines), vec!["1. first", "2. second", "", "• dot"]);
    }

    #[test]
    fn strong_text_is_bold_and_code_is_highlighted() {
        let lines = render_markdown("a **bold** `f(n)`");
        let spans = &lines[0].spans;
        assert_eq!(spans[1].content, "bold");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[3].content, "f(n)");
        assert_eq!(spans[3].style.fg, Some(Color::Yellow));
    }

    #[test]
    fn fenced_code_keeps_its_lines() {
        let lines = render_markdown("```rust\nfn f() {}\nf();\n```\nafter");
        assert_eq!(plain(&lines), vec!["  fn f() {}", "  f();", "", "after"]);
    }
}
