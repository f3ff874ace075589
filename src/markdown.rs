use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

/// Renders prose into markup for `contents` fields.
pub trait RichTextRenderer: Send + Sync {
    fn render(&self, source: &str) -> String;
}

/// Markdown extensions. Everything is off by default, which gives plain
/// CommonMark with raw HTML escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub strikethrough: bool,
    /// Pass raw HTML in the source through instead of escaping it.
    pub allow_html: bool,
}

/// CommonMark renderer backed by pulldown-cmark.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    fn parser_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.options.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.options.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        opts
    }
}

impl RichTextRenderer for MarkdownRenderer {
    fn render(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.parser_options());
        let mut html = String::with_capacity(source.len() * 3 / 2);
        if self.options.allow_html {
            pulldown_cmark::html::push_html(&mut html, parser);
        } else {
            pulldown_cmark::html::push_html(&mut html, escape_raw_html(parser).into_iter());
        }
        html
    }
}

/// Turn raw HTML into text. Runs of block-level HTML become one paragraph,
/// as they would in a parser that has no HTML blocks.
fn escape_raw_html<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    let mut block_html = String::new();
    // One entry per open tag: whether its children are blocks.
    let mut holds_blocks: Vec<bool> = Vec::new();

    for event in events {
        let at_block_level = holds_blocks.last().copied().unwrap_or(true);
        match event {
            Event::Html(raw) if at_block_level => block_html.push_str(&raw),
            Event::Html(raw) => out.push(Event::Text(raw)),
            other => {
                flush_block_html(&mut block_html, &mut out);
                match &other {
                    Event::Start(tag) => holds_blocks
                        .push(matches!(tag, Tag::BlockQuote | Tag::FootnoteDefinition(_))),
                    Event::End(_) => {
                        holds_blocks.pop();
                    }
                    _ => {}
                }
                out.push(other);
            }
        }
    }
    flush_block_html(&mut block_html, &mut out);
    out
}

fn flush_block_html<'a>(buffer: &mut String, out: &mut Vec<Event<'a>>) {
    if buffer.is_empty() {
        return;
    }
    let text = std::mem::take(buffer);
    out.push(Event::Start(Tag::Paragraph));
    out.push(Event::Text(CowStr::from(text.trim_end().to_string())));
    out.push(Event::End(Tag::Paragraph));
}
