//! Markdown to HTML conversion using pulldown-cmark.
//!
//! Headings are given slugged `id` attributes during conversion so the TOC
//! scan (and anchor links) can target them.

use deunicode::deunicode;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use rustc_hash::FxHashMap;

/// Options for markdown conversion.
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
}

impl MarkdownOptions {
    /// Create options with all extensions enabled.
    pub fn all() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
        }
    }

    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        opts
    }
}

/// Convert a markdown body to HTML with slugged heading ids.
pub fn render_markdown(markdown: &str, options: &MarkdownOptions) -> String {
    let events: Vec<Event> = Parser::new_ext(markdown, options.to_pulldown_options()).collect();
    let events = assign_heading_ids(events);

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Give every heading without an explicit id a slug derived from its text.
/// Duplicate slugs get a numeric suffix so ids stay unique per document.
fn assign_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut out = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::Heading {
                level,
                id: None,
                classes,
                attrs,
            }) => {
                let text = heading_text(&events[i + 1..]);
                let slug = unique_slug(&slugify(&text), &mut seen);
                out.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::from(slug)),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            event => out.push(event.clone()),
        }
        i += 1;
    }

    out
}

/// Collect the plain text of a heading up to its end tag.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::End(TagEnd::Heading(_)) => break,
            _ => {}
        }
    }
    text
}

/// ASCII slug from arbitrary heading text.
fn slugify(text: &str) -> String {
    let ascii = deunicode(text).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut prev_dash = true;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() { "section".into() } else { slug }
}

fn unique_slug(base: &str, seen: &mut FxHashMap<String, usize>) -> String {
    let count = seen.entry(base.to_string()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, *count - 1)
    }
}
