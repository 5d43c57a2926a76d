//! HTML serialization of (annotated) documents.
//!
//! A tree is lowered back into a `pulldown-cmark` event stream and written by
//! its HTML writer. Annotations that have no tag form (styled paragraphs and
//! list items, trailing breaks) are emitted as raw HTML events. Raw HTML from
//! the reply is written verbatim.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Tag, TagEnd, html};

use super::document::{Annotations, Block, Document, Inline};

/// Serialize a document to HTML markup.
pub fn to_html(doc: &Document) -> String {
    let mut events = Vec::new();
    lower_blocks(&mut events, &doc.blocks);

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

fn lower_blocks<'a>(events: &mut Vec<Event<'a>>, blocks: &'a [Block]) {
    for block in blocks {
        lower_block(events, block);
    }
}

fn lower_block<'a>(events: &mut Vec<Event<'a>>, block: &'a Block) {
    match block {
        Block::Heading {
            level,
            content,
            annotations,
        } => {
            let tag = Tag::Heading {
                level: heading_level(*level),
                id: None,
                classes: Vec::new(),
                attrs: annotations
                    .style
                    .map(|style| (CowStr::Borrowed("style"), Some(CowStr::Borrowed(style))))
                    .into_iter()
                    .collect(),
            };
            let end = tag.to_end();
            events.push(Event::Start(tag));
            if let Some(n) = annotations.number {
                events.push(Event::Text(format!("{n}. ").into()));
            }
            lower_inlines(events, content);
            events.push(Event::End(end));
            break_after(events, annotations);
        }
        Block::Paragraph {
            content,
            annotations,
        } => {
            open(events, Tag::Paragraph, "p", annotations.style);
            lower_inlines(events, content);
            close(events, TagEnd::Paragraph, "p", annotations.style);
            break_after(events, annotations);
        }
        Block::Plain(content) => lower_inlines(events, content),
        Block::List(list) => {
            let tag = Tag::List(list.start);
            let end = tag.to_end();
            events.push(Event::Start(tag));
            for item in &list.items {
                open(events, Tag::Item, "li", item.annotations.style);
                lower_blocks(events, &item.blocks);
                close(events, TagEnd::Item, "li", item.annotations.style);
                break_after(events, &item.annotations);
            }
            events.push(Event::End(end));
            break_after(events, &list.annotations);
        }
        Block::BlockQuote(inner) => {
            let tag = Tag::BlockQuote(None);
            let end = tag.to_end();
            events.push(Event::Start(tag));
            lower_blocks(events, inner);
            events.push(Event::End(end));
        }
        Block::CodeBlock { language, text } => {
            let kind = match language {
                Some(lang) => CodeBlockKind::Fenced(CowStr::Borrowed(lang)),
                None => CodeBlockKind::Indented,
            };
            events.push(Event::Start(Tag::CodeBlock(kind)));
            events.push(Event::Text(CowStr::Borrowed(text)));
            events.push(Event::End(TagEnd::CodeBlock));
        }
        Block::Rule => events.push(Event::Rule),
        Block::Html(html) => events.push(Event::Html(CowStr::Borrowed(html))),
    }
}

fn lower_inlines<'a>(events: &mut Vec<Event<'a>>, content: &'a [Inline]) {
    for inline in content {
        match inline {
            Inline::Text(t) => events.push(Event::Text(CowStr::Borrowed(t))),
            Inline::Code(c) => events.push(Event::Code(CowStr::Borrowed(c))),
            Inline::Html(h) => events.push(Event::InlineHtml(CowStr::Borrowed(h))),
            Inline::Strong(inner) => wrap(events, Tag::Strong, inner),
            Inline::Emphasis(inner) => wrap(events, Tag::Emphasis, inner),
            Inline::Strikethrough(inner) => wrap(events, Tag::Strikethrough, inner),
            Inline::Link {
                dest,
                title,
                content,
            } => wrap(
                events,
                Tag::Link {
                    link_type: LinkType::Inline,
                    dest_url: CowStr::Borrowed(dest),
                    title: CowStr::Borrowed(title),
                    id: CowStr::Borrowed(""),
                },
                content,
            ),
            Inline::Image { dest, title, alt } => wrap(
                events,
                Tag::Image {
                    link_type: LinkType::Inline,
                    dest_url: CowStr::Borrowed(dest),
                    title: CowStr::Borrowed(title),
                    id: CowStr::Borrowed(""),
                },
                alt,
            ),
            Inline::SoftBreak => events.push(Event::SoftBreak),
            Inline::HardBreak => events.push(Event::HardBreak),
        }
    }
}

fn wrap<'a>(events: &mut Vec<Event<'a>>, tag: Tag<'a>, content: &'a [Inline]) {
    let end = tag.to_end();
    events.push(Event::Start(tag));
    lower_inlines(events, content);
    events.push(Event::End(end));
}

/// Start `tag`, or write it as raw HTML when it carries a style attribute.
fn open<'a>(events: &mut Vec<Event<'a>>, tag: Tag<'a>, name: &str, style: Option<&str>) {
    match style {
        Some(style) => events.push(Event::Html(format!("<{name} style=\"{style}\">").into())),
        None => events.push(Event::Start(tag)),
    }
}

fn close(events: &mut Vec<Event<'_>>, end: TagEnd, name: &str, style: Option<&str>) {
    match style {
        Some(_) => events.push(Event::Html(format!("</{name}>\n").into())),
        None => events.push(Event::End(end)),
    }
}

fn break_after(events: &mut Vec<Event<'_>>, annotations: &Annotations) {
    if annotations.break_after {
        events.push(Event::Html(CowStr::Borrowed("<br>\n")));
    }
}

fn heading_level(level: u8) -> HeadingLevel {
    match level {
        1 => HeadingLevel::H1,
        2 => HeadingLevel::H2,
        3 => HeadingLevel::H3,
        4 => HeadingLevel::H4,
        5 => HeadingLevel::H5,
        _ => HeadingLevel::H6,
    }
}
