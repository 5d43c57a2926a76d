//! Structural tree for model replies.
//!
//! [`Document::parse`] turns markdown into an immutable block tree using
//! `pulldown-cmark`. Styles never mutate a parsed tree; they build a new one
//! with [`Annotations`] filled in (see [`super::annotate`]).

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::FormatError;

/// Display annotations attached to a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Running heading number, rendered as an `N. ` prefix.
    pub number: Option<u32>,
    /// Inline CSS applied through a `style` attribute.
    pub style: Option<&'static str>,
    /// Emit a `<br>` immediately after the element.
    pub break_after: bool,
}

/// A parsed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Inline>,
        annotations: Annotations,
    },
    Paragraph {
        content: Vec<Inline>,
        annotations: Annotations,
    },
    /// Inline content of a tight list item, rendered without `<p>`.
    Plain(Vec<Inline>),
    List(List),
    BlockQuote(Vec<Block>),
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    Rule,
    /// Raw HTML block, kept verbatim.
    Html(String),
}

/// An ordered or unordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    /// First number of an ordered list; `None` for bullet lists.
    pub start: Option<u64>,
    pub items: Vec<ListItem>,
    pub annotations: Annotations,
}

impl List {
    pub fn is_ordered(&self) -> bool {
        self.start.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
    pub annotations: Annotations,
}

/// Inline node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link {
        dest: String,
        title: String,
        content: Vec<Inline>,
    },
    Image {
        dest: String,
        title: String,
        alt: Vec<Inline>,
    },
    SoftBreak,
    HardBreak,
    /// Inline HTML such as `<br>`, kept verbatim.
    Html(String),
}

impl Inline {
    /// Whether rendered text of this node begins with whitespace.
    pub(crate) fn starts_with_whitespace(&self) -> bool {
        match self {
            Inline::Text(t) => t.starts_with(char::is_whitespace),
            Inline::SoftBreak | Inline::HardBreak => true,
            _ => false,
        }
    }
}

impl Document {
    /// Parse markdown into a block tree.
    ///
    /// Raw HTML is kept as verbatim [`Block::Html`] and [`Inline::Html`]
    /// nodes. Fails on control characters and on events the tree has no
    /// node for.
    pub fn parse(markdown: &str) -> Result<Self, FormatError> {
        if let Some((offset, _)) = markdown
            .char_indices()
            .find(|&(_, c)| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(FormatError::ControlCharacter { offset });
        }

        let mut builder = TreeBuilder {
            events: Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH),
        };
        let blocks = builder.flow(None)?;
        Ok(Self { blocks })
    }
}

/// Recursive-descent builder over the pulldown-cmark event stream.
struct TreeBuilder<'a> {
    events: Parser<'a>,
}

impl<'a> TreeBuilder<'a> {
    /// Parse blocks until `end` (or end of input when `end` is `None`).
    ///
    /// Bare inline events, which pulldown-cmark emits inside tight list
    /// items, are gathered into [`Block::Plain`].
    fn flow(&mut self, end: Option<TagEnd>) -> Result<Vec<Block>, FormatError> {
        let mut blocks = Vec::new();
        let mut pending: Vec<Inline> = Vec::new();

        loop {
            let Some(event) = self.events.next() else {
                if end.is_some() {
                    return Err(FormatError::Unbalanced("unexpected end of input".to_string()));
                }
                break;
            };

            let block = match event {
                Event::End(tag) => {
                    if Some(tag) == end {
                        break;
                    }
                    return Err(FormatError::Unbalanced(format!("unexpected end of {tag:?}")));
                }
                Event::Start(Tag::Paragraph) => Block::Paragraph {
                    content: self.inlines(TagEnd::Paragraph)?,
                    annotations: Annotations::default(),
                },
                Event::Start(Tag::Heading { level, .. }) => Block::Heading {
                    level: heading_level(level),
                    content: self.inlines(TagEnd::Heading(level))?,
                    annotations: Annotations::default(),
                },
                Event::Start(tag @ Tag::BlockQuote(_)) => {
                    Block::BlockQuote(self.flow(Some(tag.to_end()))?)
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                        _ => None,
                    };
                    Block::CodeBlock {
                        language,
                        text: self.code_text()?,
                    }
                }
                Event::Start(Tag::List(start)) => Block::List(List {
                    start,
                    items: self.list_items(TagEnd::List(start.is_some()))?,
                    annotations: Annotations::default(),
                }),
                Event::Rule => Block::Rule,
                Event::Start(Tag::HtmlBlock) => Block::Html(self.html_block()?),
                Event::Html(html) => Block::Html(html.into_string()),
                other => {
                    pending.push(self.inline(other)?);
                    continue;
                }
            };

            if !pending.is_empty() {
                blocks.push(Block::Plain(std::mem::take(&mut pending)));
            }
            blocks.push(block);
        }

        if !pending.is_empty() {
            blocks.push(Block::Plain(pending));
        }
        Ok(blocks)
    }

    fn list_items(&mut self, end: TagEnd) -> Result<Vec<ListItem>, FormatError> {
        let mut items = Vec::new();
        loop {
            match self.events.next() {
                Some(Event::Start(Tag::Item)) => items.push(ListItem {
                    blocks: self.flow(Some(TagEnd::Item))?,
                    annotations: Annotations::default(),
                }),
                Some(Event::End(tag)) if tag == end => return Ok(items),
                other => {
                    return Err(FormatError::Unbalanced(format!(
                        "expected list item, found {other:?}"
                    )));
                }
            }
        }
    }

    fn code_text(&mut self) -> Result<String, FormatError> {
        let mut text = String::new();
        loop {
            match self.events.next() {
                Some(Event::Text(t)) => text.push_str(&t),
                Some(Event::End(TagEnd::CodeBlock)) => return Ok(text),
                other => {
                    return Err(FormatError::Unbalanced(format!(
                        "expected code text, found {other:?}"
                    )));
                }
            }
        }
    }

    fn html_block(&mut self) -> Result<String, FormatError> {
        let mut html = String::new();
        loop {
            match self.events.next() {
                Some(Event::Html(t) | Event::Text(t)) => html.push_str(&t),
                Some(Event::End(TagEnd::HtmlBlock)) => return Ok(html),
                other => {
                    return Err(FormatError::Unbalanced(format!(
                        "expected HTML block content, found {other:?}"
                    )));
                }
            }
        }
    }

    /// Parse inline content until `end`.
    fn inlines(&mut self, end: TagEnd) -> Result<Vec<Inline>, FormatError> {
        let mut content = Vec::new();
        loop {
            match self.events.next() {
                Some(Event::End(tag)) if tag == end => return Ok(content),
                Some(event) => content.push(self.inline(event)?),
                None => {
                    return Err(FormatError::Unbalanced(format!("unterminated {end:?}")));
                }
            }
        }
    }

    /// Convert one inline event, consuming its children for container tags.
    fn inline(&mut self, event: Event<'a>) -> Result<Inline, FormatError> {
        Ok(match event {
            Event::Text(t) => Inline::Text(t.into_string()),
            Event::Code(c) => Inline::Code(c.into_string()),
            Event::SoftBreak => Inline::SoftBreak,
            Event::HardBreak => Inline::HardBreak,
            Event::Start(Tag::Strong) => Inline::Strong(self.inlines(TagEnd::Strong)?),
            Event::Start(Tag::Emphasis) => Inline::Emphasis(self.inlines(TagEnd::Emphasis)?),
            Event::Start(Tag::Strikethrough) => {
                Inline::Strikethrough(self.inlines(TagEnd::Strikethrough)?)
            }
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) => Inline::Link {
                dest: dest_url.into_string(),
                title: title.into_string(),
                content: self.inlines(TagEnd::Link)?,
            },
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => Inline::Image {
                dest: dest_url.into_string(),
                title: title.into_string(),
                alt: self.inlines(TagEnd::Image)?,
            },
            Event::Html(h) | Event::InlineHtml(h) => Inline::Html(h.into_string()),
            other => return Err(FormatError::Unsupported(format!("{other:?}"))),
        })
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_parse_heading_and_paragraph() {
        let doc = Document::parse("# Title\n\nSome *body* text.").unwrap();
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![text("Title")],
                    annotations: Annotations::default(),
                },
                Block::Paragraph {
                    content: vec![
                        text("Some "),
                        Inline::Emphasis(vec![text("body")]),
                        text(" text."),
                    ],
                    annotations: Annotations::default(),
                },
            ]
        );
    }

    #[test]
    fn test_tight_list_items_are_plain() {
        let doc = Document::parse("- **Fatigue**: two weeks\n- Dizziness").unwrap();
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list, got {:?}", doc.blocks[0]);
        };
        assert!(!list.is_ordered());
        assert_eq!(list.items.len(), 2);
        assert_eq!(
            list.items[0].blocks,
            vec![Block::Plain(vec![
                Inline::Strong(vec![text("Fatigue")]),
                text(": two weeks"),
            ])]
        );
    }

    #[test]
    fn test_ordered_list_start() {
        let doc = Document::parse("3. three\n4. four").unwrap();
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.start, Some(3));
    }

    #[test]
    fn test_nested_list_inside_item() {
        let doc = Document::parse("- outer\n  - inner").unwrap();
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list");
        };
        assert!(matches!(list.items[0].blocks[0], Block::Plain(_)));
        assert!(matches!(list.items[0].blocks[1], Block::List(_)));
    }

    #[test]
    fn test_fenced_code_block() {
        let doc = Document::parse("```rust\nfn main() {}\n```").unwrap();
        assert_eq!(
            doc.blocks,
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                text: "fn main() {}\n".to_string(),
            }]
        );
    }

    #[test]
    fn test_inline_html_is_kept() {
        let doc = Document::parse("Rest well.<br>Drink water.").unwrap();
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph {
                content: vec![
                    text("Rest well."),
                    Inline::Html("<br>".to_string()),
                    text("Drink water."),
                ],
                annotations: Annotations::default(),
            }]
        );
    }

    #[test]
    fn test_unknown_tag_in_list_item_is_inline_html() {
        let doc = Document::parse("- press <Enter> to continue").unwrap();
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list");
        };
        let Block::Plain(content) = &list.items[0].blocks[0] else {
            panic!("expected plain item");
        };
        assert!(content.contains(&Inline::Html("<Enter>".to_string())));
    }

    #[test]
    fn test_html_block_is_kept() {
        let doc = Document::parse("<div>hello</div>\n\nAfter.").unwrap();
        assert_eq!(doc.blocks[0], Block::Html("<div>hello</div>\n".to_string()));
        assert!(matches!(doc.blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn test_control_character_is_rejected() {
        assert!(matches!(
            Document::parse("ok\u{0}bad"),
            Err(FormatError::ControlCharacter { offset: 2 })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Document::parse("").unwrap(), Document::default());
    }
}
