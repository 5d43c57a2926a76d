//! Style transforms: parsed tree in, new annotated tree out.

use super::document::{Annotations, Block, Document, Inline, List, ListItem};

pub const H2_STYLE: &str = "font-size: 1.25em; font-weight: bold; padding: 10px 0;";
pub const H3_STYLE: &str = "font-size: 1.1em; font-weight: bold; padding: 8px 0;";
pub const BLOCK_PADDING: &str = "padding: 5px 0;";

/// Number every heading in document order and separate list items.
///
/// The counter starts at 1 and ignores heading level. Headings, list items
/// and whole lists each get a trailing break.
pub fn numbered_headings(doc: &Document) -> Document {
    let mut counter = 0;
    Document {
        blocks: number_blocks(&doc.blocks, &mut counter),
    }
}

fn number_blocks(blocks: &[Block], counter: &mut u32) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let annotated = match block {
            Block::Heading {
                level,
                content,
                annotations,
            } => {
                *counter += 1;
                Block::Heading {
                    level: *level,
                    content: content.clone(),
                    annotations: Annotations {
                        number: Some(*counter),
                        break_after: true,
                        ..annotations.clone()
                    },
                }
            }
            Block::List(list) => {
                let mut items = Vec::with_capacity(list.items.len());
                for item in &list.items {
                    items.push(ListItem {
                        blocks: space_after_first_bold(number_blocks(&item.blocks, counter)),
                        annotations: Annotations {
                            break_after: true,
                            ..item.annotations.clone()
                        },
                    });
                }
                Block::List(List {
                    start: list.start,
                    items,
                    annotations: Annotations {
                        break_after: true,
                        ..list.annotations.clone()
                    },
                })
            }
            Block::BlockQuote(inner) => Block::BlockQuote(number_blocks(inner, counter)),
            other => other.clone(),
        };
        out.push(annotated);
    }
    out
}

/// Insert a space after the item's first bold span when more content
/// follows it directly.
fn space_after_first_bold(mut blocks: Vec<Block>) -> Vec<Block> {
    for block in &mut blocks {
        let content = match block {
            Block::Plain(content) | Block::Paragraph { content, .. } => content,
            _ => continue,
        };
        if let Some(pos) = content.iter().position(|i| matches!(i, Inline::Strong(_))) {
            if let Some(next) = content.get(pos + 1)
                && !next.starts_with_whitespace()
            {
                content.insert(pos + 1, Inline::Text(" ".to_string()));
            }
            break;
        }
    }
    blocks
}

/// Apply fixed inline CSS to h2/h3 headings, paragraphs and list items.
pub fn inline_styles(doc: &Document) -> Document {
    Document {
        blocks: style_blocks(&doc.blocks),
    }
}

fn style_blocks(blocks: &[Block]) -> Vec<Block> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading {
                level,
                content,
                annotations,
            } => {
                let style = match level {
                    2 => Some(H2_STYLE),
                    3 => Some(H3_STYLE),
                    _ => annotations.style,
                };
                Block::Heading {
                    level: *level,
                    content: content.clone(),
                    annotations: Annotations {
                        style,
                        ..annotations.clone()
                    },
                }
            }
            Block::Paragraph {
                content,
                annotations,
            } => Block::Paragraph {
                content: content.clone(),
                annotations: Annotations {
                    style: Some(BLOCK_PADDING),
                    ..annotations.clone()
                },
            },
            Block::List(list) => Block::List(List {
                start: list.start,
                items: list
                    .items
                    .iter()
                    .map(|item| ListItem {
                        blocks: style_blocks(&item.blocks),
                        annotations: Annotations {
                            style: Some(BLOCK_PADDING),
                            ..item.annotations.clone()
                        },
                    })
                    .collect(),
                annotations: list.annotations.clone(),
            }),
            Block::BlockQuote(inner) => Block::BlockQuote(style_blocks(inner)),
            other => other.clone(),
        })
        .collect()
}
