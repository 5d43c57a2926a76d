//! Reply formatting: markdown in, display-ready markup out.
//!
//! The formatter parses a model reply into an immutable block tree, derives a
//! new tree annotated according to the persona's [`FormatStyle`], and
//! serializes it as HTML. Formatting is cosmetic: when a reply cannot be
//! parsed the raw text is passed through unchanged.
//!
//! Raw HTML in a reply (`<br>`, `<Enter>`) is written verbatim on both paths.
//!
//! ```text
//!  raw reply ──parse──▶ Document ──annotate──▶ Document' ──render──▶ markup
//!      │                                                               ▲
//!      └──────────────────────── on FormatError ───────────────────────┘
//! ```

pub mod annotate;
pub mod document;
pub mod render;

use tracing::debug;

pub use document::{Annotations, Block, Document, Inline, List, ListItem};

/// How replies are annotated for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatStyle {
    /// Number headings, break after headings, items and lists.
    #[default]
    NumberedHeading,
    /// Fixed inline CSS on h2/h3, paragraphs and list items.
    InlineStyle,
    /// Return the reply untouched.
    None,
}

impl FormatStyle {
    /// Parse the config spelling (`numbered-heading`, `inline-style`, `none`).
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "numbered-heading" => Some(Self::NumberedHeading),
            "inline-style" => Some(Self::InlineStyle),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn config_name(self) -> &'static str {
        match self {
            Self::NumberedHeading => "numbered-heading",
            Self::InlineStyle => "inline-style",
            Self::None => "none",
        }
    }
}

/// Reasons a reply could not be turned into a block tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("control character at byte {offset}")]
    ControlCharacter { offset: usize },

    #[error("unbalanced markdown structure: {0}")]
    Unbalanced(String),

    #[error("unsupported markdown construct: {0}")]
    Unsupported(String),
}

/// Output of the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedDocument {
    /// An annotated tree.
    Markup(Document),
    /// The reply text, unchanged.
    Passthrough(String),
}

impl FormattedDocument {
    /// Serialize for display.
    pub fn render(&self) -> String {
        match self {
            Self::Markup(doc) => render::to_html(doc),
            Self::Passthrough(text) => text.clone(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }
}

/// Stateless reply formatter for one style.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter {
    style: FormatStyle,
}

impl ResponseFormatter {
    pub fn new(style: FormatStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> FormatStyle {
        self.style
    }

    /// Format a reply, falling back to the raw text when it cannot be parsed.
    pub fn format(&self, raw: &str) -> FormattedDocument {
        match self.try_format(raw) {
            Ok(Some(doc)) => FormattedDocument::Markup(doc),
            Ok(None) => FormattedDocument::Passthrough(raw.to_string()),
            Err(e) => {
                debug!(error = %e, style = self.style.config_name(), "reply passed through unformatted");
                FormattedDocument::Passthrough(raw.to_string())
            }
        }
    }

    /// Format a reply, surfacing parse failures.
    ///
    /// Returns `Ok(None)` for [`FormatStyle::None`].
    pub fn try_format(&self, raw: &str) -> Result<Option<Document>, FormatError> {
        let annotate: fn(&Document) -> Document = match self.style {
            FormatStyle::NumberedHeading => annotate::numbered_headings,
            FormatStyle::InlineStyle => annotate::inline_styles,
            FormatStyle::None => return Ok(None),
        };
        let parsed = Document::parse(raw)?;
        Ok(Some(annotate(&parsed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbered_headings_label_in_order() {
        let out = ResponseFormatter::new(FormatStyle::NumberedHeading)
            .format("# A\n\n## B\n\n### C")
            .render();
        assert_eq!(
            out,
            "<h1>1. A</h1>\n<br>\n<h2>2. B</h2>\n<br>\n<h3>3. C</h3>\n<br>\n"
        );
    }

    #[test]
    fn test_no_headings_means_no_numbering() {
        let out = ResponseFormatter::new(FormatStyle::NumberedHeading)
            .format("1. first\n2. second\n\nPlain 3. text")
            .render();
        assert_eq!(
            out,
            "<ol>\n<li>first</li>\n<br>\n<li>second</li>\n<br>\n</ol>\n<br>\n<p>Plain 3. text</p>\n"
        );
    }

    #[test]
    fn test_numbered_list_items_and_bold_spacing() {
        let out = ResponseFormatter::new(FormatStyle::NumberedHeading)
            .format("## Symptoms\n\n- **Fatigue**two weeks\n- **Dizziness**")
            .render();
        assert_eq!(
            out,
            "<h2>1. Symptoms</h2>\n<br>\n\
             <ul>\n\
             <li><strong>Fatigue</strong> two weeks</li>\n<br>\n\
             <li><strong>Dizziness</strong></li>\n<br>\n\
             </ul>\n<br>\n"
        );
    }

    #[test]
    fn test_inline_style_output() {
        let out = ResponseFormatter::new(FormatStyle::InlineStyle)
            .format("## Check-ups\n\nSee your GP.\n\n- Blood pressure")
            .render();
        assert_eq!(
            out,
            "<h2 style=\"font-size: 1.25em; font-weight: bold; padding: 10px 0;\">Check-ups</h2>\n\
             <p style=\"padding: 5px 0;\">See your GP.</p>\n\
             <ul>\n\
             <li style=\"padding: 5px 0;\">Blood pressure</li>\n\
             </ul>\n"
        );
    }

    // ── Raw HTML ────────────────────────────────────────────────

    #[test]
    fn test_html_in_list_items_is_numbered() {
        let out = ResponseFormatter::new(FormatStyle::NumberedHeading)
            .format("## Symptoms\n\n- **Fatigue** press <Enter> to continue\n- **Dizziness**when standing")
            .render();
        assert_eq!(
            out,
            "<h2>1. Symptoms</h2>\n<br>\n\
             <ul>\n\
             <li><strong>Fatigue</strong> press <Enter> to continue</li>\n<br>\n\
             <li><strong>Dizziness</strong> when standing</li>\n<br>\n\
             </ul>\n<br>\n"
        );
    }

    #[test]
    fn test_html_line_break_is_styled() {
        let out = ResponseFormatter::new(FormatStyle::InlineStyle)
            .format("# Plan\n\nRest well.<br>Drink water.")
            .render();
        assert_eq!(
            out,
            "<h1>Plan</h1>\n<p style=\"padding: 5px 0;\">Rest well.<br>Drink water.</p>\n"
        );
    }

    #[test]
    fn test_html_is_formatted_under_every_style() {
        let replies = [
            ("# Plan\n\nRest well.<br>Drink water.", "<br>"),
            ("- press <Enter> to continue", "<Enter>"),
            ("<div>See a doctor.</div>\n\nSoon.", "<div>See a doctor.</div>"),
        ];
        for style in [FormatStyle::NumberedHeading, FormatStyle::InlineStyle] {
            let formatter = ResponseFormatter::new(style);
            for (raw, html) in replies {
                let doc = formatter.format(raw);
                assert!(!doc.is_passthrough(), "{raw:?} under {style:?} passed through");
                assert!(doc.render().contains(html), "{raw:?} under {style:?} lost {html}");
            }
        }
    }

    // ── Passthrough ─────────────────────────────────────────────

    #[test]
    fn test_invalid_markdown_passes_through() {
        let formatter = ResponseFormatter::new(FormatStyle::NumberedHeading);
        for raw in ["bad\u{7}bell", "# Title\u{0}", "\u{1b}[1mloud\u{1b}[0m <br>"] {
            let doc = formatter.format(raw);
            assert!(doc.is_passthrough(), "{raw:?} should pass through");
            assert_eq!(doc.render(), raw);
        }
    }

    #[test]
    fn test_try_format_surfaces_error() {
        let formatter = ResponseFormatter::new(FormatStyle::InlineStyle);
        assert_eq!(
            formatter.try_format("ok\u{0}"),
            Err(FormatError::ControlCharacter { offset: 2 })
        );
    }

    #[test]
    fn test_none_style_is_passthrough() {
        let raw = "# Title\n\n- item";
        let doc = ResponseFormatter::new(FormatStyle::None).format(raw);
        assert_eq!(doc, FormattedDocument::Passthrough(raw.to_string()));
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in [
            FormatStyle::NumberedHeading,
            FormatStyle::InlineStyle,
            FormatStyle::None,
        ] {
            assert_eq!(FormatStyle::from_config_name(style.config_name()), Some(style));
        }
        assert_eq!(FormatStyle::from_config_name("fancy"), None);
    }
}
