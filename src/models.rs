//! Core data models used throughout Support Drafter.
//!
//! These types represent the support documents read from the store, the
//! content blocks they carry, and the per-document values that flow through
//! the drafting pipeline.

use std::fmt;

/// A single text run inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText {
    pub plain_text: String,
}

impl RichText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
        }
    }
}

/// A typed unit of document content.
///
/// Only the kinds the pipeline reads or writes get their own variant; every
/// other block kind the store reports is kept as [`ContentBlock::Other`] so it
/// is ignored explicitly rather than by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Divider,
    Callout {
        text: Vec<RichText>,
        icon: Option<String>,
        color: Option<String>,
    },
    Paragraph {
        text: Vec<RichText>,
    },
    Other {
        kind: String,
    },
}

impl ContentBlock {
    /// Builds a paragraph from a single run of text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph {
            text: vec![RichText::new(text)],
        }
    }

    /// Builds a callout from a single run of text with no icon or color.
    pub fn callout(text: impl Into<String>) -> Self {
        ContentBlock::Callout {
            text: vec![RichText::new(text)],
            icon: None,
            color: None,
        }
    }

    /// The store's name for this block kind.
    pub fn kind(&self) -> &str {
        match self {
            ContentBlock::Divider => "divider",
            ContentBlock::Callout { .. } => "callout",
            ContentBlock::Paragraph { .. } => "paragraph",
            ContentBlock::Other { kind } => kind,
        }
    }
}

/// A page as returned by the database listing, before its body is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: String,
    pub title: Option<String>,
}

impl DocumentSummary {
    pub fn with_blocks(self, blocks: Vec<ContentBlock>) -> SupportDocument {
        SupportDocument {
            id: self.id,
            title: self.title,
            blocks,
        }
    }
}

/// One customer inquiry stored in the support database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportDocument {
    /// Opaque identifier assigned by the store.
    pub id: String,
    /// Plain text of the page's title property, if it has one.
    pub title: Option<String>,
    /// Page body, in document order.
    pub blocks: Vec<ContentBlock>,
}

/// What the extractor derives from a [`SupportDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRequest {
    pub title: String,
    pub question: String,
    pub already_answered: bool,
}

/// Customer mood label requested at the end of every generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Frustrated,
    Angry,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Frustrated,
        Sentiment::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Frustrated => "Frustrated",
            Sentiment::Angry => "Angry",
        }
    }

    /// Option name used by the `Sentiment` select property of the database.
    pub fn select_name(&self) -> &'static str {
        match self {
            Sentiment::Positive => "😊 Positive",
            Sentiment::Neutral => "😐 Neutral",
            Sentiment::Frustrated => "😤 Frustrated",
            Sentiment::Angry => "😡 Angry",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic label requested at the end of every generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Delivery,
    Returns,
    ProductQuality,
    Billing,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Delivery,
        Category::Returns,
        Category::ProductQuality,
        Category::Billing,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Delivery => "Delivery",
            Category::Returns => "Returns",
            Category::ProductQuality => "Product Quality",
            Category::Billing => "Billing",
            Category::General => "General",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A draft reply as returned by the generation service.
///
/// `text` is kept verbatim, label lines included. The labels are parsed out
/// of it on a best-effort basis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: String,
    pub sentiment: Option<Sentiment>,
    pub category: Option<Category>,
}

impl GeneratedReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let (sentiment, category) = crate::generation::parse_labels(&text);
        Self {
            text,
            sentiment,
            category,
        }
    }
}

/// Outcome counters for a single pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Documents returned by the store listing.
    pub listed: usize,
    /// Documents that received an annotation (or would, in a dry run).
    pub processed: usize,
    pub skipped_answered: usize,
    pub skipped_empty: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parse_is_case_insensitive() {
        assert_eq!(Sentiment::parse("frustrated"), Some(Sentiment::Frustrated));
        assert_eq!(Sentiment::parse(" ANGRY "), Some(Sentiment::Angry));
        assert_eq!(Sentiment::parse("Delighted"), None);
    }

    #[test]
    fn test_category_parse_multi_word() {
        assert_eq!(
            Category::parse("product quality"),
            Some(Category::ProductQuality)
        );
        assert_eq!(Category::parse("Shipping"), None);
    }

    #[test]
    fn test_block_kind_names() {
        assert_eq!(ContentBlock::Divider.kind(), "divider");
        assert_eq!(ContentBlock::paragraph("x").kind(), "paragraph");
        assert_eq!(ContentBlock::callout("x").kind(), "callout");
        let other = ContentBlock::Other {
            kind: "heading_1".to_string(),
        };
        assert_eq!(other.kind(), "heading_1");
    }
}
