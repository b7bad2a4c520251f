//! Request extraction from a support document.
//!
//! Derives the title, the customer's question, and the "already answered"
//! flag from a [`SupportDocument`]. Extraction never fails: missing or
//! malformed fields fall back to defaults.
//!
//! A callout containing `AI` marks the document as answered, with one
//! exception: a pending marker from the claim step counts only while it is
//! younger than the claim TTL. Expired or undated markers are ignored.

use chrono::{DateTime, Duration, Utc};

use crate::annotate::parse_pending;
use crate::config::PipelineConfig;
use crate::models::{ContentBlock, ExtractedRequest, RichText, SupportDocument};

/// Title used when a document has no usable title property.
pub const UNTITLED: &str = "Untitled";

/// Substring that marks a callout as a previously written draft.
pub const ANSWERED_MARKER: &str = "AI";

/// Extracts with the current time and the default claim TTL.
pub fn extract(document: &SupportDocument) -> ExtractedRequest {
    extract_at(document, Utc::now(), PipelineConfig::default().claim_ttl())
}

/// Extracts as of `now`, honouring pending markers younger than `claim_ttl`.
pub fn extract_at(
    document: &SupportDocument,
    now: DateTime<Utc>,
    claim_ttl: Duration,
) -> ExtractedRequest {
    let title = match document.title.as_deref() {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    };

    let mut question = String::new();
    let mut already_answered = false;

    for block in &document.blocks {
        match block {
            ContentBlock::Paragraph { text } => {
                for run in text {
                    question.push_str(&run.plain_text);
                    question.push(' ');
                }
            }
            ContentBlock::Callout { text, .. } => {
                if is_answer_marker(text, now, claim_ttl) {
                    already_answered = true;
                }
            }
            ContentBlock::Divider | ContentBlock::Other { .. } => {}
        }
    }

    ExtractedRequest {
        title,
        question: question.trim().to_string(),
        already_answered,
    }
}

fn is_answer_marker(runs: &[RichText], now: DateTime<Utc>, claim_ttl: Duration) -> bool {
    let text: String = runs.iter().map(|r| r.plain_text.as_str()).collect();
    match parse_pending(&text) {
        Some(Some(claimed_at)) => now.signed_duration_since(claimed_at) < claim_ttl,
        Some(None) => false,
        None => text.contains(ANSWERED_MARKER),
    }
}
