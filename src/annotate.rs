//! Draft annotation.
//!
//! Writes a generated reply into its request page as three blocks appended
//! in one call: a divider, a blue callout headed `🤖 AI Draft Response (HH:MM)`,
//! and a paragraph holding the reply. The callout doubles as the "already
//! answered" marker that [`crate::extract`] looks for on later runs.
//!
//! The claim step writes a different callout, `⏳ AI Draft Pending (<time>)`.
//! It only holds other runs off until `pipeline.claim_ttl_secs` has passed,
//! so a marker left behind by a crashed run expires on its own.

use anyhow::Result;
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

use crate::models::{ContentBlock, RichText};
use crate::traits::DocumentStore;

pub const DRAFT_ICON: &str = "🤖";
pub const DRAFT_COLOR: &str = "blue_background";

/// Leading text of the pending marker written by the claim step.
pub const PENDING_PREFIX: &str = "⏳ AI Draft Pending";

/// Heading text of the draft callout for a given write time.
pub fn draft_heading<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{} AI Draft Response ({})", DRAFT_ICON, at.format("%H:%M"))
}

/// The block group appended for one reply, in write order.
pub fn draft_blocks<Tz: TimeZone>(reply_text: &str, at: &DateTime<Tz>) -> Vec<ContentBlock>
where
    Tz::Offset: std::fmt::Display,
{
    vec![
        ContentBlock::Divider,
        ContentBlock::Callout {
            text: vec![RichText::new(draft_heading(at))],
            icon: Some(DRAFT_ICON.to_string()),
            color: Some(DRAFT_COLOR.to_string()),
        },
        ContentBlock::paragraph(reply_text),
    ]
}

/// Appends the draft for `reply_text` to the end of `document_id`.
///
/// The heading carries the local wall-clock time of the write.
pub async fn annotate(store: &dyn DocumentStore, document_id: &str, reply_text: &str) -> Result<()> {
    let blocks = draft_blocks(reply_text, &Local::now());
    store.append_blocks(document_id, &blocks).await?;
    Ok(())
}

/// Pending marker text for a claim taken at `at`.
pub fn pending_text(at: &DateTime<Utc>) -> String {
    format!(
        "{} ({})",
        PENDING_PREFIX,
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Claim time carried by a pending marker's text.
///
/// Returns `None` when `text` is not a pending marker, `Some(None)` when it
/// is one without a readable time.
pub fn parse_pending(text: &str) -> Option<Option<DateTime<Utc>>> {
    let rest = text.trim().strip_prefix(PENDING_PREFIX)?;
    let at = rest
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
        .map(|t| t.with_timezone(&Utc));
    Some(at)
}

pub fn pending_marker(at: &DateTime<Utc>) -> ContentBlock {
    ContentBlock::Callout {
        text: vec![RichText::new(pending_text(at))],
        icon: Some("⏳".to_string()),
        color: Some("gray_background".to_string()),
    }
}

/// Appends the pending marker and returns its block id, if the store
/// reported one.
pub async fn claim(store: &dyn DocumentStore, document_id: &str) -> Result<Option<String>> {
    let marker = pending_marker(&Utc::now());
    let ids = store.append_blocks(document_id, &[marker]).await?;
    Ok(ids.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_heading_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 7, 5, 59).unwrap();
        assert_eq!(draft_heading(&at), "🤖 AI Draft Response (07:05)");
    }

    #[test]
    fn test_heading_uses_given_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = tz.with_ymd_and_hms(2026, 3, 4, 23, 30, 0).unwrap();
        assert_eq!(draft_heading(&at), "🤖 AI Draft Response (23:30)");
    }

    #[test]
    fn test_draft_blocks_shape() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let blocks = draft_blocks("Thanks for your patience.", &at);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], ContentBlock::Divider);
        match &blocks[1] {
            ContentBlock::Callout { text, icon, color } => {
                assert_eq!(text.len(), 1);
                assert!(text[0].plain_text.contains("AI"));
                assert_eq!(icon.as_deref(), Some("🤖"));
                assert_eq!(color.as_deref(), Some("blue_background"));
            }
            other => panic!("expected callout, got {:?}", other),
        }
        assert_eq!(blocks[2], ContentBlock::paragraph("Thanks for your patience."));
    }

    #[test]
    fn test_pending_text_carries_claim_time() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 7, 5, 59).unwrap();
        let text = pending_text(&at);
        assert_eq!(text, "⏳ AI Draft Pending (2026-03-04T07:05:59Z)");
        assert_eq!(parse_pending(&text), Some(Some(at)));
    }

    #[test]
    fn test_parse_pending_variants() {
        assert_eq!(parse_pending("⏳ AI Draft Pending"), Some(None));
        assert_eq!(parse_pending("⏳ AI Draft Pending (soon)"), Some(None));
        assert_eq!(parse_pending("🤖 AI Draft Response (09:15)"), None);

        let offset = parse_pending("⏳ AI Draft Pending (2026-03-04T09:05:59+02:00)");
        assert_eq!(
            offset,
            Some(Some(Utc.with_ymd_and_hms(2026, 3, 4, 7, 5, 59).unwrap()))
        );
    }
}
