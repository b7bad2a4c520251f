//! Command-line front ends for one-shot runs.
//!
//! `drafter run` prints a human-readable log of the pass to stdout;
//! `drafter inspect` shows what the extractor sees on a single page.

use anyhow::Result;

use crate::pipeline::{Drafter, Outcome, RunLog};

pub async fn run_once(drafter: &Drafter, dry_run: bool) -> Result<usize> {
    let started = chrono::Local::now();
    let log = drafter.run_logged(dry_run).await?;

    print!("{}", render_log(&log, dry_run, &started.format("%Y-%m-%d %H:%M:%S").to_string()));
    Ok(log.report.processed)
}

pub async fn run_inspect(drafter: &Drafter, document_id: &str) -> Result<()> {
    let request = drafter.inspect(document_id).await?;

    println!("id:       {}", document_id);
    println!("title:    {}", request.title);
    println!("answered: {}", request.already_answered);
    if request.question.is_empty() {
        println!("question: (none)");
    } else {
        println!("question:");
        println!("{}", request.question);
    }
    Ok(())
}

/// Formats a run log the way `drafter run` prints it.
pub fn render_log(log: &RunLog, dry_run: bool, started: &str) -> String {
    let mut out = String::new();

    if dry_run {
        out.push_str(&format!("run {} (dry-run)\n", started));
    } else {
        out.push_str(&format!("run {}\n", started));
    }
    out.push_str(&format!("  found: {} items\n", log.report.listed));

    for doc in &log.documents {
        let line = match &doc.outcome {
            Outcome::Drafted {
                sentiment,
                category,
            } => format!(
                "  drafted: '{}' (sentiment: {}, category: {})",
                doc.title,
                sentiment.map(|s| s.as_str()).unwrap_or("-"),
                category.map(|c| c.as_str()).unwrap_or("-"),
            ),
            Outcome::WouldDraft => format!("  would draft: '{}'", doc.title),
            Outcome::SkippedAnswered => format!("  skipped: '{}' - already has AI response", doc.title),
            Outcome::SkippedEmpty => format!("  skipped: '{}' - no question content yet", doc.title),
        };
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!("  processed: {} request(s)\n", log.report.processed));
    out.push_str("ok\n");
    out
}
