//! Drafting pipeline orchestration.
//!
//! One run walks every page of the support database in listing order:
//! fetch body → extract → skip or draft. Drafting is generate → annotate →
//! (optional) label properties. Label properties are best effort: once the
//! draft is on the page, a failed property write is only logged.
//!
//! A run holds no state between documents and none between runs; the
//! draft callout written by [`crate::annotate`] is what keeps a second run
//! from answering the same page again.
//!
//! Any store or generation error aborts the run. Pages drafted before the
//! failure keep their drafts; the rest are picked up by the next run.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

use crate::annotate;
use crate::config::{Config, Credentials};
use crate::connector_notion::NotionStore;
use crate::extract::extract_at;
use crate::generation::OpenAIGenerator;
use crate::models::{
    Category, ExtractedRequest, GeneratedReply, RunReport, Sentiment, SupportDocument,
};
use crate::traits::{DocumentStore, ReplyGenerator};

/// What happened to one document during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Drafted {
        sentiment: Option<Sentiment>,
        category: Option<Category>,
    },
    /// Dry run: the document would have been drafted.
    WouldDraft,
    SkippedAnswered,
    SkippedEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub id: String,
    pub title: String,
    pub outcome: Outcome,
}

/// A run's counters plus the per-document trail, in listing order.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    pub report: RunReport,
    pub documents: Vec<DocumentOutcome>,
}

/// The pipeline together with the collaborators it drives.
///
/// Cheap to clone; the HTTP server and the watch loop share one instance.
#[derive(Clone)]
pub struct Drafter {
    config: Arc<Config>,
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn ReplyGenerator>,
}

impl Drafter {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            config,
            store,
            generator,
        }
    }

    /// Wires the Notion store and OpenAI generator from configuration.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let store = NotionStore::new(&config.notion, credentials.notion_token.clone())?;
        let generator =
            OpenAIGenerator::new(&config.generation, credentials.openai_api_key.clone())?;
        Ok(Self::new(
            Arc::new(config.clone()),
            Arc::new(store),
            Arc::new(generator),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one pass and returns how many documents were annotated.
    pub async fn run(&self) -> Result<usize> {
        Ok(self.run_logged(false).await?.report.processed)
    }

    /// Runs one pass, returning the per-document trail.
    ///
    /// With `dry_run`, nothing is generated or written; documents that would
    /// be drafted are counted as processed.
    pub async fn run_logged(&self, dry_run: bool) -> Result<RunLog> {
        let summaries = self.store.list_documents().await?;
        let limit = self.config.pipeline.document_limit();

        let mut log = RunLog {
            report: RunReport {
                listed: summaries.len(),
                ..Default::default()
            },
            documents: Vec::new(),
        };

        tracing::info!(
            listed = summaries.len(),
            dry_run,
            "checking for new support requests"
        );

        for summary in summaries {
            let blocks = self.store.fetch_blocks(&summary.id).await?;
            let document = summary.with_blocks(blocks);
            let request = self.extract(&document);

            let outcome = if request.already_answered {
                tracing::debug!(id = %document.id, title = %request.title, "already answered");
                log.report.skipped_answered += 1;
                Outcome::SkippedAnswered
            } else if request.question.trim().is_empty() {
                tracing::debug!(id = %document.id, title = %request.title, "no question yet");
                log.report.skipped_empty += 1;
                Outcome::SkippedEmpty
            } else if limit.is_some_and(|max| log.report.processed >= max) {
                tracing::info!(
                    limit = limit.unwrap_or_default(),
                    "document limit reached; leaving the rest for the next run"
                );
                break;
            } else if dry_run {
                log.report.processed += 1;
                Outcome::WouldDraft
            } else {
                let reply = self.draft(&document, &request).await?;
                log.report.processed += 1;
                Outcome::Drafted {
                    sentiment: reply.sentiment,
                    category: reply.category,
                }
            };

            log.documents.push(DocumentOutcome {
                id: document.id,
                title: request.title,
                outcome,
            });
        }

        tracing::info!(processed = log.report.processed, "run finished");
        Ok(log)
    }

    /// Extracts the request of a single page without drafting anything.
    pub async fn inspect(&self, document_id: &str) -> Result<ExtractedRequest> {
        let summary = self.store.get_document(document_id).await?;
        let blocks = self.store.fetch_blocks(document_id).await?;
        Ok(self.extract(&summary.with_blocks(blocks)))
    }

    fn extract(&self, document: &SupportDocument) -> ExtractedRequest {
        extract_at(document, Utc::now(), self.config.pipeline.claim_ttl())
    }

    async fn draft(
        &self,
        document: &SupportDocument,
        request: &ExtractedRequest,
    ) -> Result<GeneratedReply> {
        let claim_id = if self.config.pipeline.claim {
            annotate::claim(self.store.as_ref(), &document.id).await?
        } else {
            None
        };

        let result = self.generate_and_write(document, request).await;

        if let Some(block_id) = claim_id {
            if let Err(e) = self.store.delete_block(&block_id).await {
                tracing::warn!(id = %document.id, block = %block_id, "failed to remove pending marker: {e:#}");
            }
        }

        result
    }

    async fn generate_and_write(
        &self,
        document: &SupportDocument,
        request: &ExtractedRequest,
    ) -> Result<GeneratedReply> {
        tracing::info!(
            id = %document.id,
            title = %request.title,
            model = self.generator.model_name(),
            "generating draft"
        );

        let reply = self
            .generator
            .generate(&request.title, request.question.trim())
            .await?;

        annotate::annotate(self.store.as_ref(), &document.id, &reply.text).await?;

        let properties = label_properties(&self.config, &reply);
        if !properties.is_empty() {
            if let Err(e) = self
                .store
                .set_select_properties(&document.id, &properties)
                .await
            {
                tracing::warn!(id = %document.id, "failed to set label properties: {e:#}");
            }
        }

        tracing::info!(
            id = %document.id,
            sentiment = reply.sentiment.map(|s| s.as_str()).unwrap_or("-"),
            category = reply.category.map(|c| c.as_str()).unwrap_or("-"),
            "draft written"
        );
        Ok(reply)
    }
}

/// Select property updates for the parsed labels, per configuration.
pub fn label_properties(config: &Config, reply: &GeneratedReply) -> Vec<(String, String)> {
    let mut properties = Vec::new();
    if let (Some(name), Some(sentiment)) = (&config.notion.sentiment_property, reply.sentiment) {
        properties.push((name.clone(), sentiment.select_name().to_string()));
    }
    if let (Some(name), Some(category)) = (&config.notion.category_property, reply.category) {
        properties.push((name.clone(), category.as_str().to_string()));
    }
    properties
}
