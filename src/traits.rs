//! Seams between the pipeline and the hosted services it talks to.
//!
//! The pipeline only ever sees a [`DocumentStore`] and a [`ReplyGenerator`].
//! The Notion and OpenAI clients implement them for production; tests plug
//! in in-memory versions.
//!
//! ```text
//! ┌──────────────┐  list / fetch / append  ┌──────────────────┐
//! │   pipeline   │────────────────────────▶│  DocumentStore    │
//! │   run()      │                         │  (NotionStore)    │
//! │              │  generate(title, q)     ├──────────────────┤
//! │              │────────────────────────▶│  ReplyGenerator   │
//! └──────────────┘                         │  (OpenAIGenerator)│
//!                                          └──────────────────┘
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ContentBlock, DocumentSummary, GeneratedReply};

/// The structured-document database that holds support requests.
///
/// All writes are append-only from the pipeline's point of view, apart from
/// removing the pending marker it wrote itself.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in the target database, in the store's listing order.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    /// A single document's title, looked up by id.
    async fn get_document(&self, document_id: &str) -> Result<DocumentSummary>;

    /// The document's body blocks, in order.
    async fn fetch_blocks(&self, document_id: &str) -> Result<Vec<ContentBlock>>;

    /// Appends `blocks` to the end of the document in one call.
    ///
    /// Returns the store-assigned ids of the new blocks, in order.
    async fn append_blocks(&self, document_id: &str, blocks: &[ContentBlock])
        -> Result<Vec<String>>;

    /// Removes a single block.
    async fn delete_block(&self, block_id: &str) -> Result<()>;

    /// Sets select properties on the document (`(property, option)` pairs).
    async fn set_select_properties(
        &self,
        document_id: &str,
        properties: &[(String, String)],
    ) -> Result<()>;
}

/// The hosted language model that drafts replies.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Drafts a reply for one request. Issues exactly one service call.
    async fn generate(&self, title: &str, question: &str) -> Result<GeneratedReply>;
}
