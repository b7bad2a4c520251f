//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use support_drafter::config::{parse_config, Config};
use support_drafter::models::{ContentBlock, DocumentSummary, GeneratedReply};
use support_drafter::pipeline::Drafter;
use support_drafter::traits::{DocumentStore, ReplyGenerator};

// ─── Store ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredPage {
    pub id: String,
    pub title: Option<String>,
    pub blocks: Vec<(String, ContentBlock)>,
}

/// A document store held in memory, recording every write.
#[derive(Default)]
pub struct InMemoryStore {
    pages: Mutex<Vec<StoredPage>>,
    next_block: Mutex<u64>,
    pub appends: Mutex<Vec<(String, Vec<ContentBlock>)>>,
    pub deletes: Mutex<Vec<String>>,
    pub properties: Mutex<Vec<(String, Vec<(String, String)>)>>,
    /// Page ids whose append call fails.
    pub fail_append_on: Mutex<Vec<String>>,
    /// Every block delete fails.
    pub fail_deletes: Mutex<bool>,
    /// Every property update fails.
    pub fail_properties: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, id: &str, title: Option<&str>, blocks: Vec<ContentBlock>) {
        let blocks = blocks
            .into_iter()
            .map(|b| (self.new_block_id(), b))
            .collect();
        self.pages.lock().unwrap().push(StoredPage {
            id: id.to_string(),
            title: title.map(str::to_string),
            blocks,
        });
    }

    pub fn blocks(&self, id: &str) -> Vec<ContentBlock> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.blocks.iter().map(|(_, b)| b.clone()).collect())
            .unwrap_or_default()
    }

    pub fn append_count(&self) -> usize {
        self.appends.lock().unwrap().len()
    }

    fn new_block_id(&self) -> String {
        let mut next = self.next_block.lock().unwrap();
        *next += 1;
        format!("block-{}", next)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .map(|p| DocumentSummary {
                id: p.id.clone(),
                title: p.title.clone(),
            })
            .collect())
    }

    async fn get_document(&self, document_id: &str) -> Result<DocumentSummary> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == document_id)
            .map(|p| DocumentSummary {
                id: p.id.clone(),
                title: p.title.clone(),
            })
            .ok_or_else(|| anyhow::anyhow!("page not found: {}", document_id))
    }

    async fn fetch_blocks(&self, document_id: &str) -> Result<Vec<ContentBlock>> {
        Ok(self.blocks(document_id))
    }

    async fn append_blocks(
        &self,
        document_id: &str,
        blocks: &[ContentBlock],
    ) -> Result<Vec<String>> {
        if self
            .fail_append_on
            .lock()
            .unwrap()
            .iter()
            .any(|id| id == document_id)
        {
            bail!("Notion API error 502 Bad Gateway: upstream unavailable");
        }

        let with_ids: Vec<(String, ContentBlock)> = blocks
            .iter()
            .map(|b| (self.new_block_id(), b.clone()))
            .collect();
        let ids = with_ids.iter().map(|(id, _)| id.clone()).collect();

        let mut pages = self.pages.lock().unwrap();
        let page = pages
            .iter_mut()
            .find(|p| p.id == document_id)
            .ok_or_else(|| anyhow::anyhow!("page not found: {}", document_id))?;
        page.blocks.extend(with_ids);

        self.appends
            .lock()
            .unwrap()
            .push((document_id.to_string(), blocks.to_vec()));
        Ok(ids)
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        if *self.fail_deletes.lock().unwrap() {
            bail!("Notion API error 504 Gateway Timeout: delete timed out");
        }
        for page in self.pages.lock().unwrap().iter_mut() {
            page.blocks.retain(|(id, _)| id != block_id);
        }
        self.deletes.lock().unwrap().push(block_id.to_string());
        Ok(())
    }

    async fn set_select_properties(
        &self,
        document_id: &str,
        properties: &[(String, String)],
    ) -> Result<()> {
        if *self.fail_properties.lock().unwrap() {
            bail!("Notion API error 400 Bad Request: Sentiment is not a property that exists.");
        }
        self.properties
            .lock()
            .unwrap()
            .push((document_id.to_string(), properties.to_vec()));
        Ok(())
    }
}

// ─── Generator ──────────────────────────────────────────────────────

/// A generator that records its inputs and returns a canned reply.
pub struct RecordingGenerator {
    reply: String,
    pub calls: Mutex<Vec<(String, String)>>,
    /// Fail on the call with this (0-based) index.
    fail_at: Option<usize>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    pub fn failing_at(reply: &str, index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new(reply)
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for RecordingGenerator {
    fn model_name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, title: &str, question: &str) -> Result<GeneratedReply> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((title.to_string(), question.to_string()));
            calls.len() - 1
        };
        if self.fail_at == Some(index) {
            bail!("error sending request for url (https://api.openai.com/v1/chat/completions)");
        }
        Ok(GeneratedReply::from_text(self.reply.clone()))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn test_config(extra: &str) -> Config {
    parse_config(&format!(
        r#"
[notion]
database_id = "db-test"
{}
"#,
        extra
    ))
    .unwrap()
}

pub fn drafter(
    config: Config,
    store: Arc<InMemoryStore>,
    generator: Arc<RecordingGenerator>,
) -> Drafter {
    Drafter::new(Arc::new(config), store, generator)
}
