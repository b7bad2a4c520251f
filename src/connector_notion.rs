//! Notion connector.
//!
//! Reads support requests from a Notion database and writes draft replies
//! back into the request pages, using the Notion REST API directly.
//!
//! # Configuration
//!
//! ```toml
//! [notion]
//! database_id = "a4db05f8-fdd2-40a6-9f26-39a7815af653"
//! # api_base = "https://api.notion.com/v1"
//! # version = "2022-06-28"
//! # token_env = "NOTION_TOKEN"
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Used for |
//! |--------|------|----------|
//! | `POST` | `/databases/{id}/query` | listing request pages |
//! | `GET` | `/pages/{id}` | single page lookup |
//! | `GET` | `/blocks/{id}/children` | reading a page body |
//! | `PATCH` | `/blocks/{id}/children` | appending the draft |
//! | `DELETE` | `/blocks/{id}` | removing a pending marker |
//! | `PATCH` | `/pages/{id}` | setting label properties |
//!
//! # Pagination
//!
//! Listing and block reads follow `has_more` / `next_cursor` until the last
//! page, so databases and pages with more than 100 entries are read fully.
//!
//! # Rich Text Limits
//!
//! Notion rejects text runs longer than 2000 characters. Outgoing text is
//! split into consecutive runs of at most [`MAX_RUN_CHARS`] characters inside
//! the same block, which keeps the block's visible text unchanged.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::NotionConfig;
use crate::models::{ContentBlock, DocumentSummary, RichText};
use crate::traits::DocumentStore;

/// Longest text run Notion accepts in a single rich text object.
pub const MAX_RUN_CHARS: usize = 2000;

const PAGE_SIZE: usize = 100;

/// A Notion database of support requests.
pub struct NotionStore {
    client: reqwest::Client,
    api_base: String,
    database_id: String,
    token: String,
    version: String,
}

impl NotionStore {
    pub fn new(config: &NotionConfig, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
            token: token.into(),
            version: config.version.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .header("Content-Type", "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Notion API error {}: {}", status, error_message(&body_text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DocumentStore for NotionStore {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let path = format!("/databases/{}/query", self.database_id);
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }

            let page = self
                .send(self.request(reqwest::Method::POST, &path).json(&body))
                .await?;

            for result in results(&page) {
                if let Some(doc) = parse_page(result) {
                    documents.push(doc);
                }
            }

            cursor = next_cursor(&page);
            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!(count = documents.len(), "listed database pages");
        Ok(documents)
    }

    async fn get_document(&self, document_id: &str) -> Result<DocumentSummary> {
        let page = self
            .send(self.request(reqwest::Method::GET, &format!("/pages/{}", document_id)))
            .await?;

        parse_page(&page)
            .ok_or_else(|| anyhow::anyhow!("Invalid Notion response: page has no id"))
    }

    async fn fetch_blocks(&self, document_id: &str) -> Result<Vec<ContentBlock>> {
        let path = format!("/blocks/{}/children", document_id);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", PAGE_SIZE.to_string())];
            if let Some(c) = &cursor {
                query.push(("start_cursor", c.clone()));
            }

            let page = self
                .send(self.request(reqwest::Method::GET, &path).query(&query))
                .await?;

            blocks.extend(results(&page).iter().map(parse_block));

            cursor = next_cursor(&page);
            if cursor.is_none() {
                break;
            }
        }

        Ok(blocks)
    }

    async fn append_blocks(
        &self,
        document_id: &str,
        blocks: &[ContentBlock],
    ) -> Result<Vec<String>> {
        let children = blocks
            .iter()
            .map(block_to_json)
            .collect::<Result<Vec<_>>>()?;

        let path = format!("/blocks/{}/children", document_id);
        let response = self
            .send(
                self.request(reqwest::Method::PATCH, &path)
                    .json(&json!({ "children": children })),
            )
            .await?;

        Ok(results(&response)
            .iter()
            .filter_map(|b| b.get("id").and_then(|id| id.as_str()))
            .map(str::to_string)
            .collect())
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        self.send(self.request(reqwest::Method::DELETE, &format!("/blocks/{}", block_id)))
            .await?;
        Ok(())
    }

    async fn set_select_properties(
        &self,
        document_id: &str,
        properties: &[(String, String)],
    ) -> Result<()> {
        if properties.is_empty() {
            return Ok(());
        }

        let mut props = serde_json::Map::new();
        for (name, option) in properties {
            props.insert(name.clone(), json!({ "select": { "name": option } }));
        }

        self.send(
            self.request(reqwest::Method::PATCH, &format!("/pages/{}", document_id))
                .json(&json!({ "properties": props })),
        )
        .await?;
        Ok(())
    }
}

// ============ Response parsing ============

fn results(page: &Value) -> &[Value] {
    page.get("results")
        .and_then(|r| r.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn next_cursor(page: &Value) -> Option<String> {
    let has_more = page
        .get("has_more")
        .and_then(|h| h.as_bool())
        .unwrap_or(false);
    if !has_more {
        return None;
    }
    page.get("next_cursor")
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

/// Prefers the `message` field of a Notion error body over the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Converts a page object into a [`DocumentSummary`].
///
/// The title comes from the first run of the first property of type
/// `title`; an empty title property or empty first run yields `None`. Returns `None` only when the page has no id.
pub fn parse_page(page: &Value) -> Option<DocumentSummary> {
    let id = page.get("id")?.as_str()?.to_string();

    let title = page
        .get("properties")
        .and_then(|p| p.as_object())
        .and_then(|props| {
            props
                .values()
                .find(|prop| prop.get("type").and_then(|t| t.as_str()) == Some("title"))
        })
        .and_then(|prop| prop.get("title"))
        .and_then(|runs| runs.as_array())
        .and_then(|runs| runs.first())
        .and_then(|run| run.get("plain_text"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Some(DocumentSummary { id, title })
}

/// Converts a block object into a [`ContentBlock`].
///
/// Kinds the pipeline does not care about become [`ContentBlock::Other`].
pub fn parse_block(block: &Value) -> ContentBlock {
    let kind = block
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unsupported");
    let body = block.get(kind);

    match kind {
        "divider" => ContentBlock::Divider,
        "paragraph" => ContentBlock::Paragraph {
            text: parse_rich_text(body),
        },
        "callout" => ContentBlock::Callout {
            text: parse_rich_text(body),
            icon: body
                .and_then(|b| b.get("icon"))
                .and_then(|i| i.get("emoji"))
                .and_then(|e| e.as_str())
                .map(str::to_string),
            color: body
                .and_then(|b| b.get("color"))
                .and_then(|c| c.as_str())
                .map(str::to_string),
        },
        other => ContentBlock::Other {
            kind: other.to_string(),
        },
    }
}

fn parse_rich_text(body: Option<&Value>) -> Vec<RichText> {
    body.and_then(|b| b.get("rich_text"))
        .and_then(|r| r.as_array())
        .map(|runs| {
            runs.iter()
                .map(|run| {
                    RichText::new(
                        run.get("plain_text")
                            .and_then(|t| t.as_str())
                            .unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

// ============ Request building ============

/// Renders a [`ContentBlock`] as a Notion block object for an append call.
pub fn block_to_json(block: &ContentBlock) -> Result<Value> {
    let value = match block {
        ContentBlock::Divider => json!({
            "object": "block",
            "type": "divider",
            "divider": {}
        }),
        ContentBlock::Paragraph { text } => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": { "rich_text": rich_text_json(text) }
        }),
        ContentBlock::Callout { text, icon, color } => {
            let mut callout = json!({ "rich_text": rich_text_json(text) });
            if let Some(emoji) = icon {
                callout["icon"] = json!({ "type": "emoji", "emoji": emoji });
            }
            if let Some(color) = color {
                callout["color"] = json!(color);
            }
            json!({
                "object": "block",
                "type": "callout",
                "callout": callout
            })
        }
        ContentBlock::Other { kind } => bail!("cannot append block of kind '{}'", kind),
    };
    Ok(value)
}

fn rich_text_json(runs: &[RichText]) -> Vec<Value> {
    runs.iter()
        .flat_map(|run| split_run(&run.plain_text))
        .map(|content| json!({ "type": "text", "text": { "content": content } }))
        .collect()
}

/// Splits text into pieces of at most [`MAX_RUN_CHARS`] characters.
fn split_run(text: &str) -> Vec<String> {
    if text.chars().count() <= MAX_RUN_CHARS {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_RUN_CHARS)
        .map(|c| c.iter().collect())
        .collect()
}
