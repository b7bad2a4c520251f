//! Reply generation via the OpenAI chat completions API.
//!
//! [`OpenAIGenerator`] implements [`ReplyGenerator`]: it renders one prompt
//! per request with [`build_prompt`], sends it as a single user message to
//! `POST {api_base}/chat/completions`, and returns the model's text
//! verbatim.
//!
//! # Failure Policy
//!
//! There is no retry. Network errors, non-2xx responses, and malformed
//! response bodies all surface as errors to the caller, which aborts the
//! current run. The next scheduled run picks the document up again.
//!
//! # Labels
//!
//! The prompt asks the model to finish with a `Sentiment:` and a `Category:`
//! line. [`parse_labels`] reads them back out of the text so the pipeline can
//! log them and, when configured, copy them into database properties. The
//! reply text itself is never rewritten.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::models::{Category, GeneratedReply, Sentiment};
use crate::traits::ReplyGenerator;

/// Renders the instruction sent to the model for one support request.
pub fn build_prompt(company: &str, title: &str, question: &str) -> String {
    let sentiments = Sentiment::ALL.map(|s| s.as_str()).join("/");
    let categories = Category::ALL.map(|c| c.as_str()).join("/");

    format!(
        "You are a friendly customer support agent for {company}, a company selling refurbished electronics.

Customer Request: {title}

Customer Message:
{question}

Generate a professional, empathetic response in the same language as the customer.
Include:
1. Acknowledge their concern
2. Provide helpful information or next steps
3. Offer to help further

Keep it concise (under 200 words).

Also provide at the end:
- Sentiment: ({sentiments})
- Category: ({categories})
"
    )
}

/// Reads the trailing `Sentiment:` / `Category:` lines of a reply.
///
/// Matching is case-insensitive and tolerates list bullets and markdown
/// bold. A value naming zero or several labels yields `None`. When a label
/// line appears more than once, the last one wins.
pub fn parse_labels(text: &str) -> (Option<Sentiment>, Option<Category>) {
    let mut sentiment = None;
    let mut category = None;

    for line in text.lines() {
        let Some((key, value)) = split_label_line(line) else {
            continue;
        };
        match key.as_str() {
            "sentiment" => {
                if let Some(s) = single_match(&value, &Sentiment::ALL, |s| s.as_str()) {
                    sentiment = Some(s);
                }
            }
            "category" => {
                if let Some(c) = single_match(&value, &Category::ALL, |c| c.as_str()) {
                    category = Some(c);
                }
            }
            _ => {}
        }
    }

    (sentiment, category)
}

fn split_label_line(line: &str) -> Option<(String, String)> {
    let line = line
        .trim()
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .replace("**", "");
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
}

fn single_match<T: Copy>(value: &str, all: &[T], name: impl Fn(&T) -> &'static str) -> Option<T> {
    let value = value.to_lowercase();
    let mut hits = all
        .iter()
        .filter(|label| value.contains(&name(*label).to_lowercase()));
    match (hits.next(), hits.next()) {
        (Some(label), None) => Some(*label),
        _ => None,
    }
}

// ============ OpenAI Generator ============

/// Reply generator backed by the OpenAI chat completions endpoint.
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    company: String,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            company: config.company.clone(),
        })
    }
}

#[async_trait]
impl ReplyGenerator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, title: &str, question: &str) -> Result<GeneratedReply> {
        let prompt = build_prompt(&self.company, title, question);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_tokens,
        });

        tracing::debug!(model = %self.model, title, "requesting draft reply");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let text = parse_completion_response(&json)?;
        Ok(GeneratedReply::from_text(text))
    }
}

/// Pulls `choices[0].message.content` out of a chat completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}
