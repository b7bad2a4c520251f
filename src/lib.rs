//! # Support Drafter
//!
//! Drafts replies to customer-support requests kept in a Notion database.
//!
//! Every run lists the request pages, reads each page's body, and for pages
//! that have a question but no draft yet, asks an OpenAI model for a reply
//! and appends it to the page under a `🤖 AI Draft Response (HH:MM)` callout.
//! That callout is also how later runs recognise a page as answered, so the
//! pipeline can be triggered every minute without duplicating drafts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────────┐   ┌──────────────┐
//! │ Notion DB    │──▶│ Pipeline                     │──▶│ Notion page  │
//! │ (requests)   │   │ extract → generate → annotate│   │ (+ draft)    │
//! └──────────────┘   └──────────────┬───────────────┘   └──────────────┘
//!                                   │
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                 ▼                 ▼
//!           ┌──────────┐      ┌──────────┐      ┌──────────┐
//!           │ CLI run  │      │  HTTP    │      │  watch   │
//!           └──────────┘      └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export NOTION_TOKEN=... OPENAI_API_KEY=...
//! drafter run --dry-run           # see what would be drafted
//! drafter run                     # draft once
//! drafter serve                   # GET /api/process for a cron trigger
//! drafter watch --interval 60     # built-in schedule
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credentials |
//! | [`models`] | Core data types |
//! | [`traits`] | Store and generator seams |
//! | [`connector_notion`] | Notion REST client |
//! | [`generation`] | Prompt, OpenAI client, label parsing |
//! | [`extract`] | Request extraction |
//! | [`annotate`] | Draft block writer |
//! | [`pipeline`] | Run orchestration |
//! | [`run_cmd`] | `drafter run` / `inspect` output |
//! | [`server`] | HTTP trigger |
//! | [`watch`] | Interval scheduler |

pub mod annotate;
pub mod config;
pub mod connector_notion;
pub mod extract;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod run_cmd;
pub mod server;
pub mod traits;
pub mod watch;
