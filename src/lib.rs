//! # mindvault
//!
//! Self-hosted intelligence service that turns captured pages and notes
//! into structured, persisted memories.
//!
//! ## Architecture
//!
//! ```text
//!   capture (url / text / title)
//!              │
//!              ▼
//!     ┌─────────────────┐     ┌──────────────┐
//!     │    Pipeline      │────▶│  Firecrawl   │  (scrape, optional)
//!     │ classify/acquire │     └──────────────┘
//!     │ analyze/compose  │     ┌──────────────┐
//!     │     persist      │────▶│   Mistral    │  (analysis)
//!     └────────┬─────────┘     └──────────────┘
//!              │
//!              ▼
//!     ┌─────────────────┐
//!     │  Memory store    │  (append-only collection)
//!     └─────────────────┘
//! ```
//!
//! ## Request Flow
//! 1. Receive a capture via `POST /receive_data`
//! 2. Scrape the URL, or fall back to the user's note
//! 3. Analyze the text into title/summary/keywords/emotions
//! 4. Compose the memory record and persist it, returning the id
//!
//! ## Modules
//! - `pipeline`: the ingestion pipeline and its error taxonomy
//! - `scrape`: Firecrawl content-extraction client
//! - `llm`: analyzer capability trait and Mistral client
//! - `memory`: record schema and the document-store client

pub mod api;
pub mod config;
pub mod llm;
pub mod memory;
pub mod pipeline;
pub mod scrape;
pub mod util;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineError, ProcessOutcome, ProcessRequest};
