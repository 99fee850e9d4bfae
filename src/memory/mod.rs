//! Memory records and their persistence.
//!
//! A memory record is the durable, structured summary of one ingested
//! piece of content. This module owns the record schema, the content-type
//! derivation, and the document-store client that persists records.

mod store;
mod types;

pub use store::{MemoryStore, SupabaseStore};
pub use types::{ist_now, AnalysisResult, ContentType, MemoryRecord, UNTITLED_MEMORY};

use crate::config::StoreConfig;
use std::sync::Arc;

/// Initialize the memory store.
///
/// Returns `None` if the store is not configured (Supabase credentials
/// missing); the pipeline then rejects captures with a store-unavailable
/// error instead of doing wasted scrape/analyze work.
pub fn init_store(config: &StoreConfig) -> Option<Arc<dyn MemoryStore>> {
    let (Some(url), Some(key)) = (&config.url, &config.service_role_key) else {
        tracing::warn!("Memory store disabled (no Supabase config); captures will be rejected");
        return None;
    };

    tracing::info!("Memory store initialized (collection: {})", config.table);
    Some(Arc::new(SupabaseStore::new(url, key, config.table.clone())))
}
