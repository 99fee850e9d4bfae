//! Supabase-backed memory store.
//!
//! The store is an append-only collection: the only operation this service
//! uses is "insert one record, get the generated id back".

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use super::types::MemoryRecord;

/// Trait for the persistence collaborator. Sole owner of the write path.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert a record and return its store-generated identifier.
    async fn add_memory(&self, record: &MemoryRecord) -> anyhow::Result<String>;
}

/// Supabase (PostgREST) store client.
pub struct SupabaseStore {
    client: Client,
    url: String,
    service_role_key: String,
    table: String,
}

impl SupabaseStore {
    /// Create a new store client for the given project and collection.
    pub fn new(url: &str, service_role_key: &str, table: String) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
            table,
        }
    }

    /// Get the PostgREST URL for the memories collection.
    fn collection_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }
}

#[async_trait]
impl MemoryStore for SupabaseStore {
    async fn add_memory(&self, record: &MemoryRecord) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(self.collection_url())
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            anyhow::bail!("Failed to insert memory: {} - {}", status, text);
        }

        // PostgREST returns the inserted rows as an array.
        #[derive(serde::Deserialize)]
        struct InsertedRow {
            id: Uuid,
        }

        let rows: Vec<InsertedRow> = serde_json::from_str(&text)?;
        rows.into_iter()
            .next()
            .map(|row| row.id.to_string())
            .ok_or_else(|| anyhow::anyhow!("No row returned from insert"))
    }
}
