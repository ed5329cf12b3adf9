//! # Product Cache
//!
//! SQLite-backed `ProductCache` using Turso. Records are stored as their
//! serialized JSON payload keyed by identifier; confidence and timestamp are
//! lifted into columns for ad-hoc inspection of the database.

use async_trait::async_trait;
use enrich::pipeline::ProductCache;
use enrich::types::{EnrichedRecord, VerificationSummary};
use enrich::EnrichError;
use tracing::info;
use turso::{params, Builder, Database};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS enriched_products (
    identifier TEXT PRIMARY KEY,
    confidence INTEGER NOT NULL,
    payload    TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

/// A cache of verified enrichment results in a local SQLite database.
pub struct TursoCache {
    db: Database,
}

impl TursoCache {
    /// Opens (or creates) the database at `db_path` and ensures the schema.
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let db = Builder::new_local(db_path).build().await?;
        let conn = db.connect()?;
        conn.execute(SCHEMA, ()).await?;
        info!(db_path, "product cache ready");
        Ok(Self { db })
    }
}

#[async_trait]
impl ProductCache for TursoCache {
    async fn lookup(&self, identifier: &str) -> Result<Option<EnrichedRecord>, EnrichError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| EnrichError::Cache(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT payload FROM enriched_products WHERE identifier = ?")
            .await
            .map_err(|e| EnrichError::Cache(e.to_string()))?;
        let mut rows = stmt
            .query(params![identifier])
            .await
            .map_err(|e| EnrichError::Cache(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| EnrichError::Cache(e.to_string()))?
        else {
            return Ok(None);
        };
        let payload: String = row.get(0).map_err(|e| EnrichError::Cache(e.to_string()))?;
        let mut record: EnrichedRecord =
            serde_json::from_str(&payload).map_err(|e| EnrichError::Cache(e.to_string()))?;

        // Only exact-match records are ever saved, so a hit can assert full
        // verification without re-running it.
        record.reasoning = format!(
            "Cached result from {} verified sources",
            record.sources.len()
        );
        record.verification = Some(VerificationSummary {
            is_exact_match: true,
            brand_match: true,
            size_match: true,
            color_match: true,
            mismatches: Vec::new(),
        });

        Ok(Some(record))
    }

    async fn save(&self, record: &EnrichedRecord) -> Result<(), EnrichError> {
        let payload =
            serde_json::to_string(record).map_err(|e| EnrichError::Cache(e.to_string()))?;
        let conn = self
            .db
            .connect()
            .map_err(|e| EnrichError::Cache(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO enriched_products (identifier, confidence, payload, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                record.identifier.as_str(),
                record.confidence as i64,
                payload,
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .await
        .map_err(|e| EnrichError::Cache(e.to_string()))?;
        Ok(())
    }
}
