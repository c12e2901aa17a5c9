use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::Utc;
use gateway::{Document, RangeQuery, RemoteDataGateway, SortOrder};
use shared::{
    domain::{normalize_name, CatalogEntry, PriceBySize},
    records::CatalogRecord,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ClientError, PartialWriteOperation, ValidationField};

pub const CATALOG_COLLECTION: &str = "pizzas";
const NAME_INDEX_FIELD: &str = "name_insensitive";

/// Upper bound for a prefix-range scan: the store's maximum-codepoint
/// sentinel appended to the normalized term.
const QUERY_RANGE_SENTINEL: char = '\u{f8ff}';

/// Everything the product form collects. The image is a local file handle
/// produced by the picker; `None` means no image was selected.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub image: Option<PathBuf>,
    pub price_p: String,
    pub price_m: String,
    pub price_g: String,
}

struct CatalogState {
    entries: Vec<CatalogEntry>,
}

/// Bridges free-text search terms to prefix-range queries on the catalog's
/// normalized-name index, and carries the catalog's write/delete path.
///
/// Queries are one-shot, not subscriptions: each successful call replaces
/// the materialized list wholesale. Overlapping calls are resolved by a
/// sequence tag; a result that is no longer the latest issued is discarded
/// rather than allowed to overwrite a newer one.
pub struct CatalogQueryBridge {
    gateway: Arc<dyn RemoteDataGateway>,
    inner: Mutex<CatalogState>,
    issued: AtomicU64,
}

impl CatalogQueryBridge {
    pub fn new(gateway: Arc<dyn RemoteDataGateway>) -> Self {
        Self {
            gateway,
            inner: Mutex::new(CatalogState {
                entries: Vec::new(),
            }),
            issued: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> Vec<CatalogEntry> {
        self.inner.lock().await.entries.clone()
    }

    /// Runs one prefix-range query for `term` (empty term matches all) and
    /// returns the materialized list now held by the bridge. On failure the
    /// previous list is left untouched.
    pub async fn query(&self, term: &str) -> Result<Vec<CatalogEntry>, ClientError> {
        let normalized = normalize_name(term);
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self
            .gateway
            .query_range(RangeQuery {
                collection: CATALOG_COLLECTION.to_string(),
                field: NAME_INDEX_FIELD.to_string(),
                start: normalized.clone(),
                end: format!("{normalized}{QUERY_RANGE_SENTINEL}"),
                order: SortOrder::Ascending,
            })
            .await;

        let documents = result.map_err(|err| {
            warn!(term = %normalized, "catalog query failed: {err}");
            ClientError::QueryFailed(err)
        })?;

        let entries = materialize_entries(documents);
        let mut inner = self.inner.lock().await;
        if ticket != self.issued.load(Ordering::SeqCst) {
            // A newer query was issued while this one was in flight; its
            // result wins regardless of arrival order.
            debug!(term = %normalized, "discarding stale catalog query result");
            return Ok(inner.entries.clone());
        }
        inner.entries = entries.clone();
        Ok(entries)
    }

    /// Clear trigger: drops the term and re-issues the match-all query.
    pub async fn clear(&self) -> Result<Vec<CatalogEntry>, ClientError> {
        self.query("").await
    }

    /// Screen re-entry: re-runs the match-all query so catalog changes made
    /// elsewhere become visible.
    pub async fn refresh(&self) -> Result<Vec<CatalogEntry>, ClientError> {
        self.query("").await
    }

    /// Validates the draft (name, description, image, then prices; first
    /// failure short-circuits with no network call), uploads the photo under
    /// a timestamped blob key, then writes the catalog document embedding the
    /// normalized name and the blob key. A document write failing after a
    /// successful upload surfaces the orphaned blob instead of masking it.
    pub async fn create_product(&self, draft: ProductDraft) -> Result<CatalogEntry, ClientError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ClientError::validation(ValidationField::Name));
        }
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(ClientError::validation(ValidationField::Description));
        }
        let Some(image) = draft.image else {
            return Err(ClientError::validation(ValidationField::Image));
        };
        if draft.price_p.trim().is_empty()
            || draft.price_m.trim().is_empty()
            || draft.price_g.trim().is_empty()
        {
            return Err(ClientError::validation(ValidationField::Prices));
        }

        let blob_path = format!("/pizzas/{}.png", Utc::now().timestamp_millis());
        let photo_url = self
            .gateway
            .upload_blob(&blob_path, &image)
            .await
            .map_err(ClientError::CreateProductFailed)?;

        let record = CatalogRecord {
            name: name.to_string(),
            name_insensitive: normalize_name(name),
            description: description.to_string(),
            price_sizes: PriceBySize {
                p: draft.price_p.trim().to_string(),
                m: draft.price_m.trim().to_string(),
                g: draft.price_g.trim().to_string(),
            },
            photo_url,
            photo_path: blob_path.clone(),
        };
        let data = serde_json::to_value(&record)
            .map_err(|err| ClientError::Storage(err.to_string()))?;

        let id = self
            .gateway
            .write_document(CATALOG_COLLECTION, data)
            .await
            .map_err(|source| {
                warn!(%blob_path, "document write failed after blob upload; blob orphaned");
                ClientError::PartialWrite {
                    operation: PartialWriteOperation::ProductCreate,
                    orphaned_path: blob_path.clone(),
                    source,
                }
            })?;

        info!(product_id = %id, "product registered");
        Ok(record.into_entry(id))
    }

    /// Deletes the document first, then the blob. A blob failure after the
    /// document is gone is reported as a partial write naming the orphan.
    pub async fn delete_product(&self, id: &str, photo_path: &str) -> Result<(), ClientError> {
        self.gateway
            .delete_document(CATALOG_COLLECTION, id)
            .await
            .map_err(ClientError::DeleteProductFailed)?;

        self.gateway.delete_blob(photo_path).await.map_err(|source| {
            warn!(product_id = %id, %photo_path, "blob deletion failed after document removal");
            ClientError::PartialWrite {
                operation: PartialWriteOperation::ProductDelete,
                orphaned_path: photo_path.to_string(),
                source,
            }
        })?;

        info!(product_id = %id, "product deleted");
        Ok(())
    }
}

fn materialize_entries(documents: Vec<Document>) -> Vec<CatalogEntry> {
    documents
        .into_iter()
        .filter_map(|document| match serde_json::from_value::<CatalogRecord>(document.data) {
            Ok(record) => Some(record.into_entry(document.id)),
            Err(err) => {
                warn!(entry_id = %document.id, "skipping malformed catalog document: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
