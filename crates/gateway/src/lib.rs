//! Abstract capability surface of the remote document/blob store.
//!
//! The client never talks to the backend except through [`RemoteDataGateway`];
//! the concrete [`HttpGateway`] lives in [`http`] and everything above it is
//! written against the trait so tests can substitute recording fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::{sync::mpsc, task::JoinHandle};

use shared::error::GatewayError;

pub mod http;

pub use http::HttpGateway;

/// One remote document: an opaque id plus its field payload. Callers decode
/// `data` into the typed records in `shared::records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Range scan over one indexed field, ordered by that same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub collection: String,
    pub field: String,
    pub start: String,
    pub end: String,
    pub order: SortOrder,
}

/// Equality filter applied server-side to a live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualsFilter {
    pub field: String,
    pub value: String,
}

impl EqualsFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Identity issued by a successful `authenticate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
    pub token: String,
}

/// Handle to one live document-set subscription.
///
/// Each received item is the full current document set for the subscribed
/// filter, not a diff. `unsubscribe` (or dropping the handle) tears down the
/// reader task; no further snapshots are delivered after that.
pub struct Subscription {
    events: mpsc::Receiver<Vec<Document>>,
    reader: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<Vec<Document>>, reader: JoinHandle<()>) -> Self {
        Self {
            events,
            reader: Some(reader),
        }
    }

    /// Channel-backed subscription with no reader task. Used by in-process
    /// gateways and tests that push snapshots by hand.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Vec<Document>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            tx,
            Self {
                events: rx,
                reader: None,
            },
        )
    }

    /// Next full snapshot, or `None` once the remote side has gone away.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.events.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.events.close();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Remote operations this layer depends on (see the system's external
/// interface contract). All failures are tagged [`GatewayError`]s.
#[async_trait]
pub trait RemoteDataGateway: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<AuthIdentity, GatewayError>;
    async fn end_session(&self) -> Result<(), GatewayError>;
    async fn reset_credential(&self, email: &str) -> Result<(), GatewayError>;
    async fn fetch_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, GatewayError>;
    async fn query_range(&self, query: RangeQuery) -> Result<Vec<Document>, GatewayError>;
    async fn subscribe(
        &self,
        collection: &str,
        filter: EqualsFilter,
    ) -> Result<Subscription, GatewayError>;
    /// Writes a new document and returns its id. Ids are generated
    /// client-side (UUID v4) when the caller does not supply one.
    async fn write_document(
        &self,
        collection: &str,
        data: serde_json::Value,
    ) -> Result<String, GatewayError>;
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), GatewayError>;
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), GatewayError>;
    async fn upload_blob(&self, path: &str, local_file: &Path) -> Result<String, GatewayError>;
    async fn delete_blob(&self, path: &str) -> Result<(), GatewayError>;
}

/// Placeholder wired in before a real backend is configured.
pub struct MissingGateway;

#[async_trait]
impl RemoteDataGateway for MissingGateway {
    async fn authenticate(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<AuthIdentity, GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn reset_credential(&self, _email: &str) -> Result<(), GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn fetch_document(
        &self,
        _collection: &str,
        _id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn query_range(&self, _query: RangeQuery) -> Result<Vec<Document>, GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn subscribe(
        &self,
        _collection: &str,
        _filter: EqualsFilter,
    ) -> Result<Subscription, GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn write_document(
        &self,
        _collection: &str,
        _data: serde_json::Value,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn update_document(
        &self,
        _collection: &str,
        _id: &str,
        _patch: serde_json::Value,
    ) -> Result<(), GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> Result<(), GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn upload_blob(&self, _path: &str, _local_file: &Path) -> Result<String, GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }

    async fn delete_blob(&self, _path: &str) -> Result<(), GatewayError> {
        Err(GatewayError::unavailable("remote gateway is not configured"))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
