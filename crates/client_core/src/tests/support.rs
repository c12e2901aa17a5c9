use std::{collections::VecDeque, path::Path, time::Duration};

use async_trait::async_trait;
use gateway::{AuthIdentity, Document, EqualsFilter, RangeQuery, RemoteDataGateway, Subscription};
use shared::error::GatewayError;
use tokio::sync::{mpsc, Mutex};

use crate::orders::ConfirmationPrompt;

/// Every remote interaction a test may assert on, in issuance order.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Authenticate { email: String },
    EndSession,
    ResetCredential { email: String },
    FetchDocument { collection: String, id: String },
    QueryRange(RangeQuery),
    Subscribe { collection: String, field: String, value: String },
    WriteDocument { collection: String, data: serde_json::Value },
    UpdateDocument { collection: String, id: String, patch: serde_json::Value },
    DeleteDocument { collection: String, id: String },
    UploadBlob { path: String },
    DeleteBlob { path: String },
}

/// One scripted `query_range` response; the delay lets tests overlap an
/// earlier slow query with a later fast one.
pub struct QueryScript {
    pub delay: Duration,
    pub result: Result<Vec<Document>, GatewayError>,
}

impl QueryScript {
    pub fn ok(documents: Vec<Document>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(documents),
        }
    }

    pub fn err(error: GatewayError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn delayed(documents: Vec<Document>, delay: Duration) -> Self {
        Self {
            delay,
            result: Ok(documents),
        }
    }
}

/// Scripted gateway that records every call for later assertions.
pub struct FakeGateway {
    pub calls: Mutex<Vec<GatewayCall>>,
    pub auth_response: Mutex<Result<AuthIdentity, GatewayError>>,
    pub profile_response: Mutex<Result<Option<Document>, GatewayError>>,
    pub query_responses: Mutex<VecDeque<QueryScript>>,
    pub write_response: Mutex<Result<String, GatewayError>>,
    pub update_response: Mutex<Result<(), GatewayError>>,
    pub delete_document_response: Mutex<Result<(), GatewayError>>,
    pub upload_response: Mutex<Result<String, GatewayError>>,
    pub delete_blob_response: Mutex<Result<(), GatewayError>>,
    pub end_session_response: Mutex<Result<(), GatewayError>>,
    pub reset_response: Mutex<Result<(), GatewayError>>,
    subscription_tx: Mutex<Option<mpsc::Sender<Vec<Document>>>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            auth_response: Mutex::new(Ok(AuthIdentity {
                user_id: "uid-1".into(),
                token: "tok-1".into(),
            })),
            profile_response: Mutex::new(Ok(Some(profile_doc("uid-1", "Ana", false)))),
            query_responses: Mutex::new(VecDeque::new()),
            write_response: Mutex::new(Ok("doc-1".into())),
            update_response: Mutex::new(Ok(())),
            delete_document_response: Mutex::new(Ok(())),
            upload_response: Mutex::new(Ok("https://blobs.example/pizzas/1.png".into())),
            delete_blob_response: Mutex::new(Ok(())),
            end_session_response: Mutex::new(Ok(())),
            reset_response: Mutex::new(Ok(())),
            subscription_tx: Mutex::new(None),
        }
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded_calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().await.clone()
    }

    pub async fn push_query(&self, script: QueryScript) {
        self.query_responses.lock().await.push_back(script);
    }

    /// Sender feeding the most recently created subscription.
    pub async fn subscription_sender(&self) -> mpsc::Sender<Vec<Document>> {
        self.subscription_tx
            .lock()
            .await
            .clone()
            .expect("no active subscription")
    }

    async fn record(&self, call: GatewayCall) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl RemoteDataGateway for FakeGateway {
    async fn authenticate(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<AuthIdentity, GatewayError> {
        self.record(GatewayCall::Authenticate {
            email: email.to_string(),
        })
        .await;
        self.auth_response.lock().await.clone()
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        self.record(GatewayCall::EndSession).await;
        self.end_session_response.lock().await.clone()
    }

    async fn reset_credential(&self, email: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::ResetCredential {
            email: email.to_string(),
        })
        .await;
        self.reset_response.lock().await.clone()
    }

    async fn fetch_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        self.record(GatewayCall::FetchDocument {
            collection: collection.to_string(),
            id: id.to_string(),
        })
        .await;
        self.profile_response.lock().await.clone()
    }

    async fn query_range(&self, query: RangeQuery) -> Result<Vec<Document>, GatewayError> {
        self.record(GatewayCall::QueryRange(query)).await;
        let script = self.query_responses.lock().await.pop_front();
        match script {
            Some(script) => {
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                script.result
            }
            None => Ok(Vec::new()),
        }
    }

    async fn subscribe(
        &self,
        collection: &str,
        filter: EqualsFilter,
    ) -> Result<Subscription, GatewayError> {
        self.record(GatewayCall::Subscribe {
            collection: collection.to_string(),
            field: filter.field.clone(),
            value: filter.value.clone(),
        })
        .await;
        let (tx, subscription) = Subscription::channel(8);
        *self.subscription_tx.lock().await = Some(tx);
        Ok(subscription)
    }

    async fn write_document(
        &self,
        collection: &str,
        data: serde_json::Value,
    ) -> Result<String, GatewayError> {
        self.record(GatewayCall::WriteDocument {
            collection: collection.to_string(),
            data,
        })
        .await;
        self.write_response.lock().await.clone()
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::UpdateDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        })
        .await;
        self.update_response.lock().await.clone()
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::DeleteDocument {
            collection: collection.to_string(),
            id: id.to_string(),
        })
        .await;
        self.delete_document_response.lock().await.clone()
    }

    async fn upload_blob(&self, path: &str, _local_file: &Path) -> Result<String, GatewayError> {
        self.record(GatewayCall::UploadBlob {
            path: path.to_string(),
        })
        .await;
        self.upload_response.lock().await.clone()
    }

    async fn delete_blob(&self, path: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::DeleteBlob {
            path: path.to_string(),
        })
        .await;
        self.delete_blob_response.lock().await.clone()
    }
}

/// Prompt whose answer is scripted; records how often it was shown.
pub struct ScriptedPrompt {
    pub answer: bool,
    pub shown: Mutex<u32>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            shown: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ConfirmationPrompt for ScriptedPrompt {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        *self.shown.lock().await += 1;
        self.answer
    }
}

pub fn profile_doc(id: &str, name: &str, is_admin: bool) -> Document {
    Document {
        id: id.to_string(),
        data: serde_json::json!({ "name": name, "isAdmin": is_admin }),
    }
}

pub fn order_doc(id: &str, waiter_id: &str, status: &str) -> Document {
    Document {
        id: id.to_string(),
        data: serde_json::json!({
            "waiter_id": waiter_id,
            "pizza": "Margherita",
            "size": "M",
            "quantity": 1,
            "table_number": "5",
            "amount": "39.90",
            "image": "https://blobs.example/pizzas/1.png",
            "status": status,
        }),
    }
}

pub fn catalog_doc(id: &str, name: &str) -> Document {
    Document {
        id: id.to_string(),
        data: serde_json::json!({
            "name": name,
            "name_insensitive": name.trim().to_lowercase(),
            "description": "Mussarela e manjericão",
            "price_sizes": { "p": "29.90", "m": "39.90", "g": "49.90" },
            "photo_url": format!("https://blobs.example/pizzas/{id}.png"),
            "photo_path": format!("/pizzas/{id}.png"),
        }),
    }
}
