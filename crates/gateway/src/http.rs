//! REST + WebSocket implementation of [`RemoteDataGateway`].
//!
//! Request/response operations go over reqwest against the backend's
//! document API; the live subscription is a websocket that pushes the full
//! filtered document set on every change.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use shared::error::{GatewayError, GatewayErrorCode};

use crate::{
    AuthIdentity, Document, EqualsFilter, RangeQuery, RemoteDataGateway, SortOrder, Subscription,
};

const SUBSCRIPTION_BUFFER: usize = 32;

pub struct HttpGateway {
    http: Client,
    server_url: String,
    token: RwLock<Option<String>>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpGateway {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    async fn bearer(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, GatewayError> {
        let request = match self.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::unavailable(err.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::decode_failure(response).await)
    }

    async fn decode_failure(response: Response) -> GatewayError {
        let status = response.status();
        if let Ok(err) = response.json::<GatewayError>().await {
            return err;
        }
        match status {
            StatusCode::NOT_FOUND => {
                GatewayError::new(GatewayErrorCode::NotFound, "document not found")
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::new(
                GatewayErrorCode::WrongPassword,
                format!("request rejected with status {status}"),
            ),
            status if status.is_server_error() => {
                GatewayError::internal(format!("server failure: {status}"))
            }
            status => GatewayError::unavailable(format!("unexpected status {status}")),
        }
    }

    async fn decode_json<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, GatewayError> {
        response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::internal(format!("invalid response payload: {err}")))
    }

    fn subscribe_url(&self, collection: &str, filter: &EqualsFilter) -> Result<Url, GatewayError> {
        let ws_base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(GatewayError::internal(
                "server url must start with http:// or https://",
            ));
        };

        let mut url = Url::parse(&format!("{ws_base}/subscribe"))
            .map_err(|err| GatewayError::internal(format!("invalid subscribe url: {err}")))?;
        url.query_pairs_mut()
            .append_pair("collection", collection)
            .append_pair("field", &filter.field)
            .append_pair("equals", &filter.value);
        Ok(url)
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/collections/{collection}/documents", self.server_url)
    }

    fn blob_url(&self, path: &str) -> String {
        format!("{}/blobs/{}", self.server_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteDataGateway for HttpGateway {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, GatewayError> {
        let response = self
            .send(
                self.http
                    .post(format!("{}/auth/login", self.server_url))
                    .json(&LoginRequest { email, password }),
            )
            .await?;
        let identity: AuthIdentity = Self::decode_json(response).await?;
        *self.token.write().await = Some(identity.token.clone());
        Ok(identity)
    }

    async fn end_session(&self) -> Result<(), GatewayError> {
        // Clear the local token even if the remote call fails; a dropped
        // token cannot be reused by later requests.
        let result = self
            .send(self.http.post(format!("{}/auth/logout", self.server_url)))
            .await;
        *self.token.write().await = None;
        result.map(|_| ())
    }

    async fn reset_credential(&self, email: &str) -> Result<(), GatewayError> {
        self.send(
            self.http
                .post(format!("{}/auth/reset", self.server_url))
                .json(&ResetRequest { email }),
        )
        .await
        .map(|_| ())
    }

    async fn fetch_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        let response = self
            .send(
                self.http
                    .get(format!("{}/{id}", self.documents_url(collection))),
            )
            .await;
        match response {
            Ok(response) => Ok(Some(Self::decode_json(response).await?)),
            Err(err) if err.code == GatewayErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn query_range(&self, query: RangeQuery) -> Result<Vec<Document>, GatewayError> {
        let order = match query.order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        let response = self
            .send(self.http.get(self.documents_url(&query.collection)).query(&[
                ("field", query.field.as_str()),
                ("start", query.start.as_str()),
                ("end", query.end.as_str()),
                ("order", order),
            ]))
            .await?;
        Self::decode_json(response).await
    }

    async fn subscribe(
        &self,
        collection: &str,
        filter: EqualsFilter,
    ) -> Result<Subscription, GatewayError> {
        let mut url = self.subscribe_url(collection, &filter)?;
        if let Some(token) = self.bearer().await {
            url.query_pairs_mut().append_pair("token", &token);
        }

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|err| GatewayError::unavailable(format!("websocket connect failed: {err}")))?;
        let (_, mut ws_reader) = ws_stream.split();

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let collection = collection.to_string();
        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<Vec<Document>>(&text) {
                            Ok(documents) => {
                                if tx.send(documents).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                warn!(%collection, "invalid subscription frame: {err}");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%collection, "subscription receive failed: {err}");
                        break;
                    }
                }
            }
            debug!(%collection, "subscription reader finished");
        });

        Ok(Subscription::new(rx, reader))
    }

    async fn write_document(
        &self,
        collection: &str,
        data: serde_json::Value,
    ) -> Result<String, GatewayError> {
        let document = Document {
            id: Uuid::new_v4().to_string(),
            data,
        };
        let response = self
            .send(
                self.http
                    .post(self.documents_url(collection))
                    .json(&document),
            )
            .await?;
        let written: WriteResponse = Self::decode_json(response).await?;
        Ok(written.id)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), GatewayError> {
        self.send(
            self.http
                .patch(format!("{}/{id}", self.documents_url(collection)))
                .json(&patch),
        )
        .await
        .map(|_| ())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        self.send(
            self.http
                .delete(format!("{}/{id}", self.documents_url(collection))),
        )
        .await
        .map(|_| ())
    }

    async fn upload_blob(&self, path: &str, local_file: &Path) -> Result<String, GatewayError> {
        let bytes = tokio::fs::read(local_file).await.map_err(|err| {
            GatewayError::internal(format!(
                "failed to read local file '{}': {err}",
                local_file.display()
            ))
        })?;
        let response = self
            .send(self.http.put(self.blob_url(path)).body(bytes))
            .await?;
        let uploaded: UploadResponse = Self::decode_json(response).await?;
        Ok(uploaded.url)
    }

    async fn delete_blob(&self, path: &str) -> Result<(), GatewayError> {
        self.send(self.http.delete(self.blob_url(path)))
            .await
            .map(|_| ())
    }
}
