use std::sync::Arc;

use async_trait::async_trait;
use gateway::{Document, EqualsFilter, RemoteDataGateway};
use shared::{
    domain::{Order, OrderStatus, Session},
    records::OrderRecord,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::error::ClientError;

pub const ORDERS_COLLECTION: &str = "orders";
const WAITER_FIELD: &str = "waiter_id";
const EVENT_BUFFER: usize = 64;

const DELIVERY_PROMPT_TITLE: &str = "Pedido";
const DELIVERY_PROMPT_MESSAGE: &str = "Confirmar que a pizza foi entregue?";

/// Two-choice decision put to the member of staff before a destructive or
/// irreversible action. Screens provide the real dialog; tests script it.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> bool;
}

#[derive(Debug, Clone)]
pub enum OrderFeedEvent {
    /// Full replacement snapshot; never an incremental patch.
    Snapshot(Vec<Order>),
    WriteFailed { order_id: String, message: String },
}

struct FeedState {
    orders: Vec<Order>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

/// Live, waiter-scoped view of the `orders` collection.
///
/// Holds at most one active subscription; every received document set
/// replaces the materialized list wholesale, preserving remote order.
pub struct OrderFeed {
    gateway: Arc<dyn RemoteDataGateway>,
    prompt: Arc<dyn ConfirmationPrompt>,
    inner: Mutex<FeedState>,
    events: broadcast::Sender<OrderFeedEvent>,
}

impl OrderFeed {
    pub fn new(
        gateway: Arc<dyn RemoteDataGateway>,
        prompt: Arc<dyn ConfirmationPrompt>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Arc::new(Self {
            gateway,
            prompt,
            inner: Mutex::new(FeedState {
                orders: Vec::new(),
                task: None,
                generation: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<OrderFeedEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Vec<Order> {
        self.inner.lock().await.orders.clone()
    }

    /// Establishes the single live subscription for `session`'s orders.
    /// Starting while already started stops the previous subscription first.
    pub async fn start(self: &Arc<Self>, session: &Session) -> Result<(), ClientError> {
        self.stop().await;

        let mut subscription = self
            .gateway
            .subscribe(
                ORDERS_COLLECTION,
                EqualsFilter::new(WAITER_FIELD, &session.user_id),
            )
            .await
            .map_err(ClientError::QueryFailed)?;

        let waiter_id = session.user_id.clone();
        let feed = Arc::clone(self);
        // Generation read and task registration happen under one lock
        // acquisition, so a concurrent stop() either runs before both (and
        // the task is registered against the new generation) or after (and
        // takes the handle it must abort).
        let mut inner = self.inner.lock().await;
        let generation = inner.generation;
        let task = tokio::spawn(async move {
            while let Some(documents) = subscription.recv().await {
                let orders = materialize_orders(documents, &waiter_id);
                {
                    let mut inner = feed.inner.lock().await;
                    // A snapshot racing with stop() must not touch state.
                    if inner.generation != generation {
                        break;
                    }
                    inner.orders = orders.clone();
                }
                let _ = feed.events.send(OrderFeedEvent::Snapshot(orders));
            }
            debug!(%waiter_id, "order subscription closed");
        });
        inner.task = Some(task);
        Ok(())
    }

    /// Releases the subscription. Safe to call repeatedly and on a feed that
    /// never started; the materialized list keeps its last-known-good value.
    pub async fn stop(&self) {
        let task = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.task.take()
        };
        if let Some(task) = task {
            task.abort();
        }
    }

    /// Confirms with the member of staff, then issues exactly one status
    /// update targeting `order_id`. Declining issues no write. The local list
    /// is never mutated here; the next subscription snapshot is the source of
    /// truth. Returns whether a write was issued.
    pub async fn mark_delivered(&self, order_id: &str) -> Result<bool, ClientError> {
        if !self
            .prompt
            .confirm(DELIVERY_PROMPT_TITLE, DELIVERY_PROMPT_MESSAGE)
            .await
        {
            return Ok(false);
        }

        let patch = serde_json::json!({ "status": OrderStatus::Delivered.as_wire() });
        if let Err(err) = self
            .gateway
            .update_document(ORDERS_COLLECTION, order_id, patch)
            .await
        {
            let _ = self.events.send(OrderFeedEvent::WriteFailed {
                order_id: order_id.to_string(),
                message: ClientError::DeliveryUpdateFailed(err.clone()).user_message().to_string(),
            });
            return Err(ClientError::DeliveryUpdateFailed(err));
        }
        Ok(true)
    }
}

/// Maps one remote document set into domain orders, preserving remote order.
/// Malformed documents are skipped; documents for another waiter are never
/// surfaced even if the remote filter misbehaves.
fn materialize_orders(documents: Vec<Document>, waiter_id: &str) -> Vec<Order> {
    documents
        .into_iter()
        .filter_map(|document| {
            let record: OrderRecord = match serde_json::from_value(document.data) {
                Ok(record) => record,
                Err(err) => {
                    warn!(order_id = %document.id, "skipping malformed order document: {err}");
                    return None;
                }
            };
            if record.waiter_id != waiter_id {
                warn!(
                    order_id = %document.id,
                    "skipping order owned by another waiter"
                );
                return None;
            }
            Some(record.into_order(document.id))
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/orders_tests.rs"]
mod tests;
