//! Wire-format payloads for the documents this client reads and writes.
//!
//! Field names follow the remote store's schema (`waiter_id`,
//! `name_insensitive`, `price_sizes`, ...), so every record here is a plain
//! serde mirror of one document shape plus its mapping into the domain type.

use serde::{Deserialize, Serialize};

use crate::domain::{CatalogEntry, Order, OrderStatus, PriceBySize, Session};

/// Profile document stored under `users/{identity}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl ProfileRecord {
    /// Merge the remote profile with the authenticated identity into a
    /// session. The identity comes from `authenticate`, never the profile.
    pub fn into_session(self, user_id: impl Into<String>) -> Session {
        Session {
            user_id: user_id.into(),
            display_name: self.name,
            is_admin: self.is_admin,
        }
    }
}

/// Order document stored in the `orders` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub waiter_id: String,
    pub pizza: String,
    pub size: String,
    pub quantity: u32,
    pub table_number: String,
    pub amount: String,
    pub image: String,
    pub status: OrderStatus,
}

impl OrderRecord {
    pub fn into_order(self, id: impl Into<String>) -> Order {
        Order {
            id: id.into(),
            waiter_id: self.waiter_id,
            product_name: self.pizza,
            size: self.size,
            quantity: self.quantity,
            table_number: self.table_number,
            amount: self.amount,
            photo_url: self.image,
            status: self.status,
        }
    }
}

/// Catalog document stored in the `pizzas` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    pub name_insensitive: String,
    pub description: String,
    pub price_sizes: PriceBySize,
    pub photo_url: String,
    pub photo_path: String,
}

impl CatalogRecord {
    pub fn into_entry(self, id: impl Into<String>) -> CatalogEntry {
        CatalogEntry {
            id: id.into(),
            name: self.name,
            normalized_name: self.name_insensitive,
            description: self.description,
            price_by_size: self.price_sizes,
            photo_url: self.photo_url,
            photo_path: self.photo_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_merges_identity_into_session() {
        let profile = ProfileRecord {
            name: "Ana".into(),
            is_admin: false,
        };
        let session = profile.into_session("uid-9");
        assert_eq!(session.user_id, "uid-9");
        assert_eq!(session.display_name, "Ana");
        assert!(!session.is_admin);
    }

    #[test]
    fn order_record_deserializes_store_schema() {
        let record: OrderRecord = serde_json::from_value(serde_json::json!({
            "waiter_id": "w-1",
            "pizza": "Margherita",
            "size": "M",
            "quantity": 2,
            "table_number": "5",
            "amount": "44.90",
            "image": "https://blobs/pizzas/1.png",
            "status": "Pendente"
        }))
        .expect("deserialize");
        let order = record.into_order("o-1");
        assert_eq!(order.waiter_id, "w-1");
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
