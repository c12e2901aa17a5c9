use serde::{Deserialize, Serialize};

/// Authenticated identity held by the running client instance.
///
/// A `Session` only ever comes from a successful authentication merged with
/// the remote profile record, or from rehydrating a previously persisted
/// record. `is_admin` is authoritative from the profile, never inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Entregue")]
    Delivered,
}

impl OrderStatus {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Delivered => "Entregue",
        }
    }
}

/// One order placed through a waiter's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub waiter_id: String,
    pub product_name: String,
    pub size: String,
    pub quantity: u32,
    pub table_number: String,
    pub amount: String,
    pub photo_url: String,
    pub status: OrderStatus,
}

/// Per-size price labels, fixed as P/M/G by the menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBySize {
    pub p: String,
    pub m: String,
    pub g: String,
}

/// One catalog product as surfaced to the menu screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub description: String,
    pub price_by_size: PriceBySize,
    pub photo_url: String,
    pub photo_path: String,
}

/// Sort/range key derivation for catalog names. Applied at write time and to
/// every user-typed search term, so the two can never diverge.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_lowercases_and_trims() {
        assert_eq!(normalize_name("  Margherita "), "margherita");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn session_round_trips_with_storage_field_names() {
        let session = Session {
            user_id: "u-1".into(),
            display_name: "Ana".into(),
            is_admin: true,
        };
        let json = serde_json::to_value(&session).expect("serialize");
        assert_eq!(json["id"], "u-1");
        assert_eq!(json["name"], "Ana");
        assert_eq!(json["isAdmin"], true);
    }

    #[test]
    fn order_status_wire_strings() {
        assert_eq!(OrderStatus::Pending.as_wire(), "Pendente");
        assert_eq!(OrderStatus::Delivered.as_wire(), "Entregue");
        assert_eq!(
            serde_json::to_value(OrderStatus::Delivered).expect("serialize"),
            serde_json::json!("Entregue")
        );
    }
}
