//! Client-side session & realtime synchronization layer for the staff
//! ordering app.
//!
//! Three components with real lifecycle obligations live here, each written
//! against the abstract gateway and local-store capabilities so that screens
//! are pure consumers:
//!
//! - [`SessionManager`]: authentication state machine and session
//!   persistence,
//! - [`OrderFeed`]: the waiter's live order subscription with guaranteed
//!   teardown,
//! - [`CatalogQueryBridge`]: prefix-range catalog search plus the product
//!   write/delete path.

pub mod catalog;
pub mod error;
pub mod orders;
pub mod session;

pub use catalog::{CatalogQueryBridge, ProductDraft, CATALOG_COLLECTION};
pub use error::{ClientError, PartialWriteOperation, ValidationField};
pub use orders::{ConfirmationPrompt, OrderFeed, OrderFeedEvent, ORDERS_COLLECTION};
pub use session::{SessionEvent, SessionManager, SessionPhase, SESSION_STORAGE_KEY};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
