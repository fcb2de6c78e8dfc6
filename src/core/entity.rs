//! Document trait shared by every stored resource

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Base trait for documents kept in a collection.
///
/// Every document carries a string `id` that is unique within its collection
/// and never changes after the first successful insert. Ids are assigned by
/// the client or synthesized by the handler, never by the store.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name used by the store (e.g., "menuitems", "orders")
    fn collection_name() -> &'static str;

    /// Singular, human-readable type name used in errors and logs
    fn type_name() -> &'static str;

    /// Get the unique identifier for this document
    fn id(&self) -> &str;

    /// Replace the identifier (only valid before the first insert)
    fn set_id(&mut self, id: String);
}
