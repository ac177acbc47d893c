//! Document store module - the storage seam for user state.

mod store_memory;
mod store_traits;

pub use store_memory::InMemoryDocumentStore;
pub use store_traits::{Document, DocumentStore};
