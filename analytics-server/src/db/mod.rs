//! Order store
//!
//! Read-side access to raw order documents. Components receive an
//! `Arc<dyn OrderStore>` at construction; there is no global instance.
//!
//! - [`memory`] - `InMemoryOrderStore`, interprets pipelines in process
//! - [`surreal`] - `SurrealOrderStore`, compiles pipelines to SurrealQL

pub mod memory;
pub mod store;
pub mod surreal;

pub use memory::InMemoryOrderStore;
pub use store::{OrderStore, StoreError, StoreResult};
pub use surreal::SurrealOrderStore;
