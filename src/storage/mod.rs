//! Document stores
//!
//! The engine reads documents through the `DocumentStore` trait.
//! `VaultStore` reads a directory of markdown notes; `MemoryDocumentStore`
//! holds snapshots in memory.

mod frontmatter;
mod memory;
mod traits;
mod vault;

pub use memory::MemoryDocumentStore;
pub use traits::{DocumentStore, OpenStore, StoreError, StoreResult};
pub use vault::VaultStore;
