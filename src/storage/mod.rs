//! Declaration storage.
//!
//! The store trait is the key registry accessor; `memory` provides the
//! in-memory reference backend.

mod memory;
mod traits;

pub use memory::InMemoryDeclarationStore;
pub use traits::{DeclarationStore, StorageError};
