//! The in-memory transactional store.

mod context;
mod memory;

pub use context::{OperationKind, PendingOperation, Session, TransactionContext, VersionCheck};
pub use memory::MemoryDatabase;
