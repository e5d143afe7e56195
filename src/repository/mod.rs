//! Repository layer: transactional access to books, members and borrowings
//!
//! Every mutation runs inside a [`Transaction`] obtained from a [`Store`]. A transaction that is
//! dropped without [`Transaction::commit`] leaves no trace. Reports are aggregated by the store
//! itself through [`ReportStore`]. Two backends are provided:
//! [`PgStore`] over PostgreSQL and [`MemoryStore`] in-process.

pub mod books;
pub mod borrowings;
pub mod members;
pub mod memory;
pub mod postgres;
pub mod reports;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Book, Borrowing, Member},
};

pub use books::BookStore;
pub use borrowings::BorrowingStore;
pub use members::MemberStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use reports::ReportStore;

/// Row locking requested when reading a record inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    /// Plain read
    Plain,
    /// Hold the row until commit (`SELECT ... FOR UPDATE`)
    ForUpdate,
}

/// Ordering of borrowing listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorrowingOrder {
    /// Most recent issue first
    #[default]
    Newest,
    /// Earliest due date first
    DueFirst,
}

/// One atomic unit of work across all three collections
#[async_trait]
pub trait Transaction: BookStore + MemberStore + BorrowingStore {
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Consistent read-only copy of the whole library, for audits and exports
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub books: Vec<Book>,
    pub members: Vec<Member>,
    pub borrowings: Vec<Borrowing>,
}

/// Persistence boundary injected into services
#[async_trait]
pub trait Store: ReportStore + Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn Transaction>>;

    async fn snapshot(&self) -> AppResult<Snapshot>;

    /// Cheap connectivity check for readiness checks
    async fn ping(&self) -> AppResult<()>;
}
