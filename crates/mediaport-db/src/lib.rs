//! Mediaport Database Layer
//!
//! Postgres repositories for File and Media records, and the unit-of-work
//! abstraction the ingestion pipeline runs inside.

pub mod db;
pub mod unit_of_work;

#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;

// Re-exports: repositories
pub use db::{FileRepository, MediaRepository};

// Re-exports: transaction utilities
pub use db::transaction::{PgDatabase, PgUnitOfWork};
pub use unit_of_work::{complete, Database, UnitOfWork};

#[cfg(any(test, feature = "test-helpers"))]
pub use memory::InMemoryDatabase;
