//! Database repositories for data access layer
//!
//! Each repository owns one table and offers pool-level reads plus `_tx`
//! variants that run inside a caller-owned transaction.

pub mod file;
pub mod media;
pub mod transaction;

pub use file::FileRepository;
pub use media::MediaRepository;
