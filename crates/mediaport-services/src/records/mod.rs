//! Record repositories over a [`mediaport_db::UnitOfWork`].

mod files;
mod media;

pub use files::FileRecords;
pub use media::MediaRecords;
