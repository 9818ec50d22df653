//! The three backend adapters, in cascade order.

mod bulk;
mod index;
mod store_api;

pub use bulk::BulkExportBackend;
pub use index::IndexSearchBackend;
pub use store_api::StoreApiBackend;
