//! SeaORM repository layer
//!
//! Each repository wraps the shared connection handle and exposes the typed
//! operations the rest of the application needs. Bulk operations are
//! atomic-per-call but deliberately not transactional across calls; the sync
//! engine's replace contract is built on that.

pub mod catalog;
pub mod connection;
pub mod user;

pub use catalog::{CatalogCounts, CatalogRepository};
pub use connection::ConnectionRepository;
pub use user::UserRepository;
