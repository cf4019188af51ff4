//! SeaORM entity definitions for the catalog cache tables

pub mod categories;
pub mod connections;
pub mod live_streams;
pub mod prelude;
pub mod series;
pub mod users;
pub mod vod_streams;
