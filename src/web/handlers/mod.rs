//! HTTP request handlers, grouped by resource

pub mod catalog;
pub mod connections;
pub mod health;
pub mod proxy;
pub mod sync;
pub mod users;
