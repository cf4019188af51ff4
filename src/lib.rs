pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod models;
pub mod proxy;
pub mod sync;
pub mod upstream;
pub mod utils;
pub mod web;
