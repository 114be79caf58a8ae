pub extern crate actix_web;

pub mod broadcast_hub;
pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod persistence;
pub mod registry;
pub mod server;
pub mod store;
