pub mod admin;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod proxy;
pub mod server;
