pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod http;
