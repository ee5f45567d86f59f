//! I/O helpers: environment configuration and graph datasets.

pub mod config;
pub mod graph_store;
