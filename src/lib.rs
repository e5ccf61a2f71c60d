pub mod config;
pub mod constants;
pub mod error;
pub mod hash_ids;
pub mod logging;
pub mod metrics;
pub mod offers;
pub mod parser;
pub mod pipeline;
pub mod scrapers;
pub mod server;
pub mod storage;
pub mod types;

pub mod gateway;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;
