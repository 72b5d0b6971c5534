pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod http_cache;
pub mod http_client;
pub mod payload;
pub mod pipeline;
pub mod players;
pub mod schedule;
pub mod state;
pub mod teams;
pub mod trend;
