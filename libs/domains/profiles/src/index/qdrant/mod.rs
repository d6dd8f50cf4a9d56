mod client;
mod config;

pub use client::QdrantIndex;
pub use config::QdrantConfig;
