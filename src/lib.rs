//! Triathlon race listing aggregation: scrape, normalize, cache and serve.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
