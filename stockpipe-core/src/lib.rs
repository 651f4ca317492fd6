//! stockpipe core: environment bootstrap, market data extraction, table store,
//! analysis and AI summaries for the stock-data ETL pipeline.
//!
//! This crate contains everything the `stockpipe` binary drives:
//! - Bootstrap plan (runtime env, dependencies, directories, `.env`, db init)
//! - Configuration and `.env` handling
//! - Market data providers (Alpaca bars, asset directory) with a circuit breaker
//! - Embedded Parquet-backed table store with the pipeline schema
//! - ETL loading, per-symbol aggregate analysis, and the summary agent

pub mod agent;
pub mod analysis;
pub mod bootstrap;
pub mod config;
pub mod data;
pub mod domain;
pub mod env_file;
pub mod logging;
pub mod pipeline;
pub mod store;
