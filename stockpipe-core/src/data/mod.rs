//! Market data extraction: providers, cleaning, and ticker validation.

pub mod alpaca;
pub mod assets;
pub mod circuit_breaker;
pub mod clean;
pub mod provider;
pub mod universe;

pub use alpaca::{AlpacaProvider, Credentials};
pub use assets::{validate_tickers, AlpacaAssets, AssetDirectory, TickerCheck};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use clean::{clean_bars, day_window, process_stock_data};
pub use provider::{BarRequest, DataError, MarketDataProvider, RawBar};
pub use universe::{Universe, DEFAULT_TICKERS};
