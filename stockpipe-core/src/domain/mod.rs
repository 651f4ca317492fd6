//! Domain types shared by the data, store and analysis layers.

pub mod bar;
pub mod timeframe;

pub use bar::{format_timestamp, parse_timestamp, Bar};
pub use timeframe::Timeframe;
