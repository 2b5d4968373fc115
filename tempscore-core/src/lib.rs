pub mod company;
pub mod config;
pub mod errors;
pub mod panel;
pub mod quantity;
pub mod scope;
pub mod timeseries;
pub mod units;
