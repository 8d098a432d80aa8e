pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod output;
pub mod series;
pub mod session;
pub mod store;
pub mod tariff;
