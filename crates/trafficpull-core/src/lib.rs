pub mod accumulator;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod normalize;
pub mod period;
pub mod property;
pub mod report;
pub mod retry;
pub mod table;
