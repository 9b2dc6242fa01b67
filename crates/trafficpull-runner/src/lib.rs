pub mod client;
pub mod credentials;
pub mod error;
pub mod export;
