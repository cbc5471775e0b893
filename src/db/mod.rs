pub mod client;
pub mod connection;
pub mod executor;
pub mod types;
