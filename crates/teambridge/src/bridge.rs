pub mod base;
pub mod client;
pub mod config;

#[cfg(test)]
pub mod mock;
