pub mod bridge;
pub mod converter;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod parser;
