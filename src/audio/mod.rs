pub mod decoder;
pub mod engine;
pub mod types;
