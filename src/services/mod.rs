pub mod engine;
pub mod quote;
