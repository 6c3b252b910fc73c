pub mod assembly;
pub mod candidates;
pub mod metrics;
pub mod plan;
pub mod tokenizer;
