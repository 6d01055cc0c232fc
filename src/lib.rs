//! Mail Agent: turns inbound customer email into model-drafted replies.

pub mod agent;
pub mod config;
pub mod email;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod store;
pub mod tools;
pub mod transport;
