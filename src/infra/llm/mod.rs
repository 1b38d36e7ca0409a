mod client;

pub use client::LlmArbiter;
