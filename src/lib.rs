pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod locations;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod providers;
pub mod visualize;
