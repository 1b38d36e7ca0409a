pub mod arbiter_api;
