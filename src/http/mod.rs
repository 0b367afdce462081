pub mod auth;
pub mod builder;
pub mod client;
pub mod curl;
pub mod executor;

pub use builder::build;
pub use client::build_client;
pub use curl::to_curl;
pub use executor::{execute, run};
