//! Collection, environment and request-execution core for a Postman-style
//! API client.
//!
//! [`app::App`] owns a [`state::tree::CollectionTree`] and an
//! [`env::store::EnvironmentStore`]; requests are resolved against the active
//! environment and sent either directly ([`http`]) or through a [`batch`] runner.

pub mod app;
pub mod batch;
pub mod config;
pub mod env;
pub mod error;
pub mod event;
pub mod http;
pub mod state;
pub mod storage;
pub mod telemetry;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use event::Event;
