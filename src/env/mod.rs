pub mod interpolator;
pub mod resolver;
pub mod store;

pub use resolver::{Variables, substitute, substitute_str, unresolved_placeholders};
