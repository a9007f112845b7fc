mod discover;
mod error;
mod loader;
mod parse;
#[cfg(test)]
mod tests;
pub mod types;

pub use error::ConfigError;
pub use loader::{Bundle, BundleEntry, ENTRYPOINT_FILE, load_bundle};
pub use parse::Resource;
