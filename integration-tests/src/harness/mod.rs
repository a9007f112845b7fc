mod bundle;
pub mod tracing;

pub use bundle::{Synthesized, fixture_path, synthesize_fixture, synthesize_path};
pub use tracing::{CapturedEvent, init_test_tracing};
