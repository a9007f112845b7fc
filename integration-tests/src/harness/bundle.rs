use std::path::{Path, PathBuf};
use vsgen_core::conf::load_bundle;
use vsgen_core::document::VirtualServerConfig;
use vsgen_core::synth::SynthesisReport;

/// The result of synthesizing one VirtualServer of a bundle.
#[derive(Debug)]
pub struct Synthesized {
    pub virtual_server: String,
    pub config: VirtualServerConfig,
    pub report: SynthesisReport,
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Loads `fixtures/<name>` and synthesizes every VirtualServer in it.
pub fn synthesize_fixture(name: &str) -> Vec<Synthesized> {
    synthesize_path(&fixture_path(name))
}

pub fn synthesize_path(root: &Path) -> Vec<Synthesized> {
    let bundle = load_bundle(root)
        .unwrap_or_else(|e| panic!("failed to load bundle {}: {e}", root.display()));
    let synthesizer = bundle.synthesizer();

    bundle
        .inputs()
        .map(|input| {
            let (config, report) = synthesizer.synthesize(input);
            Synthesized {
                virtual_server: input.virtual_server.metadata.key(),
                config,
                report,
            }
        })
        .collect()
}
