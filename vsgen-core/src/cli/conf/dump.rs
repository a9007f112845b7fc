use crate::conf::load_bundle;
use crate::document::VirtualServerConfig;
use crate::synth::SynthesisWarning;
use serde::Serialize;
use std::path::PathBuf;

/// One synthesized VirtualServer as printed by `dump`.
#[derive(Debug, Serialize)]
pub struct DumpEntry {
    pub virtual_server: String,
    pub config: VirtualServerConfig,
    pub warnings: Vec<SynthesisWarning>,
}

pub fn dump(path: PathBuf, json: bool, yaml: bool) -> anyhow::Result<()> {
    let entries = dump_entries(&path)?;
    if yaml {
        dump_yaml(&entries)?;
    } else if json || !yaml {
        dump_json(&entries)?;
    }
    Ok(())
}

pub fn dump_entries(path: &std::path::Path) -> anyhow::Result<Vec<DumpEntry>> {
    let bundle = load_bundle(path)?;
    let synthesizer = bundle.synthesizer();

    Ok(bundle
        .inputs()
        .map(|input| {
            let (config, report) = synthesizer.synthesize(input);
            DumpEntry {
                virtual_server: input.virtual_server.metadata.key(),
                config,
                warnings: report.warnings,
            }
        })
        .collect())
}

fn dump_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

fn dump_yaml<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_yaml::to_string(value)?;
    println!("{s}");
    Ok(())
}
