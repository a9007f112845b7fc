use crate::conf::{ConfigError, load_bundle};
use crate::logging::{LogMode, default_log_mode};
use crate::synth::SynthesisReport;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn check(path: PathBuf, plain: bool, json: bool) -> anyhow::Result<()> {
    let bundle = match load_bundle(&path) {
        Ok(bundle) => bundle,
        Err(err) => {
            print_config_error(err, plain);
            std::process::exit(1);
        }
    };

    let synthesizer = bundle.synthesizer();
    let mut report = SynthesisReport::default();

    for input in bundle.inputs() {
        let (config, warnings) = synthesizer.synthesize(input);
        if !json {
            println!(
                "✔ {} ({}): {} upstreams, {} locations, {} warnings",
                input.virtual_server.metadata.key(),
                config.server.server_name,
                config.upstreams.len(),
                config.server.locations.len(),
                warnings.len(),
            );
        }
        report.warnings.extend(warnings.warnings);
    }

    tracing::info!(
        virtual_servers = bundle.virtual_servers.len(),
        warnings = report.len(),
        "bundle checked"
    );

    if json {
        println!("{}", report.render_json()?);
        return Ok(());
    }

    println!();
    let mode = if plain { LogMode::Plain } else { default_log_mode() };
    match mode {
        LogMode::Plain => report.render_plain(),
        LogMode::Pretty => report.render_pretty(),
    }
    Ok(())
}

fn print_config_error(err: ConfigError, plain: bool) {
    let hint = config_error_hint(&err);
    if plain {
        eprintln!("{}", err);
    } else {
        eprintln!();
        eprintln!("{}: {}", "error".red().bold(), err);
    }
    if let Some(hint) = hint {
        eprintln!();
        eprintln!("{}", hint);
    }
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::ReadFile { .. } => Some(
            "A bundle directory must contain a vsgen.hcl entrypoint.\n\
             \n\
             Run `vsgen init <dir>` to create an example bundle.",
        ),

        ConfigError::UnknownKind { .. } => Some(
            "Resource manifests may only contain VirtualServer, VirtualServerRoute\n\
             and Policy documents.",
        ),

        ConfigError::MissingVirtualServer { .. } => Some(
            "At least one VirtualServer is required.\n\
             \n\
             Example:\n\
             \n\
             kind: VirtualServer\n\
             metadata:\n\
             \x20 name: cafe\n\
             spec:\n\
             \x20 host: cafe.example.com",
        ),

        ConfigError::DuplicateResource { .. } => Some(
            "Every resource must have a unique namespace/name within its kind.",
        ),

        _ => None,
    }
}
