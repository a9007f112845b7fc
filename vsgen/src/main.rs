use clap::Parser;
use vsgen_core::cli::conf::{self, ConfigCmd};
use vsgen_core::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "vsgen",
    version,
    about = "vsgen: VirtualServer configuration synthesizer"
)]
struct Cli {
    #[command(subcommand)]
    command: ConfigCmd,
}

fn main() {
    let cli = Cli::parse();

    init_logging();
    tracing::debug!(command = ?cli.command, "starting");

    if let Err(e) = conf::run(cli.command) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
