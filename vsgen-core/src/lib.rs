pub mod cli;
pub mod conf;
pub mod document;
pub mod logging;
pub mod synth;
