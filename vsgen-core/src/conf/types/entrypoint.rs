use crate::conf::types::{ConfigParams, ListenerPorts, StaticParams};
use serde::Deserialize;

/// Represents the top-level `vsgen.hcl` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntrypointConfig {
    pub params: ConfigParams,
    pub features: StaticParams,
    pub listener: ListenerPorts,
    pub include: IncludeConfig,
}

/// Glob patterns, relative to the bundle directory, for the files the
/// entrypoint pulls in.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IncludeConfig {
    /// VirtualServer, VirtualServerRoute and Policy manifests.
    pub resources: String,
    pub secrets: String,
    pub endpoints: String,
    pub waf: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            resources: "resources/*.yaml".to_string(),
            secrets: "secrets/*.yaml".to_string(),
            endpoints: "endpoints/*.yaml".to_string(),
            waf: "waf/*.yaml".to_string(),
        }
    }
}
