use crate::conf::error::ConfigError;
use crate::conf::types::{EntrypointConfig, Policy, VirtualServer, VirtualServerRoute};
use crate::synth::lookup::{EndpointSet, SecretStore, WafResources};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// One document of a resource manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    VirtualServer(VirtualServer),
    VirtualServerRoute(VirtualServerRoute),
    Policy(Policy),
}

#[derive(Deserialize)]
struct KindHeader {
    #[serde(default)]
    kind: String,
}

pub fn parse_entrypoint(path: &Path) -> Result<EntrypointConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    hcl::from_str(&s).map_err(|e| ConfigError::hcl(path, e))
}

/// Parses a multi-document manifest, dispatching each document on its `kind`.
///
/// Empty documents are skipped.
pub fn parse_resources(path: &Path) -> Result<Vec<Resource>, ConfigError> {
    let s = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    let mut resources = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&s) {
        let value =
            serde_yaml::Value::deserialize(document).map_err(|e| ConfigError::yaml(path, e))?;
        if value.is_null() {
            continue;
        }

        let header: KindHeader =
            serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::yaml(path, e))?;
        let resource = match header.kind.as_str() {
            "VirtualServer" => Resource::VirtualServer(from_value(path, value)?),
            "VirtualServerRoute" => Resource::VirtualServerRoute(from_value(path, value)?),
            "Policy" => Resource::Policy(from_value(path, value)?),
            _ => {
                return Err(ConfigError::UnknownKind {
                    path: path.to_path_buf(),
                    kind: header.kind,
                });
            }
        };
        resources.push(resource);
    }

    Ok(resources)
}

pub fn parse_secrets(path: &Path) -> Result<SecretStore, ConfigError> {
    parse_yaml(path)
}

pub fn parse_endpoints(path: &Path) -> Result<EndpointSet, ConfigError> {
    parse_yaml(path)
}

pub fn parse_waf(path: &Path) -> Result<WafResources, ConfigError> {
    parse_yaml(path)
}

fn parse_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let s = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    if s.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&s).map_err(|e| ConfigError::yaml(path, e))
}

fn from_value<T: DeserializeOwned>(path: &Path, value: serde_yaml::Value) -> Result<T, ConfigError> {
    serde_yaml::from_value(value).map_err(|e| ConfigError::yaml(path, e))
}
