use serde::Serialize;

/// A `map $source $variable { ... }` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Map {
    pub source: String,
    pub variable: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub value: String,
    pub result: String,
}

impl Parameter {
    pub fn new(value: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            result: result.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitClient {
    pub source: String,
    pub variable: String,
    pub distributions: Vec<Distribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub weight: String,
    pub value: String,
}

/// Persistent key-value zone backing a runtime-switchable two-way split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyValZone {
    pub name: String,
    pub size: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyVal {
    pub key: String,
    pub variable: String,
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TwoWaySplitClients {
    pub key: String,
    pub variable: String,
    pub zone_name: String,
    pub weights: [u32; 2],
    pub split_clients_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InternalRedirectLocation {
    pub path: String,
    pub destination: String,
}
