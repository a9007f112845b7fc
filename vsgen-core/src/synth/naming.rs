//! Deterministic names for the variables, zones and locations a pass emits.

use crate::conf::types::{Action, ObjectMeta};
use std::collections::BTreeMap;

/// Prefix for internal locations generated by splits and matches.
pub const INTERNAL_LOCATION_PREFIX: &str = "internal_location_";

/// Key into the endpoint snapshot for an upstream's service.
///
/// Subselector labels are rendered `k=v` joined with `,`, in key order.
pub fn endpoints_key(
    namespace: &str,
    service: &str,
    subselector: &BTreeMap<String, String>,
    port: u16,
) -> String {
    if subselector.is_empty() {
        return format!("{namespace}/{service}:{port}");
    }

    let selector = subselector
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{namespace}/{service}_{selector}:{port}")
}

/// Key into the external-name service set.
pub fn external_name_key(namespace: &str, service: &str) -> String {
    format!("{namespace}/{service}")
}

/// Names upstream blocks after the resource that declares them.
#[derive(Debug, Clone)]
pub struct UpstreamNamer {
    prefix: String,
    namespace: String,
}

impl UpstreamNamer {
    pub fn for_virtual_server(vs: &ObjectMeta) -> Self {
        Self {
            prefix: format!("vs_{}_{}", vs.namespace, vs.name),
            namespace: vs.namespace.clone(),
        }
    }

    pub fn for_virtual_server_route(vs: &ObjectMeta, vsr: &ObjectMeta) -> Self {
        Self {
            prefix: format!(
                "vs_{}_{}_vsr_{}_{}",
                vs.namespace, vs.name, vsr.namespace, vsr.name
            ),
            namespace: vsr.namespace.clone(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn upstream(&self, upstream: &str) -> String {
        format!("{}_{}", self.prefix, upstream)
    }

    pub fn upstream_for_action(&self, action: &Action) -> String {
        self.upstream(action.upstream())
    }
}

/// Names variables, maps and zones shared by the whole VirtualServer.
///
/// Hyphens in the namespace and name are replaced so the result is a valid
/// variable name.
#[derive(Debug, Clone)]
pub struct VariableNamer {
    safe_ns_name: String,
}

impl VariableNamer {
    pub fn new(vs: &ObjectMeta) -> Self {
        Self {
            safe_ns_name: format!("{}_{}", vs.namespace, vs.name).replace('-', "_"),
        }
    }

    pub fn keyval_zone(&self, index: usize) -> String {
        format!("vs_{}_keyval_zone_split_clients_{index}", self.safe_ns_name)
    }

    pub fn keyval_variable(&self, index: usize) -> String {
        format!("$vs_{}_keyval_split_clients_{index}", self.safe_ns_name)
    }

    pub fn keyval_key(&self, index: usize) -> String {
        format!("\"vs_{}_keyval_key_split_clients_{index}\"", self.safe_ns_name)
    }

    pub fn weights_map(&self, index: usize) -> String {
        format!("$vs_{}_map_split_clients_{index}", self.safe_ns_name)
    }

    /// Quoted key selecting the `i`/`j` weight pair in the weights map.
    pub fn weights_key(&self, index: usize, i: u32, j: u32) -> String {
        format!("\"vs_{}_split_clients_{index}_{i}_{j}\"", self.safe_ns_name)
    }

    pub fn weights_split_clients(&self, index: usize, i: u32, j: u32) -> String {
        format!("$vs_{}_split_clients_{index}_{i}_{j}", self.safe_ns_name)
    }

    pub fn split_clients(&self, index: usize) -> String {
        format!("$vs_{}_splits_{index}", self.safe_ns_name)
    }

    pub fn match_condition(&self, matches: usize, r#match: usize, condition: usize) -> String {
        format!(
            "$vs_{}_matches_{matches}_match_{}_cond_{condition}",
            self.safe_ns_name, r#match
        )
    }

    pub fn matches_main(&self, matches: usize) -> String {
        format!("$vs_{}_matches_{matches}", self.safe_ns_name)
    }

    /// Variable a JWT claim is extracted into for tiered rate limiting.
    pub fn jwt_claim(&self, claim: &str) -> String {
        format!("$jwt_{}_{}", self.safe_ns_name, claim.replace(['.', '-'], "_"))
    }
}

/// Location name for the `i`-th split of split set `index`.
pub fn split_location(index: usize, i: usize) -> String {
    format!("/{INTERNAL_LOCATION_PREFIX}splits_{index}_split_{i}")
}

/// Location name for match `i` of match set `index`.
pub fn match_location(index: usize, i: usize) -> String {
    format!("/{INTERNAL_LOCATION_PREFIX}matches_{index}_match_{i}")
}

/// Location taken when none of the matches in set `index` apply.
pub fn matches_default(index: usize) -> String {
    format!("/{INTERNAL_LOCATION_PREFIX}matches_{index}_default")
}

pub fn error_page_location(route_index: usize, i: usize) -> String {
    format!("@error_page_{route_index}_{i}")
}

pub fn return_location(index: usize) -> String {
    format!("@return_{index}")
}

pub fn status_match(upstream: &str) -> String {
    format!("{upstream}_match")
}

/// Converts a Kubernetes-style resource name into an identifier-safe form.
pub fn rfc1123_to_snake(name: &str) -> String {
    name.replace('-', "_")
}
