use crate::conf::types::Header;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An upstream as declared on a VirtualServer or VirtualServerRoute.
///
/// Unset tuning knobs fall back to the global `ConfigParams` during synthesis.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    pub name: String,
    pub service: String,
    #[serde(default)]
    pub subselector: BTreeMap<String, String>,
    pub port: u16,

    #[serde(default)]
    pub backup: String,
    pub backup_port: Option<u16>,

    #[serde(default)]
    pub lb_method: String,
    #[serde(default)]
    pub fail_timeout: String,
    pub max_fails: Option<u32>,
    pub max_conns: Option<u32>,
    pub keepalive: Option<u32>,

    #[serde(default)]
    pub connect_timeout: String,
    #[serde(default)]
    pub read_timeout: String,
    #[serde(default)]
    pub send_timeout: String,
    #[serde(default)]
    pub next_upstream: String,
    #[serde(default)]
    pub next_upstream_timeout: String,
    #[serde(default)]
    pub next_upstream_tries: u32,

    pub buffering: Option<bool>,
    pub buffers: Option<UpstreamBuffers>,
    #[serde(default)]
    pub buffer_size: String,
    #[serde(default)]
    pub client_max_body_size: String,

    #[serde(default)]
    pub tls: UpstreamTls,

    pub health_check: Option<HealthCheck>,

    #[serde(default)]
    pub slow_start: String,
    pub queue: Option<UpstreamQueue>,
    pub session_cookie: Option<SessionCookie>,
    #[serde(default)]
    pub ntlm: bool,

    /// `http` (default) or `grpc`.
    #[serde(default, rename = "type")]
    pub protocol: String,
}

impl Upstream {
    pub fn is_grpc(&self) -> bool {
        self.protocol == "grpc"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpstreamTls {
    #[serde(default)]
    pub enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpstreamBuffers {
    pub number: u32,
    pub size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpstreamQueue {
    pub size: u32,
    #[serde(default)]
    pub timeout: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub expires: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub jitter: String,
    #[serde(default)]
    pub keepalive_time: String,
    #[serde(default)]
    pub fails: u32,
    #[serde(default)]
    pub passes: u32,
    pub port: Option<u16>,
    #[serde(default)]
    pub connect_timeout: String,
    #[serde(default)]
    pub read_timeout: String,
    #[serde(default)]
    pub send_timeout: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub tls: Option<UpstreamTls>,
    #[serde(default)]
    pub status_match: String,
    pub grpc_status: Option<u32>,
    #[serde(default)]
    pub grpc_service: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub persistent: bool,
}
