use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Upstream {
    pub name: String,
    pub labels: UpstreamLabels,
    pub servers: Vec<UpstreamServer>,
    pub backup_servers: Vec<UpstreamServer>,
    /// Servers are DNS names resolved at runtime.
    pub resolve: bool,
    pub lb_method: String,
    pub keepalive: u32,
    pub max_fails: u32,
    pub fail_timeout: String,
    pub max_conns: u32,
    pub upstream_zone_size: String,
    pub slow_start: String,
    pub queue: Option<Queue>,
    pub session_cookie: Option<SessionCookie>,
    pub ntlm: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpstreamLabels {
    pub service: String,
    pub resource_type: String,
    pub resource_name: String,
    pub resource_namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UpstreamServer {
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Queue {
    pub size: u32,
    pub timeout: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionCookie {
    pub enable: bool,
    pub name: String,
    pub path: String,
    pub expires: String,
    pub domain: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub uri: String,
    pub interval: String,
    pub jitter: String,
    pub keepalive_time: String,
    pub fails: u32,
    pub passes: u32,
    pub port: Option<u16>,
    pub proxy_pass: String,
    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub headers: BTreeMap<String, String>,
    pub r#match: String,
    pub grpc_pass: String,
    pub grpc_status: Option<u32>,
    pub grpc_service: String,
    pub is_grpc: bool,
    pub mandatory: bool,
    pub persistent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusMatch {
    pub name: String,
    pub code: String,
}
