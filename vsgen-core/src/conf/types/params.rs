use serde::{Deserialize, Serialize};

/// Global defaults applied wherever a resource leaves a knob unset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigParams {
    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,
    pub proxy_buffering: bool,
    pub proxy_buffers: String,
    pub proxy_buffer_size: String,
    pub proxy_max_temp_file_size: String,

    pub lb_method: String,
    pub keepalive: u32,
    pub max_fails: u32,
    pub max_conns: u32,
    pub fail_timeout: String,
    pub upstream_zone_size: String,

    pub http2: bool,
    pub server_tokens: String,
    pub proxy_protocol: bool,
    pub set_real_ip_from: Vec<String>,
    pub real_ip_header: String,
    pub real_ip_recursive: bool,

    pub location_snippets: Vec<String>,
    pub server_snippets: Vec<String>,
    pub http_snippets: Vec<String>,

    /// Default destination for WAF security logs.
    pub log_output: String,

    /// Number of controller replicas sharing rate-limit state, used by `scale`.
    pub controller_replicas: u32,
}

impl Default for ConfigParams {
    fn default() -> Self {
        Self {
            proxy_connect_timeout: "60s".to_string(),
            proxy_read_timeout: "60s".to_string(),
            proxy_send_timeout: "60s".to_string(),
            client_max_body_size: "1m".to_string(),
            proxy_buffering: true,
            proxy_buffers: String::new(),
            proxy_buffer_size: String::new(),
            proxy_max_temp_file_size: "1024m".to_string(),
            lb_method: "random two least_conn".to_string(),
            keepalive: 0,
            max_fails: 1,
            max_conns: 0,
            fail_timeout: "10s".to_string(),
            upstream_zone_size: "256k".to_string(),
            http2: false,
            server_tokens: "on".to_string(),
            proxy_protocol: false,
            set_real_ip_from: Vec::new(),
            real_ip_header: String::new(),
            real_ip_recursive: false,
            location_snippets: Vec::new(),
            server_snippets: Vec::new(),
            http_snippets: Vec::new(),
            log_output: "syslog:server=localhost:514".to_string(),
            controller_replicas: 1,
        }
    }
}

/// Feature switches fixed for the lifetime of a synthesizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticParams {
    /// Premium data plane: health checks, slow start, queues, sticky sessions.
    pub plus: bool,
    pub resolver_enabled: bool,
    pub enable_snippets: bool,
    pub enable_internal_routes: bool,
    pub dynamic_weight_reload: bool,
    pub dynamic_ssl_reload: bool,
    pub static_ssl_path: String,
    pub wildcard_tls: bool,
    pub zone_sync: bool,
    pub spiffe_certs: bool,
    pub disable_ipv6: bool,
    pub tls_passthrough: bool,
    pub app_protect: bool,
    pub waf_bundle_path: String,
}

impl Default for StaticParams {
    fn default() -> Self {
        Self {
            plus: false,
            resolver_enabled: false,
            enable_snippets: false,
            enable_internal_routes: false,
            dynamic_weight_reload: false,
            dynamic_ssl_reload: false,
            static_ssl_path: "/etc/nginx/secrets".to_string(),
            wildcard_tls: false,
            zone_sync: false,
            spiffe_certs: false,
            disable_ipv6: false,
            tls_passthrough: false,
            app_protect: false,
            waf_bundle_path: "/etc/nginx/waf/bundles".to_string(),
        }
    }
}

/// Listen addresses resolved for the primary resource.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerPorts {
    pub http_port: u16,
    pub https_port: u16,
    pub http_ipv4: String,
    pub http_ipv6: String,
    pub https_ipv4: String,
    pub https_ipv6: String,
}

impl Default for ListenerPorts {
    fn default() -> Self {
        Self {
            http_port: 80,
            https_port: 443,
            http_ipv4: String::new(),
            http_ipv6: String::new(),
            https_ipv4: String::new(),
            https_ipv6: String::new(),
        }
    }
}
