use crate::document::policy::{
    ApiKey, BasicAuth, EgressMtls, IngressMtls, JwtAuth, LimitReq, LimitReqOptions, Oidc, Waf,
};
use crate::document::routing::InternalRedirectLocation;
use crate::document::upstream::HealthCheck;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Server {
    pub server_name: String,
    pub status_zone: String,
    pub gunzip: bool,

    pub http_port: u16,
    pub https_port: u16,
    pub http_ipv4: String,
    pub http_ipv6: String,
    pub https_ipv4: String,
    pub https_ipv6: String,
    pub custom_listeners: bool,
    pub disable_ipv6: bool,
    pub proxy_protocol: bool,

    pub ssl: Option<Ssl>,
    pub tls_redirect: Option<TlsRedirect>,
    pub tls_passthrough: bool,

    pub server_tokens: String,
    pub set_real_ip_from: Vec<String>,
    pub real_ip_header: String,
    pub real_ip_recursive: bool,
    pub snippets: Vec<String>,

    pub internal_redirect_locations: Vec<InternalRedirectLocation>,
    pub locations: Vec<Location>,
    pub return_locations: Vec<ReturnLocation>,
    pub error_page_locations: Vec<ErrorPageLocation>,
    pub health_checks: Vec<HealthCheck>,

    // Server-level policies.
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub limit_req_options: LimitReqOptions,
    pub limit_reqs: Vec<LimitReq>,
    pub jwt_auth: Option<JwtAuth>,
    pub jwt_auth_list: BTreeMap<String, JwtAuth>,
    pub jwks_auth_enabled: bool,
    pub basic_auth: Option<BasicAuth>,
    pub ingress_mtls: Option<IngressMtls>,
    pub egress_mtls: Option<EgressMtls>,
    pub oidc: Option<Oidc>,
    pub api_key: Option<ApiKey>,
    pub api_key_enabled: bool,
    pub waf: Option<Waf>,
    pub policies_error_return: Option<Return>,

    pub vs_namespace: String,
    pub vs_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ssl {
    pub http2: bool,
    pub certificate: String,
    pub certificate_key: String,
    pub reject_handshake: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TlsRedirect {
    pub code: u16,
    pub based_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    pub internal: bool,
    pub snippets: Vec<String>,

    pub proxy_connect_timeout: String,
    pub proxy_read_timeout: String,
    pub proxy_send_timeout: String,
    pub client_max_body_size: String,
    pub proxy_max_temp_file_size: String,
    pub proxy_buffering: bool,
    pub proxy_buffers: String,
    pub proxy_buffer_size: String,
    pub proxy_pass: String,
    pub proxy_next_upstream: String,
    pub proxy_next_upstream_timeout: String,
    pub proxy_next_upstream_tries: u32,
    pub proxy_intercept_errors: bool,
    pub proxy_pass_request_headers: bool,
    pub proxy_set_headers: Vec<Header>,
    pub proxy_hide_headers: Vec<String>,
    pub proxy_pass_headers: Vec<String>,
    pub proxy_ignore_headers: String,
    pub add_headers: Vec<AddHeader>,
    pub proxy_pass_rewrite: String,
    pub rewrites: Vec<String>,
    pub has_keepalive: bool,
    pub error_pages: Vec<ErrorPage>,
    pub proxy_ssl_name: String,
    pub service_name: String,
    pub grpc_pass: String,
    /// Set only on redirect/return locations, which bounce through the 418 server.
    pub internal_proxy_pass: String,

    pub is_vsr: bool,
    pub vsr_name: String,
    pub vsr_namespace: String,

    // Location-level policies.
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub limit_req_options: LimitReqOptions,
    pub limit_reqs: Vec<LimitReq>,
    pub jwt_auth: Option<JwtAuth>,
    pub basic_auth: Option<BasicAuth>,
    pub egress_mtls: Option<EgressMtls>,
    pub oidc: bool,
    pub waf: Option<Waf>,
    pub api_key: Option<ApiKey>,
    pub policies_error_return: Option<Return>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorPage {
    pub name: String,
    pub codes: String,
    pub response_code: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorPageLocation {
    pub name: String,
    pub default_type: String,
    pub r#return: Return,
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReturnLocation {
    pub name: String,
    pub default_type: String,
    pub r#return: Return,
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Return {
    pub code: u16,
    pub text: String,
}

impl Return {
    /// The directive a policy context collapses to after a fatal error.
    pub fn internal_error() -> Self {
        Self {
            code: 500,
            text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddHeader {
    pub name: String,
    pub value: String,
    pub always: bool,
}
