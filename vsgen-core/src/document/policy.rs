use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LimitReqZone {
    pub zone_name: String,
    pub key: String,
    pub zone_size: String,
    pub rate: String,
    pub sync: bool,

    // Tiered rate limiting only.
    pub group_value: String,
    pub policy_value: String,
    pub group_variable: String,
    pub policy_result: String,
    pub group_default: bool,
    pub group_source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LimitReq {
    pub zone_name: String,
    pub burst: u32,
    pub no_delay: bool,
    pub delay: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitReqOptions {
    pub dry_run: bool,
    pub log_level: String,
    pub reject_code: u16,
}

impl Default for LimitReqOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            log_level: "error".to_string(),
            reject_code: 503,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthJwtClaimSet {
    pub variable: String,
    pub claim: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JwtAuth {
    pub key: String,
    pub secret: String,
    pub realm: String,
    pub token: String,
    pub jwks_uri: Option<JwksUri>,
    pub key_cache: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JwksUri {
    pub scheme: String,
    pub host: String,
    pub port: String,
    pub path: String,
    pub sni_name: String,
    pub sni_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BasicAuth {
    pub secret: String,
    pub realm: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngressMtls {
    pub client_cert: String,
    pub client_crl: String,
    pub verify_client: String,
    pub verify_depth: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EgressMtls {
    pub certificate: String,
    pub certificate_key: String,
    pub verify_server: bool,
    pub verify_depth: u32,
    pub ciphers: String,
    pub protocols: String,
    pub trusted_cert: String,
    pub session_reuse: bool,
    pub server_name: bool,
    pub ssl_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Oidc {
    pub auth_endpoint: String,
    pub auth_extra_args: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub end_session_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub zone_sync_leeway: u32,
    pub access_token_enable: bool,
    pub pkce_enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiKey {
    pub header: Vec<String>,
    pub query: Vec<String>,
    pub map_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Waf {
    pub enable: String,
    pub ap_policy: String,
    pub ap_bundle: String,
    pub ap_security_log_enable: bool,
    pub ap_log_conf: Vec<String>,
}
