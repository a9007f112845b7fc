use crate::conf::types::ObjectMeta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Policy {
    pub metadata: ObjectMeta,
    pub spec: PolicyKind,
}

impl Policy {
    pub fn key(&self) -> String {
        self.metadata.key()
    }
}

/// Exactly one kind per policy object.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum PolicyKind {
    #[serde(rename = "accessControl")]
    AccessControl(AccessControl),
    #[serde(rename = "rateLimit")]
    RateLimit(RateLimit),
    #[serde(rename = "jwt")]
    JwtAuth(JwtAuth),
    #[serde(rename = "basicAuth")]
    BasicAuth(BasicAuth),
    #[serde(rename = "ingressMTLS")]
    IngressMtls(IngressMtls),
    #[serde(rename = "egressMTLS")]
    EgressMtls(EgressMtls),
    #[serde(rename = "oidc")]
    Oidc(Oidc),
    #[serde(rename = "apiKey")]
    ApiKey(ApiKey),
    #[serde(rename = "waf")]
    Waf(Waf),
}

impl PolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::AccessControl(_) => "accessControl",
            PolicyKind::RateLimit(_) => "rateLimit",
            PolicyKind::JwtAuth(_) => "jwt",
            PolicyKind::BasicAuth(_) => "basicAuth",
            PolicyKind::IngressMtls(_) => "ingressMTLS",
            PolicyKind::EgressMtls(_) => "egressMTLS",
            PolicyKind::Oidc(_) => "oidc",
            PolicyKind::ApiKey(_) => "apiKey",
            PolicyKind::Waf(_) => "waf",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AccessControl {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub rate: String,
    pub key: String,
    pub delay: Option<u32>,
    pub no_delay: Option<bool>,
    pub burst: Option<u32>,
    #[serde(default)]
    pub zone_size: String,
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub log_level: String,
    pub reject_code: Option<u16>,
    #[serde(default)]
    pub scale: bool,
    pub condition: Option<RateLimitCondition>,
}

/// Tiered rate limiting: the zone only applies when the JWT claim or variable matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RateLimitCondition {
    pub jwt: Option<JwtCondition>,
    #[serde(default)]
    pub variables: Vec<VariableCondition>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct JwtCondition {
    #[serde(default)]
    pub claim: String,
    #[serde(default, rename = "match")]
    pub matches: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VariableCondition {
    pub name: String,
    #[serde(default, rename = "match")]
    pub matches: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtAuth {
    #[serde(default)]
    pub realm: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub token: String,
    #[serde(default, rename = "jwksURI")]
    pub jwks_uri: String,
    #[serde(default)]
    pub key_cache: String,
    #[serde(default)]
    pub sni_enabled: bool,
    #[serde(default)]
    pub sni_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BasicAuth {
    #[serde(default)]
    pub realm: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressMtls {
    pub client_cert_secret: String,
    #[serde(default)]
    pub crl_file_name: String,
    #[serde(default)]
    pub verify_client: String,
    pub verify_depth: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressMtls {
    #[serde(default)]
    pub tls_secret: String,
    #[serde(default)]
    pub verify_server: bool,
    pub verify_depth: Option<u32>,
    #[serde(default)]
    pub protocols: String,
    pub session_reuse: Option<bool>,
    #[serde(default)]
    pub ciphers: String,
    #[serde(default)]
    pub trusted_cert_secret: String,
    #[serde(default)]
    pub server_name: bool,
    #[serde(default)]
    pub ssl_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Oidc {
    pub auth_endpoint: String,
    pub token_endpoint: String,
    #[serde(rename = "jwksURI")]
    pub jwks_uri: String,
    #[serde(default)]
    pub end_session_endpoint: String,
    #[serde(default, rename = "postLogoutRedirectURI")]
    pub post_logout_redirect_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, rename = "redirectURI")]
    pub redirect_uri: String,
    pub zone_sync_leeway: Option<u32>,
    #[serde(default)]
    pub auth_extra_args: Vec<String>,
    #[serde(default)]
    pub access_token_enable: bool,
    #[serde(default, rename = "pkceEnable")]
    pub pkce_enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(default)]
    pub supplied_in: SuppliedIn,
    pub client_secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SuppliedIn {
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub query: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Waf {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub ap_policy: String,
    #[serde(default)]
    pub ap_bundle: String,
    /// Deprecated single-destination form of `security_logs`.
    pub security_log: Option<SecurityLog>,
    pub security_logs: Option<Vec<SecurityLog>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityLog {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub ap_log_conf: String,
    #[serde(default)]
    pub ap_log_bundle: String,
    #[serde(default)]
    pub log_dest: String,
}
