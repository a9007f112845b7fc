use thiserror::Error;

/// A policy problem that makes the whole context unsafe to serve.
///
/// The context collapses to `return 500` and the message is attached to the
/// owning resource.
#[derive(Debug, Error)]
pub enum PolicyError {
    //--------------------------------------------------------------------------
    // References
    //--------------------------------------------------------------------------
    #[error("Policy {key} is missing or invalid")]
    Missing { key: String },

    //--------------------------------------------------------------------------
    // Secrets
    //--------------------------------------------------------------------------
    #[error("{kind} policy {policy} references a secret {secret} of a wrong type '{actual}', must be '{expected}'")]
    SecretWrongType {
        kind: &'static str,
        policy: String,
        secret: String,
        actual: String,
        expected: &'static str,
    },

    #[error("{kind} policy {policy} references an invalid secret {secret}: {reason}")]
    SecretInvalid {
        kind: &'static str,
        policy: String,
        secret: String,
        reason: String,
    },

    //--------------------------------------------------------------------------
    // JWT
    //--------------------------------------------------------------------------
    #[error("JWT policy {policy} must set exactly one of secret or jwksURI")]
    JwtSourceAmbiguous { policy: String },

    #[error("JWT policy {policy} references an invalid JWKS URI {uri}: {source}")]
    JwtInvalidJwksUri {
        policy: String,
        uri: String,
        #[source]
        source: url::ParseError,
    },

    //--------------------------------------------------------------------------
    // Ingress mTLS
    //--------------------------------------------------------------------------
    #[error("TLS must be enabled in VirtualServer for IngressMTLS policy {policy}")]
    IngressMtlsRequiresTls { policy: String },

    #[error("IngressMTLS policy {policy} is not allowed in the {context} context")]
    IngressMtlsContext { policy: String, context: String },

    //--------------------------------------------------------------------------
    // OIDC
    //--------------------------------------------------------------------------
    #[error("Only one oidc policy is allowed in a VirtualServer and its VirtualServerRoutes. Can't use {policy}. Use {existing}")]
    OidcConflict { policy: String, existing: String },

    #[error("OIDC policy {policy} has a secret and PKCE enabled. Secrets can't be used with PKCE")]
    OidcSecretWithPkce { policy: String },

    #[error("Client secret is required for OIDC policy {policy} when not using PKCE")]
    OidcSecretRequired { policy: String },

    //--------------------------------------------------------------------------
    // API key
    //--------------------------------------------------------------------------
    #[error("Multiple API Key policies in the same context is not valid. API Key policy {policy} will be ignored")]
    DuplicateApiKey { policy: String },

    //--------------------------------------------------------------------------
    // WAF
    //--------------------------------------------------------------------------
    #[error("WAF policy {policy} references an invalid or non-existing App Protect policy {ap_policy}")]
    WafPolicyMissing { policy: String, ap_policy: String },

    #[error("WAF policy {policy} references an invalid or non-existing App Protect bundle {bundle}")]
    WafBundleMissing { policy: String, bundle: String },

    #[error("WAF policy {policy} references an invalid or non-existing log config {log_conf}")]
    WafLogConfMissing { policy: String, log_conf: String },

    #[error("WAF policy {policy} references an invalid or non-existing log config bundle {bundle}")]
    WafLogBundleMissing { policy: String, bundle: String },

    //--------------------------------------------------------------------------
    // Tiered rate limiting
    //--------------------------------------------------------------------------
    #[error("Tiered rate-limit Policies on [{namespace}/{name}] contain conflicting default values")]
    ConflictingGroupDefaults { namespace: String, name: String },
}

/// A policy problem with a sensible fallback; synthesis carries on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyWarning {
    #[error("AccessControl policy (or policies) with deny rules is overridden by policy (or policies) with allow rules")]
    AccessControlOverridden,

    #[error("RateLimit policy {policy} with limit request option {option}='{value}' is overridden to {option}='{first}' by the first policy reference in this context")]
    RateLimitOptionOverridden {
        policy: String,
        option: &'static str,
        value: String,
        first: String,
    },

    #[error("Multiple basic auth policies in the same context is not valid. Basic auth policy {policy} will be ignored")]
    DuplicateBasicAuth { policy: String },

    #[error("Multiple jwt policies in the same context is not valid. JWT policy {policy} will be ignored")]
    DuplicateJwt { policy: String },

    #[error("Multiple ingressMTLS policies are not allowed. IngressMTLS policy {policy} will be ignored")]
    DuplicateIngressMtls { policy: String },

    #[error("Both ca.crl in the Secret and ingressMTLS.crlFileName fields cannot be used. crlFileName in {policy} will be ignored and ca.crl in {secret} will be applied")]
    IngressMtlsCrlConflict { policy: String, secret: String },

    #[error("Multiple egressMTLS policies in the same context is not valid. EgressMTLS policy {policy} will be ignored")]
    DuplicateEgressMtls { policy: String },

    #[error("Multiple oidc policies in the same context is not valid. OIDC policy {policy} will be ignored")]
    DuplicateOidc { policy: String },

    #[error("Multiple WAF policies in the same context is not valid. WAF policy {policy} will be ignored")]
    DuplicateWaf { policy: String },
}

impl PolicyError {
    pub(crate) fn wrong_type(
        kind: &'static str,
        policy: &str,
        secret: &str,
        actual: &str,
        expected: &'static str,
    ) -> Self {
        Self::SecretWrongType {
            kind,
            policy: policy.to_string(),
            secret: secret.to_string(),
            actual: actual.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid_secret(kind: &'static str, policy: &str, secret: &str, reason: &str) -> Self {
        Self::SecretInvalid {
            kind,
            policy: policy.to_string(),
            secret: secret.to_string(),
            reason: reason.to_string(),
        }
    }
}
