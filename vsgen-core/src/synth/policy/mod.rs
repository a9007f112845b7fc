//! Policy resolution for a single context (spec, route or subroute).
//!
//! References are resolved in order. The first fatal problem discards
//! everything resolved so far and the context renders as `return 500`.

mod access_control;
mod auth;
mod error;
mod oidc;
mod rate_limit;
mod tls;
mod waf;

#[cfg(test)]
mod tests;

pub use auth::{ApiKeyClient, api_key_client_map};
pub use error::{PolicyError, PolicyWarning};
pub use rate_limit::scale_rate;

use crate::conf::types::{ObjectMeta, PolicyKind, PolicyReference, ResourceRef};
use crate::document::{
    ApiKey, AuthJwtClaimSet, BasicAuth, EgressMtls, IngressMtls, JwtAuth, LimitReq,
    LimitReqOptions, LimitReqZone, Location, Map, Oidc, Return, Waf,
};
use crate::synth::lookup::{
    BundleValidator, PolicyCatalog, SecretLookup, SecretReference, WafResources,
};
use crate::synth::report::SynthesisReport;
use std::fmt;

/// Outcome of a single `add_*` step: warnings on success, every fatal problem otherwise.
pub(crate) type Checked = Result<Vec<PolicyWarning>, Vec<PolicyError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyContext {
    Spec,
    Route,
    Subroute,
}

impl fmt::Display for PolicyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyContext::Spec => write!(f, "spec"),
            PolicyContext::Route => write!(f, "route"),
            PolicyContext::Subroute => write!(f, "subroute"),
        }
    }
}

/// The resource whose references are being resolved, and the VirtualServer it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct PolicyOwner<'a> {
    pub resource: &'a ResourceRef,
    pub vs: &'a ObjectMeta,
}

impl PolicyOwner<'_> {
    pub fn namespace(&self) -> &str {
        &self.resource.namespace
    }

    pub fn name(&self) -> &str {
        &self.resource.name
    }
}

/// Read-only inputs shared by every context in a pass.
#[derive(Clone, Copy)]
pub struct PolicyOptions<'a> {
    /// TLS termination is configured on the VirtualServer.
    pub tls: bool,
    pub zone_sync: bool,
    pub replicas: u32,
    pub secrets: &'a dyn SecretLookup,
    pub waf: &'a WafResources,
    pub bundles: &'a dyn BundleValidator,
    pub log_output: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub reqs: Vec<LimitReq>,
    pub zones: Vec<LimitReqZone>,
    pub group_maps: Vec<Map>,
    pub policy_group_maps: Vec<Map>,
    pub options: LimitReqOptions,
    pub claim_sets: Vec<AuthJwtClaimSet>,
}

/// Everything one context resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub jwt_auth: Option<JwtAuth>,
    pub jwks_enabled: bool,
    pub basic_auth: Option<BasicAuth>,
    pub ingress_mtls: Option<IngressMtls>,
    pub egress_mtls: Option<EgressMtls>,
    pub oidc: bool,
    pub api_key: Option<ApiKey>,
    pub api_key_clients: Vec<ApiKeyClient>,
    pub waf: Option<Waf>,
}

/// The single OIDC policy bound to a VirtualServer and its routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcBinding {
    pub key: String,
    pub oidc: Oidc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    Resolved(Box<PolicyConfig>),
    Fatal(Return),
}

impl Default for PolicyOutcome {
    fn default() -> Self {
        PolicyOutcome::Resolved(Box::default())
    }
}

impl PolicyOutcome {
    pub fn config(&self) -> Option<&PolicyConfig> {
        match self {
            PolicyOutcome::Resolved(cfg) => Some(cfg),
            PolicyOutcome::Fatal(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, PolicyOutcome::Fatal(_))
    }

    pub fn error_return(&self) -> Option<Return> {
        match self {
            PolicyOutcome::Fatal(ret) => Some(ret.clone()),
            PolicyOutcome::Resolved(_) => None,
        }
    }

    /// Copies the location-level directives onto a generated location.
    pub fn apply_to(&self, location: &mut Location) {
        location.policies_error_return = self.error_return();
        let Some(cfg) = self.config() else {
            return;
        };

        location.allow = cfg.allow.clone();
        location.deny = cfg.deny.clone();
        location.limit_req_options = cfg.rate_limit.options.clone();
        location.limit_reqs = cfg.rate_limit.reqs.clone();
        location.jwt_auth = cfg.jwt_auth.clone();
        location.basic_auth = cfg.basic_auth.clone();
        location.egress_mtls = cfg.egress_mtls.clone();
        location.oidc = cfg.oidc;
        location.waf = cfg.waf.clone();
        location.api_key = cfg.api_key.clone();
    }
}

pub struct PolicyResolver<'a> {
    catalog: &'a PolicyCatalog,
    options: PolicyOptions<'a>,
}

impl<'a> PolicyResolver<'a> {
    pub fn new(catalog: &'a PolicyCatalog, options: PolicyOptions<'a>) -> Self {
        Self { catalog, options }
    }

    pub fn resolve(
        &self,
        owner: PolicyOwner<'_>,
        refs: &[PolicyReference],
        context: PolicyContext,
        path: &str,
        oidc: &mut Option<OidcBinding>,
        report: &mut SynthesisReport,
    ) -> PolicyOutcome {
        let mut cfg = PolicyConfig::default();

        for reference in refs {
            let key = reference.key(owner.namespace());
            let Some(policy) = self.catalog.get(&key) else {
                report.warn(owner.resource, PolicyError::Missing { key });
                return PolicyOutcome::Fatal(Return::internal_error());
            };

            let namespace = &policy.metadata.namespace;
            let checked = match &policy.spec {
                PolicyKind::AccessControl(ac) => cfg.add_access_control(ac),
                PolicyKind::RateLimit(rl) => {
                    cfg.add_rate_limit(rl, &policy.metadata, owner, &self.options, context, path)
                }
                PolicyKind::JwtAuth(jwt) => cfg.add_jwt_auth(jwt, &key, namespace, &self.options),
                PolicyKind::BasicAuth(basic) => {
                    cfg.add_basic_auth(basic, &key, namespace, &self.options)
                }
                PolicyKind::IngressMtls(mtls) => {
                    cfg.add_ingress_mtls(mtls, &key, namespace, context, &self.options)
                }
                PolicyKind::EgressMtls(mtls) => {
                    cfg.add_egress_mtls(mtls, &key, namespace, &self.options)
                }
                PolicyKind::Oidc(spec) => cfg.add_oidc(spec, &key, namespace, oidc, &self.options),
                PolicyKind::ApiKey(api_key) => {
                    cfg.add_api_key(api_key, &key, namespace, owner.vs, &self.options)
                }
                PolicyKind::Waf(waf) => cfg.add_waf(waf, &key, namespace, &self.options),
            };

            match checked {
                Ok(warnings) => {
                    for warning in warnings {
                        report.warn(owner.resource, warning);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        report.warn(owner.resource, error);
                    }
                    return PolicyOutcome::Fatal(Return::internal_error());
                }
            }
        }

        if !cfg.rate_limit.policy_group_maps.is_empty() {
            match rate_limit::group_maps(&cfg.rate_limit.zones) {
                Ok(maps) => cfg.rate_limit.group_maps = maps,
                Err(()) => {
                    report.warn(
                        owner.resource,
                        PolicyError::ConflictingGroupDefaults {
                            namespace: owner.namespace().to_string(),
                            name: owner.name().to_string(),
                        },
                    );
                    return PolicyOutcome::Fatal(Return::internal_error());
                }
            }
        }

        tracing::debug!(
            owner = %owner.resource,
            %context,
            path,
            references = refs.len(),
            "resolved policies"
        );

        PolicyOutcome::Resolved(Box::new(cfg))
    }
}

/// Why a referenced secret cannot be used.
pub(crate) enum SecretProblem {
    Missing,
    WrongType(String),
    Invalid(String),
}

/// Looks up `namespace/name` and checks its declared type.
///
/// A secret with an empty type only fails when the store recorded an error.
pub(crate) fn checked_secret<'s>(
    secrets: &'s dyn SecretLookup,
    key: &str,
    expected: &str,
) -> Result<&'s SecretReference, SecretProblem> {
    let Some(secret) = secrets.secret(key) else {
        return Err(SecretProblem::Missing);
    };

    if !secret.secret_type.is_empty() && secret.secret_type != expected {
        return Err(SecretProblem::WrongType(secret.secret_type.clone()));
    }

    if let Some(reason) = &secret.error {
        return Err(SecretProblem::Invalid(reason.clone()));
    }

    Ok(secret)
}

impl SecretProblem {
    pub(crate) fn into_error(
        self,
        kind: &'static str,
        policy: &str,
        secret: &str,
        expected: &'static str,
    ) -> PolicyError {
        match self {
            SecretProblem::Missing => {
                PolicyError::invalid_secret(kind, policy, secret, "secret does not exist")
            }
            SecretProblem::WrongType(actual) => {
                PolicyError::wrong_type(kind, policy, secret, &actual, expected)
            }
            SecretProblem::Invalid(reason) => {
                PolicyError::invalid_secret(kind, policy, secret, &reason)
            }
        }
    }
}

pub(crate) fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// `namespace/name` for a secret named on a policy.
pub(crate) fn secret_key(policy_namespace: &str, secret: &str) -> String {
    format!("{policy_namespace}/{secret}")
}
