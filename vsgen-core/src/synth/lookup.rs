//! Read-only collaborators consulted during a synthesis pass.
//!
//! Secrets, endpoints and WAF resources are resolved elsewhere; the engine
//! only looks them up by `namespace/name` style keys.

use crate::conf::types::Policy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";
pub const SECRET_TYPE_CA: &str = "nginx.org/ca";
pub const SECRET_TYPE_JWK: &str = "nginx.org/jwk";
pub const SECRET_TYPE_HTPASSWD: &str = "nginx.org/htpasswd";
pub const SECRET_TYPE_OIDC: &str = "nginx.org/oidc";
pub const SECRET_TYPE_API_KEY: &str = "nginx.org/apikey";

/// Directory secrets are materialized into.
pub const DEFAULT_SECRET_PATH: &str = "/etc/nginx/secrets";

/// Data key of the revocation list embedded in a CA secret.
pub const CA_CRL_KEY: &str = "ca.crl";
/// Data key of the OIDC client secret.
pub const CLIENT_SECRET_KEY: &str = "client-secret";

/// A secret as materialized by the secret store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretReference {
    /// Declared type; empty when the secret object could not be read at all.
    #[serde(rename = "type")]
    pub secret_type: String,
    /// On-disk path(s) of the materialized files, space separated for CA bundles.
    pub path: String,
    pub data: BTreeMap<String, String>,
    /// Why the secret is unusable, if it is.
    pub error: Option<String>,
}

pub trait SecretLookup {
    fn secret(&self, key: &str) -> Option<&SecretReference>;
}

/// Secrets keyed by `namespace/name`.
pub type SecretStore = BTreeMap<String, SecretReference>;

impl SecretLookup for SecretStore {
    fn secret(&self, key: &str) -> Option<&SecretReference> {
        self.get(key)
    }
}

pub trait EndpointLookup {
    /// Live addresses for an endpoints key, empty when none are known.
    fn endpoints(&self, key: &str) -> &[String];

    /// Whether `namespace/service` is resolved by DNS at runtime.
    fn is_external_name(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointSet {
    pub endpoints: BTreeMap<String, Vec<String>>,
    pub external_names: BTreeSet<String>,
}

impl EndpointLookup for EndpointSet {
    fn endpoints(&self, key: &str) -> &[String] {
        self.endpoints.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    fn is_external_name(&self, key: &str) -> bool {
        self.external_names.contains(key)
    }
}

impl EndpointSet {
    pub fn extend(&mut self, other: EndpointSet) {
        for (key, addresses) in other.endpoints {
            self.endpoints.entry(key).or_default().extend(addresses);
        }
        self.external_names.extend(other.external_names);
    }
}

/// Policies keyed by `namespace/name`.
pub type PolicyCatalog = BTreeMap<String, Policy>;

/// WAF policy and log configuration files keyed by `namespace/name`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WafResources {
    pub policies: BTreeMap<String, String>,
    pub log_confs: BTreeMap<String, String>,
}

impl WafResources {
    pub fn extend(&mut self, other: WafResources) {
        self.policies.extend(other.policies);
        self.log_confs.extend(other.log_confs);
    }
}

#[derive(Debug, Error)]
#[error("bundle {path} is not accessible: {source}")]
pub struct BundleError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Resolves WAF bundle references to files on disk.
pub trait BundleValidator: Send + Sync {
    /// Full path of the bundle, or an error carrying the path that was tried.
    fn validate(&self, bundle: &str) -> Result<String, BundleError>;
}

/// Looks bundles up under a fixed directory.
#[derive(Debug, Clone)]
pub struct FsBundleValidator {
    root: PathBuf,
}

impl FsBundleValidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BundleValidator for FsBundleValidator {
    fn validate(&self, bundle: &str) -> Result<String, BundleError> {
        let path = self.root.join(bundle);
        let display = path.to_string_lossy().into_owned();
        match std::fs::metadata(&path) {
            Ok(_) => Ok(display),
            Err(source) => Err(BundleError {
                path: display,
                source,
            }),
        }
    }
}
