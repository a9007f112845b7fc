//! Client authentication: JWT, basic auth and API keys.

use crate::conf::types::{ApiKey, BasicAuth, JwtAuth, ObjectMeta};
use crate::document::{self, JwksUri, Map, Parameter};
use crate::synth::lookup::{SECRET_TYPE_API_KEY, SECRET_TYPE_HTPASSWD, SECRET_TYPE_JWK};
use crate::synth::naming::rfc1123_to_snake;
use crate::synth::policy::{
    Checked, PolicyConfig, PolicyError, PolicyOptions, PolicyWarning, checked_secret, secret_key,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use url::Url;

/// An API key client; only the digest of its key ever leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyClient {
    pub client_id: String,
    pub hashed_key: String,
}

impl ApiKeyClient {
    fn new(client_id: &str, key: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            hashed_key: hex::encode(Sha256::digest(key.as_bytes())),
        }
    }
}

impl PolicyConfig {
    pub(crate) fn add_jwt_auth(
        &mut self,
        policy: &JwtAuth,
        key: &str,
        namespace: &str,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if self.jwt_auth.is_some() {
            return Ok(vec![PolicyWarning::DuplicateJwt {
                policy: key.to_string(),
            }]);
        }

        match (policy.secret.is_empty(), policy.jwks_uri.is_empty()) {
            (false, true) => {
                let secret = secret_key(namespace, &policy.secret);
                let reference = checked_secret(options.secrets, &secret, SECRET_TYPE_JWK)
                    .map_err(|problem| {
                        vec![problem.into_error("JWT", key, &secret, SECRET_TYPE_JWK)]
                    })?;

                self.jwt_auth = Some(document::JwtAuth {
                    secret: reference.path.clone(),
                    realm: policy.realm.clone(),
                    token: policy.token.clone(),
                    ..document::JwtAuth::default()
                });
            }
            (true, false) => {
                let uri = Url::parse(&policy.jwks_uri).map_err(|source| {
                    vec![PolicyError::JwtInvalidJwksUri {
                        policy: key.to_string(),
                        uri: policy.jwks_uri.clone(),
                        source,
                    }]
                })?;

                self.jwt_auth = Some(document::JwtAuth {
                    key: key.to_string(),
                    jwks_uri: Some(JwksUri {
                        scheme: uri.scheme().to_string(),
                        host: uri.host_str().unwrap_or_default().to_string(),
                        port: explicit_port(&policy.jwks_uri).to_string(),
                        path: uri.path().to_string(),
                        sni_name: policy.sni_name.clone(),
                        sni_enabled: policy.sni_enabled,
                    }),
                    realm: policy.realm.clone(),
                    token: policy.token.clone(),
                    key_cache: policy.key_cache.clone(),
                    ..document::JwtAuth::default()
                });
                self.jwks_enabled = true;
            }
            _ => {
                return Err(vec![PolicyError::JwtSourceAmbiguous {
                    policy: key.to_string(),
                }]);
            }
        }

        Ok(Vec::new())
    }

    pub(crate) fn add_basic_auth(
        &mut self,
        policy: &BasicAuth,
        key: &str,
        namespace: &str,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if self.basic_auth.is_some() {
            return Ok(vec![PolicyWarning::DuplicateBasicAuth {
                policy: key.to_string(),
            }]);
        }

        let secret = secret_key(namespace, &policy.secret);
        let reference = checked_secret(options.secrets, &secret, SECRET_TYPE_HTPASSWD)
            .map_err(|problem| {
                vec![problem.into_error("Basic Auth", key, &secret, SECRET_TYPE_HTPASSWD)]
            })?;

        self.basic_auth = Some(document::BasicAuth {
            secret: reference.path.clone(),
            realm: policy.realm.clone(),
        });
        Ok(Vec::new())
    }

    /// A second API key policy in one context is fatal, unlike the other auth kinds.
    pub(crate) fn add_api_key(
        &mut self,
        policy: &ApiKey,
        key: &str,
        namespace: &str,
        vs: &ObjectMeta,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if self.api_key.is_some() {
            return Err(vec![PolicyError::DuplicateApiKey {
                policy: key.to_string(),
            }]);
        }

        let secret = secret_key(namespace, &policy.client_secret);
        let reference = checked_secret(options.secrets, &secret, SECRET_TYPE_API_KEY)
            .map_err(|problem| {
                vec![problem.into_error("API Key", key, &secret, SECRET_TYPE_API_KEY)]
            })?;

        // BTreeMap iteration keeps the clients sorted by ID.
        self.api_key_clients = reference
            .data
            .iter()
            .map(|(client_id, api_key)| ApiKeyClient::new(client_id, api_key))
            .collect();

        let policy_name = key.rsplit('/').next().unwrap_or(key);
        self.api_key = Some(document::ApiKey {
            header: policy.supplied_in.header.clone(),
            query: policy.supplied_in.query.clone(),
            map_name: format!(
                "apikey_auth_client_name_{}_{}_{}",
                rfc1123_to_snake(&vs.namespace),
                rfc1123_to_snake(&vs.name),
                rfc1123_to_snake(policy_name)
            ),
        });
        Ok(Vec::new())
    }
}

/// Maps the presented token's digest to the client ID; unknown tokens map to `""`.
pub fn api_key_client_map(map_name: &str, clients: &[ApiKeyClient]) -> Map {
    let mut parameters = vec![Parameter::new("default", "\"\"")];
    parameters.extend(clients.iter().map(|client| {
        Parameter::new(
            format!("\"{}\"", client.hashed_key),
            format!("\"{}\"", client.client_id),
        )
    }));

    Map {
        source: "$apikey_auth_token".to_string(),
        variable: format!("${map_name}"),
        parameters,
    }
}

/// Port exactly as written in the URI authority, empty when absent.
///
/// `Url::port` hides a port equal to the scheme default; the upstream keeps it.
fn explicit_port(uri: &str) -> &str {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    match host_port.rsplit_once(':') {
        Some((_, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => port,
        _ => "",
    }
}
