use crate::conf::types::Oidc;
use crate::document;
use crate::synth::lookup::{CLIENT_SECRET_KEY, SECRET_TYPE_OIDC};
use crate::synth::policy::{
    Checked, OidcBinding, PolicyConfig, PolicyError, PolicyOptions, PolicyWarning, or_default,
    secret_key,
};

impl PolicyConfig {
    /// The first OIDC policy seen anywhere under the VirtualServer is bound to
    /// it; later contexts may only reference that same policy.
    pub(crate) fn add_oidc(
        &mut self,
        policy: &Oidc,
        key: &str,
        namespace: &str,
        binding: &mut Option<OidcBinding>,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if self.oidc {
            return Ok(vec![PolicyWarning::DuplicateOidc {
                policy: key.to_string(),
            }]);
        }

        match binding {
            Some(existing) if existing.key != key => {
                return Err(vec![PolicyError::OidcConflict {
                    policy: key.to_string(),
                    existing: existing.key.clone(),
                }]);
            }
            Some(_) => {}
            None => {
                let client_secret = client_secret(policy, key, namespace, options)?;
                *binding = Some(OidcBinding {
                    key: key.to_string(),
                    oidc: document::Oidc {
                        auth_endpoint: policy.auth_endpoint.clone(),
                        auth_extra_args: policy.auth_extra_args.join("&"),
                        token_endpoint: policy.token_endpoint.clone(),
                        jwks_uri: policy.jwks_uri.clone(),
                        end_session_endpoint: policy.end_session_endpoint.clone(),
                        client_id: policy.client_id.clone(),
                        client_secret,
                        scope: or_default(&policy.scope, "openid"),
                        redirect_uri: or_default(&policy.redirect_uri, "/_codexch"),
                        post_logout_redirect_uri: or_default(
                            &policy.post_logout_redirect_uri,
                            "/_logout",
                        ),
                        zone_sync_leeway: policy.zone_sync_leeway.unwrap_or(200),
                        access_token_enable: policy.access_token_enable,
                        pkce_enable: policy.pkce_enable,
                    },
                });
            }
        }

        self.oidc = true;
        Ok(Vec::new())
    }
}

/// PKCE and a client secret are mutually exclusive; exactly one is required.
fn client_secret(
    policy: &Oidc,
    key: &str,
    namespace: &str,
    options: &PolicyOptions<'_>,
) -> Result<String, Vec<PolicyError>> {
    let secret = secret_key(namespace, &policy.client_secret);
    let Some(reference) = options.secrets.secret(&secret) else {
        if policy.pkce_enable {
            return Ok(String::new());
        }
        return Err(vec![PolicyError::OidcSecretRequired {
            policy: key.to_string(),
        }]);
    };

    if !reference.secret_type.is_empty() && reference.secret_type != SECRET_TYPE_OIDC {
        return Err(vec![PolicyError::wrong_type(
            "OIDC",
            key,
            &secret,
            &reference.secret_type,
            SECRET_TYPE_OIDC,
        )]);
    }
    if policy.pkce_enable {
        return Err(vec![PolicyError::OidcSecretWithPkce {
            policy: key.to_string(),
        }]);
    }
    if let Some(reason) = &reference.error {
        return Err(vec![PolicyError::invalid_secret("OIDC", key, &secret, reason)]);
    }

    Ok(reference
        .data
        .get(CLIENT_SECRET_KEY)
        .cloned()
        .unwrap_or_default())
}
