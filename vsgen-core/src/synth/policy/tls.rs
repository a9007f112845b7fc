//! Mutual TLS towards clients (ingress) and towards upstreams (egress).

use crate::conf::types::{EgressMtls, IngressMtls};
use crate::document;
use crate::synth::lookup::{CA_CRL_KEY, DEFAULT_SECRET_PATH, SECRET_TYPE_CA, SECRET_TYPE_TLS};
use crate::synth::policy::{
    Checked, PolicyConfig, PolicyContext, PolicyError, PolicyOptions, PolicyWarning,
    checked_secret, or_default, secret_key,
};

impl PolicyConfig {
    /// Only valid on the VirtualServer itself, and only when it terminates TLS.
    pub(crate) fn add_ingress_mtls(
        &mut self,
        policy: &IngressMtls,
        key: &str,
        namespace: &str,
        context: PolicyContext,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if !options.tls {
            return Err(vec![PolicyError::IngressMtlsRequiresTls {
                policy: key.to_string(),
            }]);
        }
        if context != PolicyContext::Spec {
            return Err(vec![PolicyError::IngressMtlsContext {
                policy: key.to_string(),
                context: context.to_string(),
            }]);
        }
        if self.ingress_mtls.is_some() {
            return Ok(vec![PolicyWarning::DuplicateIngressMtls {
                policy: key.to_string(),
            }]);
        }

        let secret = secret_key(namespace, &policy.client_cert_secret);
        let reference = checked_secret(options.secrets, &secret, SECRET_TYPE_CA).map_err(
            |problem| vec![problem.into_error("IngressMTLS", key, &secret, SECRET_TYPE_CA)],
        )?;

        // A CA secret carrying a CRL materializes as "<ca path> <crl path>".
        let mut fields = reference.path.split_whitespace();
        let client_cert = fields.next().unwrap_or_default().to_string();
        let embedded_crl = reference
            .data
            .contains_key(CA_CRL_KEY)
            .then(|| fields.next())
            .flatten();

        let mut warnings = Vec::new();
        let client_crl = match (embedded_crl, policy.crl_file_name.is_empty()) {
            (Some(crl), named) => {
                if !named {
                    warnings.push(PolicyWarning::IngressMtlsCrlConflict {
                        policy: key.to_string(),
                        secret: secret.clone(),
                    });
                }
                crl.to_string()
            }
            (None, false) => format!("{DEFAULT_SECRET_PATH}/{}", policy.crl_file_name),
            (None, true) => String::new(),
        };

        self.ingress_mtls = Some(document::IngressMtls {
            client_cert,
            client_crl,
            verify_client: if policy.verify_client.is_empty() {
                "on".to_string()
            } else {
                policy.verify_client.clone()
            },
            verify_depth: policy.verify_depth.unwrap_or(1),
        });
        Ok(warnings)
    }

    pub(crate) fn add_egress_mtls(
        &mut self,
        policy: &EgressMtls,
        key: &str,
        namespace: &str,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if self.egress_mtls.is_some() {
            return Ok(vec![PolicyWarning::DuplicateEgressMtls {
                policy: key.to_string(),
            }]);
        }

        let mut certificate = String::new();
        if !policy.tls_secret.is_empty() {
            let secret = secret_key(namespace, &policy.tls_secret);
            let reference = checked_secret(options.secrets, &secret, SECRET_TYPE_TLS).map_err(
                |problem| vec![problem.into_error("EgressMTLS", key, &secret, SECRET_TYPE_TLS)],
            )?;
            certificate = reference.path.clone();
        }

        let mut trusted_cert = String::new();
        if !policy.trusted_cert_secret.is_empty() {
            let secret = secret_key(namespace, &policy.trusted_cert_secret);
            let reference = checked_secret(options.secrets, &secret, SECRET_TYPE_CA).map_err(
                |problem| vec![problem.into_error("EgressMTLS", key, &secret, SECRET_TYPE_CA)],
            )?;
            trusted_cert = reference
                .path
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
        }

        self.egress_mtls = Some(document::EgressMtls {
            certificate_key: certificate.clone(),
            certificate,
            verify_server: policy.verify_server,
            verify_depth: policy.verify_depth.unwrap_or(1),
            ciphers: or_default(&policy.ciphers, "DEFAULT"),
            protocols: or_default(&policy.protocols, "TLSv1 TLSv1.1 TLSv1.2"),
            trusted_cert,
            session_reuse: policy.session_reuse.unwrap_or(true),
            server_name: policy.server_name,
            ssl_name: or_default(&policy.ssl_name, "$proxy_host"),
        });
        Ok(Vec::new())
    }
}
