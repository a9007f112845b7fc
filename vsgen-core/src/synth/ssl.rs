use crate::conf::types::{ResourceRef, Tls};
use crate::document::{Ssl, TlsRedirect};
use crate::synth::lookup::{SECRET_TYPE_TLS, SecretLookup};
use crate::synth::report::SynthesisReport;

/// Certificate and key materialized for the controller's wildcard secret.
pub const WILDCARD_TLS_PATH: &str = "/etc/nginx/secrets/wildcard";

/// TLS termination settings for the VirtualServer, if it terminates TLS.
///
/// A secret of the wrong type or one that failed to load keeps the listener
/// but rejects every handshake.
pub(crate) fn ssl_config(
    owner: &ResourceRef,
    tls: Option<&Tls>,
    secrets: &dyn SecretLookup,
    http2: bool,
    wildcard_tls: bool,
    report: &mut SynthesisReport,
) -> Option<Ssl> {
    let tls = tls?;

    if tls.secret.is_empty() {
        return wildcard_tls.then(|| Ssl {
            http2,
            certificate: WILDCARD_TLS_PATH.to_string(),
            certificate_key: WILDCARD_TLS_PATH.to_string(),
            reject_handshake: false,
        });
    }

    let key = format!("{}/{}", owner.namespace, tls.secret);
    let path = match secrets.secret(&key) {
        Some(secret)
            if !secret.secret_type.is_empty() && secret.secret_type != SECRET_TYPE_TLS =>
        {
            report.tls_secret_wrong_type(owner, &tls.secret, &secret.secret_type);
            None
        }
        Some(secret) => match &secret.error {
            Some(error) => {
                report.tls_secret_invalid(owner, &tls.secret, error);
                None
            }
            None => Some(secret.path.clone()),
        },
        None => {
            report.tls_secret_invalid(owner, &tls.secret, "secret doesn't exist");
            None
        }
    };

    let reject_handshake = path.is_none();
    let path = path.unwrap_or_default();
    Some(Ssl {
        http2,
        certificate: path.clone(),
        certificate_key: path,
        reject_handshake,
    })
}

/// HTTP to HTTPS redirect, when enabled on the TLS block.
pub(crate) fn tls_redirect(tls: Option<&Tls>) -> Option<TlsRedirect> {
    let redirect = tls?.redirect.as_ref().filter(|r| r.enable)?;
    Some(TlsRedirect {
        code: redirect.code.unwrap_or(301),
        based_on: if redirect.based_on == "x-forwarded-proto" {
            "$http_x_forwarded_proto".to_string()
        } else {
            "$scheme".to_string()
        },
    })
}
