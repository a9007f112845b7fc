use crate::conf::types::{SecurityLog, Waf};
use crate::document;
use crate::synth::policy::{
    Checked, PolicyConfig, PolicyError, PolicyOptions, PolicyWarning, or_default,
};

impl PolicyConfig {
    /// Bundle and log problems are all reported before the context is failed.
    pub(crate) fn add_waf(
        &mut self,
        policy: &Waf,
        key: &str,
        namespace: &str,
        options: &PolicyOptions<'_>,
    ) -> Checked {
        if self.waf.is_some() {
            return Ok(vec![PolicyWarning::DuplicateWaf {
                policy: key.to_string(),
            }]);
        }

        let mut waf = document::Waf {
            enable: if policy.enable { "on" } else { "off" }.to_string(),
            ..document::Waf::default()
        };
        let mut errors = Vec::new();

        if !policy.ap_policy.is_empty() {
            let ap_policy = namespaced(namespace, &policy.ap_policy);
            match options.waf.policies.get(&ap_policy) {
                Some(path) => waf.ap_policy = path.clone(),
                None => {
                    return Err(vec![PolicyError::WafPolicyMissing {
                        policy: key.to_string(),
                        ap_policy,
                    }]);
                }
            }
        }

        if !policy.ap_bundle.is_empty() {
            waf.ap_bundle = match options.bundles.validate(&policy.ap_bundle) {
                Ok(path) => path,
                Err(err) => {
                    errors.push(PolicyError::WafBundleMissing {
                        policy: key.to_string(),
                        bundle: err.path.clone(),
                    });
                    err.path
                }
            };
        }

        let security_logs: Vec<&SecurityLog> = match (&policy.security_logs, &policy.security_log) {
            (Some(logs), _) => logs.iter().collect(),
            (None, Some(log)) => {
                tracing::debug!(
                    policy = key,
                    "securityLog is deprecated, use securityLogs instead"
                );
                vec![log]
            }
            (None, None) => Vec::new(),
        };

        if policy.security_logs.is_some() || policy.security_log.is_some() {
            waf.ap_security_log_enable = true;
        }

        for log in security_logs {
            let destination = or_default(&log.log_dest, options.log_output);

            if !log.ap_log_conf.is_empty() {
                let log_conf = namespaced(namespace, &log.ap_log_conf);
                match options.waf.log_confs.get(&log_conf) {
                    Some(path) => waf.ap_log_conf.push(format!("{path} {destination}")),
                    None => errors.push(PolicyError::WafLogConfMissing {
                        policy: key.to_string(),
                        log_conf,
                    }),
                }
            }

            if !log.ap_log_bundle.is_empty() {
                match options.bundles.validate(&log.ap_log_bundle) {
                    Ok(path) => waf.ap_log_conf.push(format!("{path} {destination}")),
                    Err(err) => errors.push(PolicyError::WafLogBundleMissing {
                        policy: key.to_string(),
                        bundle: err.path,
                    }),
                }
            }
        }

        self.waf = Some(waf);
        if errors.is_empty() {
            Ok(Vec::new())
        } else {
            Err(errors)
        }
    }
}

fn namespaced(namespace: &str, name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{namespace}/{name}")
    }
}
