//! Rate limiting, including tiered limits keyed on a JWT claim or variable.

use crate::conf::types::{ObjectMeta, RateLimit};
use crate::document::{AuthJwtClaimSet, LimitReq, LimitReqOptions, LimitReqZone, Map, Parameter};
use crate::synth::naming::{VariableNamer, rfc1123_to_snake};
use crate::synth::policy::{
    Checked, PolicyConfig, PolicyContext, PolicyOptions, PolicyOwner, PolicyWarning,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::collections::BTreeMap;

impl PolicyConfig {
    pub(crate) fn add_rate_limit(
        &mut self,
        policy: &RateLimit,
        meta: &ObjectMeta,
        owner: PolicyOwner<'_>,
        options: &PolicyOptions<'_>,
        context: PolicyContext,
        path: &str,
    ) -> Checked {
        let mut zone_name = rfc1123_to_snake(&format!(
            "pol_rl_{}_{}_{}_{}",
            meta.namespace, meta.name, owner.vs.namespace, owner.vs.name
        ));
        if options.zone_sync {
            zone_name.push_str("_sync");
        }

        let rate = if policy.scale && options.zone_sync {
            tracing::info!(
                policy = %meta.key(),
                "zone sync and rate limit scale are both enabled, the scale value is not used"
            );
            policy.rate.clone()
        } else if policy.scale {
            scale_rate(&policy.rate, options.replicas)
        } else {
            policy.rate.clone()
        };

        let mut zone = LimitReqZone {
            zone_name: zone_name.clone(),
            key: policy.key.clone(),
            zone_size: policy.zone_size.clone(),
            rate,
            sync: options.zone_sync,
            ..LimitReqZone::default()
        };

        if let Some(condition) = &policy.condition {
            let namer = VariableNamer::new(owner.vs);
            let encoded_path = URL_SAFE_NO_PAD.encode(path.as_bytes());
            let vs = owner.vs;

            if let Some(jwt) = &condition.jwt {
                zone.group_value = jwt.matches.clone();
                zone.policy_value = format!(
                    "rl_{}_{}_match_{}",
                    vs.namespace,
                    vs.name,
                    jwt.matches.to_lowercase()
                );
                zone.group_variable = rfc1123_to_snake(&format!(
                    "$rl_{}_{}_group_{}_{context}_{encoded_path}",
                    vs.namespace,
                    vs.name,
                    jwt.claim.replace('.', "_").to_lowercase()
                ));
                zone.group_source = namer.jwt_claim(&jwt.claim);
            }

            if let Some(variable) = condition.variables.first() {
                zone.group_value = format!("\"{}\"", variable.matches);
                zone.policy_value = rfc1123_to_snake(&format!(
                    "rl_{}_{}_match_{}",
                    vs.namespace,
                    vs.name,
                    meta.name.to_lowercase()
                ));
                zone.group_variable = rfc1123_to_snake(&format!(
                    "$rl_{}_{}_variable_{}_{context}_{encoded_path}",
                    vs.namespace,
                    vs.name,
                    variable.name.replace('$', "")
                ));
                zone.group_source = variable.name.clone();
            }

            zone.key = rfc1123_to_snake(&format!("${zone_name}"));
            zone.policy_result = policy.key.clone();
            zone.group_default = condition.default;

            self.rate_limit.policy_group_maps.push(policy_group_map(&zone));

            if let Some(jwt) = condition
                .jwt
                .as_ref()
                .filter(|jwt| !jwt.claim.is_empty() && !jwt.matches.is_empty())
            {
                self.rate_limit.claim_sets.push(AuthJwtClaimSet {
                    variable: namer.jwt_claim(&jwt.claim),
                    claim: jwt.claim.replace('.', " "),
                });
            }
        }

        self.rate_limit.zones.push(zone);
        self.rate_limit.reqs.push(limit_req(zone_name, policy));

        let current = limit_req_options(policy);
        if self.rate_limit.reqs.len() == 1 {
            self.rate_limit.options = current;
            return Ok(Vec::new());
        }

        let first = &self.rate_limit.options;
        let policy_key = meta.key();
        let mut warnings = Vec::new();
        if current.dry_run != first.dry_run {
            warnings.push(option_overridden(
                &policy_key,
                "dryRun",
                current.dry_run,
                first.dry_run,
            ));
        }
        if current.log_level != first.log_level {
            warnings.push(option_overridden(
                &policy_key,
                "logLevel",
                &current.log_level,
                &first.log_level,
            ));
        }
        if current.reject_code != first.reject_code {
            warnings.push(option_overridden(
                &policy_key,
                "rejectCode",
                current.reject_code,
                first.reject_code,
            ));
        }
        Ok(warnings)
    }
}

fn option_overridden(
    policy: &str,
    option: &'static str,
    value: impl ToString,
    first: impl ToString,
) -> PolicyWarning {
    PolicyWarning::RateLimitOptionOverridden {
        policy: policy.to_string(),
        option,
        value: value.to_string(),
        first: first.to_string(),
    }
}

fn limit_req(zone_name: String, policy: &RateLimit) -> LimitReq {
    let no_delay = policy.no_delay.unwrap_or(false);
    LimitReq {
        zone_name,
        burst: policy.burst.unwrap_or(0),
        no_delay,
        delay: if no_delay { 0 } else { policy.delay.unwrap_or(0) },
    }
}

fn limit_req_options(policy: &RateLimit) -> LimitReqOptions {
    let defaults = LimitReqOptions::default();
    LimitReqOptions {
        dry_run: policy.dry_run.unwrap_or(defaults.dry_run),
        log_level: if policy.log_level.is_empty() {
            defaults.log_level
        } else {
            policy.log_level.clone()
        },
        reject_code: policy.reject_code.unwrap_or(defaults.reject_code),
    }
}

/// Maps the group variable onto the zone key; the `Val` prefix keeps the key
/// non-empty so the default tier still applies.
fn policy_group_map(zone: &LimitReqZone) -> Map {
    Map {
        source: zone.group_variable.clone(),
        variable: format!("${}", rfc1123_to_snake(&zone.zone_name)),
        parameters: vec![
            Parameter::new("default", "''"),
            Parameter::new(&zone.policy_value, format!("Val{}", zone.policy_result)),
        ],
    }
}

/// One map per group variable, merging every tier that shares it.
///
/// Fails when more than one tier of the same group claims to be the default.
pub(crate) fn group_maps(zones: &[LimitReqZone]) -> Result<Vec<Map>, ()> {
    let mut maps: BTreeMap<&str, Map> = BTreeMap::new();

    for zone in zones.iter().filter(|z| !z.group_variable.is_empty()) {
        let mut parameters = vec![Parameter::new(&zone.group_value, &zone.policy_value)];
        if zone.group_default {
            parameters.push(Parameter::new("default", &zone.policy_value));
        }
        if let Some(existing) = maps.remove(zone.group_variable.as_str()) {
            parameters.extend(existing.parameters);
        }
        maps.insert(
            &zone.group_variable,
            Map {
                source: zone.group_source.clone(),
                variable: zone.group_variable.clone(),
                parameters,
            },
        );
    }

    let maps: Vec<Map> = maps.into_values().collect();
    let conflicting = maps.iter().any(|map| {
        map.parameters
            .iter()
            .filter(|p| p.value == "default")
            .count()
            > 1
    });
    if conflicting {
        return Err(());
    }
    Ok(maps)
}

/// Divides a `Nr/s` or `Nr/m` rate across `replicas`.
///
/// Per-second rates that would drop below one are expressed per minute.
/// Anything unparsable is returned unchanged.
pub fn scale_rate(rate: &str, replicas: u32) -> String {
    if replicas <= 1 {
        return rate.to_string();
    }

    let (number, unit) = match rate.strip_suffix("r/s") {
        Some(number) => (number, "r/s"),
        None => match rate.strip_suffix("r/m") {
            Some(number) => (number, "r/m"),
            None => return rate.to_string(),
        },
    };
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return rate.to_string();
    }
    let Ok(number) = number.parse::<u64>() else {
        return rate.to_string();
    };

    let replicas = u64::from(replicas);
    if unit == "r/s" && number < replicas {
        return format!("{}r/m", number * 60 / replicas);
    }
    format!("{}{unit}", number / replicas)
}
