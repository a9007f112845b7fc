use crate::conf::types::ResourceRef;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisWarning {
    pub resource: ResourceRef,
    pub message: String,
}

/// Warnings recorded during one synthesis pass, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub warnings: Vec<SynthesisWarning>,
}

#[derive(Serialize)]
struct SynthesisReportJson<'a> {
    warnings: &'a [SynthesisWarning],
}

impl SynthesisReport {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Messages attached to one resource.
    pub fn messages_for(&self, resource: &ResourceRef) -> Vec<&str> {
        self.warnings
            .iter()
            .filter(|w| &w.resource == resource)
            .map(|w| w.message.as_str())
            .collect()
    }

    pub(crate) fn warn(&mut self, resource: &ResourceRef, message: impl Display) {
        let message = message.to_string();
        tracing::debug!(resource = %resource, %message, "synthesis warning");
        self.warnings.push(SynthesisWarning {
            resource: resource.clone(),
            message,
        });
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&SynthesisReportJson {
            warnings: &self.warnings,
        })
    }

    pub fn render_plain(&self) {
        for warning in &self.warnings {
            println!("{}: warning: {}", warning.resource, warning.message);
        }
    }

    pub fn render_pretty(&self) {
        if self.warnings.is_empty() {
            println!("{}", "no warnings".green());
            return;
        }

        println!("synthesis produced {} warning(s)\n", self.warnings.len());

        let mut by_resource = BTreeMap::new();
        for warning in &self.warnings {
            by_resource
                .entry(&warning.resource)
                .or_insert_with(Vec::new)
                .push(warning);
        }

        for (resource, warnings) in by_resource {
            println!("{}", resource.bold());
            for warning in warnings {
                println!("  {}: {}", "warning".yellow().bold(), warning.message);
            }
            println!();
        }
    }
}

/// TLS and listener
impl SynthesisReport {
    pub fn tls_secret_wrong_type(&mut self, owner: &ResourceRef, secret: &str, actual: &str) {
        self.warn(
            owner,
            format_args!(
                "TLS secret {secret} is of a wrong type '{actual}', must be '{}'",
                crate::synth::lookup::SECRET_TYPE_TLS
            ),
        );
    }

    pub fn tls_secret_invalid(&mut self, owner: &ResourceRef, secret: &str, reason: &str) {
        self.warn(owner, format_args!("TLS secret {secret} is invalid: {reason}"));
    }

    pub fn internal_route_disabled(&mut self, owner: &ResourceRef, name: &str) {
        self.warn(
            owner,
            format_args!(
                "Internal Route cannot be configured for virtual server {name}. Internal Routes can be enabled by setting the enable-internal-routes flag"
            ),
        );
    }
}

/// Upstreams
impl SynthesisReport {
    pub fn grpc_requires_http2_and_tls(&mut self, owner: &ResourceRef, upstream: &str) {
        self.warn(
            owner,
            format_args!(
                "gRPC cannot be configured for upstream {upstream}. gRPC requires enabled HTTP/2 and TLS termination"
            ),
        );
    }

    pub fn external_name_without_resolver(
        &mut self,
        owner: &ResourceRef,
        service: &str,
        upstream: &str,
    ) {
        self.warn(
            owner,
            format_args!(
                "Type ExternalName service {service} in upstream {upstream} will be ignored. To use ExternaName services, a resolver must be configured in the ConfigMap"
            ),
        );
    }

    pub fn slow_start_disabled(&mut self, owner: &ResourceRef, upstream: &str, lb_method: &str) {
        self.warn(
            owner,
            format_args!(
                "Slow start will be disabled for upstream {upstream} because lb method '{lb_method}' is incompatible with slow start"
            ),
        );
    }

    pub fn grpc_error_pages_ignored(&mut self, owner: &ResourceRef, upstream: &str, codes: &[u16]) {
        let codes = codes
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        self.warn(
            owner,
            format_args!(
                "The error page configuration for the upstream {upstream} is ignored for status code(s) [{codes}], which cannot be used for GRPC upstreams."
            ),
        );
    }
}

/// Routes
impl SynthesisReport {
    pub fn route_without_action(&mut self, owner: &ResourceRef, path: &str) {
        self.warn(
            owner,
            format_args!("Route {path} defines no action, splits, matches or delegation and will be ignored"),
        );
    }

    pub fn delegated_route_missing(&mut self, owner: &ResourceRef, path: &str, route: &str) {
        self.warn(
            owner,
            format_args!("Route {path} delegates to VirtualServerRoute {route}, which does not exist"),
        );
    }
}
