//! Upstream blocks, backup servers and premium health checks.

use crate::conf::types::{ConfigParams, ResourceRef, Upstream};
use crate::document::{
    self, HealthCheck, Queue, SessionCookie, StatusMatch, UpstreamLabels, UpstreamServer,
};
use crate::synth::ctx::{Pass, RegisteredUpstream};
use crate::synth::location::{NGINX_502_SERVER, normalize_time, scheme, time_with_default};
use crate::synth::lookup::EndpointLookup;
use crate::synth::naming::{UpstreamNamer, endpoints_key, external_name_key, status_match};
use std::collections::BTreeMap;

/// Load-balancing methods that cannot ramp a server up gradually.
const SLOW_START_INCOMPATIBLE: [&str; 6] = [
    "random",
    "ip_hash",
    "random two",
    "random two least_conn",
    "random two least_time=header",
    "random two least_time=last_byte",
];

const DEFAULT_QUEUE_TIMEOUT: &str = "60s";

impl<'a> Pass<'a> {
    /// Emits an upstream block for every declared upstream and registers it
    /// so that actions can resolve their proxy target.
    ///
    /// `owner` declares `upstreams` and receives their warnings.
    pub(crate) fn register_upstreams(
        &mut self,
        owner: &ResourceRef,
        namer: &UpstreamNamer,
        upstreams: &'a [Upstream],
        endpoints: &dyn EndpointLookup,
        tls_terminated: bool,
    ) {
        let vs_ref = self.vs_ref.clone();

        for upstream in upstreams {
            if upstream.is_grpc() && (!tls_terminated || !self.params.http2) {
                self.report.grpc_requires_http2_and_tls(owner, &upstream.name);
            }

            let name = namer.upstream(&upstream.name);
            let namespace = namer.namespace();
            let servers = self.upstream_servers(owner, namespace, upstream, endpoints);
            // Backup warnings always land on the VirtualServer.
            let backup_servers = self.backup_servers(&vs_ref, namespace, upstream, endpoints);
            let resolve =
                endpoints.is_external_name(&external_name_key(namespace, &upstream.service));

            let block = self.upstream_block(
                owner,
                &name,
                upstream,
                servers,
                backup_servers,
                resolve,
            );
            self.backends.upstreams.push(block);

            let tls = self.is_tls_enabled(upstream);
            tracing::debug!(upstream = %name, tls, resolve, "registered upstream");
            self.upstreams.insert(name.clone(), RegisteredUpstream { upstream, tls });

            if !self.features.plus {
                continue;
            }
            if let Some(check) = health_check(upstream, &name, tls, self.params) {
                if !check.r#match.is_empty() {
                    let code = upstream
                        .health_check
                        .as_ref()
                        .map(|hc| hc.status_match.clone())
                        .unwrap_or_default();
                    self.backends.status_matches.push(StatusMatch {
                        name: check.r#match.clone(),
                        code,
                    });
                }
                self.backends.health_checks.push(check);
            }
        }
    }

    /// Internal routes never use TLS to the backend; otherwise SPIFFE
    /// certificates force it on.
    fn is_tls_enabled(&self, upstream: &Upstream) -> bool {
        if self.vs.spec.internal_route {
            return false;
        }
        upstream.tls.enable || self.features.spiffe_certs
    }

    fn upstream_servers(
        &mut self,
        owner: &ResourceRef,
        namespace: &str,
        upstream: &Upstream,
        endpoints: &dyn EndpointLookup,
    ) -> Vec<UpstreamServer> {
        let key = endpoints_key(
            namespace,
            &upstream.service,
            &upstream.subselector,
            upstream.port,
        );
        let addresses = endpoints.endpoints(&key);

        if !self.features.plus && addresses.is_empty() {
            return vec![UpstreamServer {
                address: NGINX_502_SERVER.to_string(),
            }];
        }

        if endpoints.is_external_name(&external_name_key(namespace, &upstream.service))
            && !self.features.resolver_enabled
        {
            self.report.external_name_without_resolver(
                owner,
                &upstream.service,
                &upstream.name,
            );
            return Vec::new();
        }

        sorted_servers(addresses)
    }

    fn backup_servers(
        &mut self,
        owner: &ResourceRef,
        namespace: &str,
        upstream: &Upstream,
        endpoints: &dyn EndpointLookup,
    ) -> Vec<UpstreamServer> {
        let Some(port) = upstream.backup_port.filter(|_| !upstream.backup.is_empty()) else {
            return Vec::new();
        };

        if endpoints.is_external_name(&external_name_key(namespace, &upstream.backup))
            && !self.features.resolver_enabled
        {
            self.report.external_name_without_resolver(
                owner,
                &upstream.backup,
                &upstream.name,
            );
            return Vec::new();
        }

        let key = endpoints_key(namespace, &upstream.backup, &upstream.subselector, port);
        sorted_servers(endpoints.endpoints(&key))
    }

    fn upstream_block(
        &mut self,
        owner: &ResourceRef,
        name: &str,
        upstream: &Upstream,
        servers: Vec<UpstreamServer>,
        backup_servers: Vec<UpstreamServer>,
        resolve: bool,
    ) -> document::Upstream {
        let params = self.params;
        let lb_method = lb_method(&upstream.lb_method, &params.lb_method);

        let mut block = document::Upstream {
            name: name.to_string(),
            labels: UpstreamLabels {
                service: upstream.service.clone(),
                resource_type: owner.kind.label().to_string(),
                resource_name: owner.name.clone(),
                resource_namespace: owner.namespace.clone(),
            },
            servers,
            backup_servers,
            resolve,
            lb_method: String::new(),
            keepalive: upstream.keepalive.unwrap_or(params.keepalive),
            max_fails: upstream.max_fails.unwrap_or(params.max_fails),
            fail_timeout: time_with_default(&upstream.fail_timeout, &params.fail_timeout),
            max_conns: upstream.max_conns.unwrap_or(params.max_conns),
            upstream_zone_size: params.upstream_zone_size.clone(),
            ..document::Upstream::default()
        };

        if self.features.plus {
            block.slow_start = self.slow_start(owner, upstream, &lb_method);
            block.queue = upstream.queue.as_ref().map(|queue| Queue {
                size: queue.size,
                timeout: time_with_default(&queue.timeout, DEFAULT_QUEUE_TIMEOUT),
            });
            block.session_cookie = upstream
                .session_cookie
                .as_ref()
                .filter(|cookie| cookie.enable)
                .map(|cookie| SessionCookie {
                    enable: true,
                    name: cookie.name.clone(),
                    path: cookie.path.clone(),
                    expires: cookie.expires.clone(),
                    domain: cookie.domain.clone(),
                    http_only: cookie.http_only,
                    secure: cookie.secure,
                    same_site: cookie.same_site.clone(),
                });
            block.ntlm = upstream.ntlm;
        }

        block.lb_method = lb_method;
        block
    }

    fn slow_start(&mut self, owner: &ResourceRef, upstream: &Upstream, lb_method: &str) -> String {
        if upstream.slow_start.is_empty() {
            return String::new();
        }

        if SLOW_START_INCOMPATIBLE.contains(&lb_method) || lb_method.starts_with("hash") {
            self.report.slow_start_disabled(owner, &upstream.name, lb_method);
            return String::new();
        }

        normalize_time(&upstream.slow_start)
    }
}

/// An empty method inherits the global default; `round_robin` is the data
/// plane's implicit behavior and renders as nothing.
pub fn lb_method(method: &str, default: &str) -> String {
    match method {
        "" => default.to_string(),
        "round_robin" => String::new(),
        other => other.to_string(),
    }
}

fn sorted_servers(addresses: &[String]) -> Vec<UpstreamServer> {
    let mut servers: Vec<UpstreamServer> = addresses
        .iter()
        .map(|address| UpstreamServer {
            address: address.clone(),
        })
        .collect();
    servers.sort();
    servers
}

/// Active health check for `upstream`, if one is enabled.
///
/// `tls` is the effective backend TLS; a `tls` block on the check itself
/// overrides the scheme of the probe only.
pub(crate) fn health_check(
    upstream: &Upstream,
    name: &str,
    tls: bool,
    params: &ConfigParams,
) -> Option<HealthCheck> {
    let spec = upstream.health_check.as_ref().filter(|hc| hc.enable)?;
    let grpc = upstream.is_grpc();

    let override_time = |value: &str, default: String| {
        if value.is_empty() {
            default
        } else {
            normalize_time(value)
        }
    };
    let probe_tls = spec.tls.as_ref().map_or(tls, |t| t.enable);

    Some(HealthCheck {
        name: name.to_string(),
        uri: if !spec.path.is_empty() {
            spec.path.clone()
        } else if grpc {
            String::new()
        } else {
            "/".to_string()
        },
        interval: override_time(&spec.interval, "5s".to_string()),
        jitter: override_time(&spec.jitter, "0s".to_string()),
        keepalive_time: override_time(&spec.keepalive_time, "60s".to_string()),
        fails: if spec.fails > 0 { spec.fails } else { 1 },
        passes: if spec.passes > 0 { spec.passes } else { 1 },
        port: spec.port,
        proxy_pass: format!("{}://{name}", scheme(probe_tls)),
        proxy_connect_timeout: override_time(
            &spec.connect_timeout,
            time_with_default(&upstream.connect_timeout, &params.proxy_connect_timeout),
        ),
        proxy_read_timeout: override_time(
            &spec.read_timeout,
            time_with_default(&upstream.read_timeout, &params.proxy_read_timeout),
        ),
        proxy_send_timeout: override_time(
            &spec.send_timeout,
            time_with_default(&upstream.send_timeout, &params.proxy_send_timeout),
        ),
        headers: spec
            .headers
            .iter()
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect::<BTreeMap<_, _>>(),
        r#match: if spec.status_match.is_empty() {
            String::new()
        } else {
            status_match(name)
        },
        grpc_pass: if grpc {
            format!("{}://{name}", if tls { "grpcs" } else { "grpc" })
        } else {
            String::new()
        },
        grpc_status: spec.grpc_status,
        grpc_service: spec.grpc_service.clone(),
        is_grpc: grpc,
        mandatory: spec.mandatory,
        persistent: spec.persistent,
    })
}
