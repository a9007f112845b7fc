//! Assembles one VirtualServer and its delegated VirtualServerRoutes into a
//! single configuration document.
//!
//! Routes are walked depth first: the VirtualServer's routes in order, then
//! every VirtualServerRoute's subroutes in input order. All structural
//! indices come from the pass-wide allocator.

use crate::conf::types::{
    ErrorPage, PolicyReference, ResourceKind, ResourceRef, Route, RouteKind, VirtualServerRoute,
};
use crate::document::{AuthJwtClaimSet, JwtAuth, LimitReqZone, Map, Server, VirtualServerConfig};
use crate::synth::ctx::Pass;
use crate::synth::error_pages::{RouteErrorPages, error_page_locations, named_location_count};
use crate::synth::location::snippets;
use crate::synth::naming::UpstreamNamer;
use crate::synth::policy::{
    ApiKeyClient, PolicyConfig, PolicyContext, PolicyOptions, PolicyOutcome, PolicyOwner,
    PolicyResolver, api_key_client_map,
};
use crate::synth::report::SynthesisReport;
use crate::synth::routing::RouteScope;
use crate::synth::ssl::{ssl_config, tls_redirect};
use crate::synth::{SynthesisInput, Synthesizer};
use std::collections::{BTreeMap, BTreeSet};

/// What a delegating route hands down to the VirtualServerRoute it names,
/// used only where the subroute leaves the field empty.
#[derive(Debug, Default, Clone, Copy)]
struct Inherited<'a> {
    snippets: Option<&'a str>,
    error_pages: Option<(&'a [ErrorPage], usize)>,
    policies: Option<&'a [PolicyReference]>,
}

/// Server-wide policy state every context contributes to.
#[derive(Debug, Default)]
struct ServerPolicies {
    jwt_auth_list: BTreeMap<String, JwtAuth>,
    jwks_enabled: bool,
    api_key_enabled: bool,
    api_key_clients: BTreeMap<String, Vec<ApiKeyClient>>,
    limit_req_zones: Vec<LimitReqZone>,
    claim_sets: Vec<AuthJwtClaimSet>,
}

impl ServerPolicies {
    /// Folds one context's resolution in; the first entry per JWKS key or
    /// API-key map wins. Group maps are appended to `maps`.
    fn absorb(&mut self, cfg: &PolicyConfig, maps: &mut Vec<Map>) {
        if cfg.jwks_enabled {
            self.jwks_enabled = true;
            if let Some(auth) = &cfg.jwt_auth {
                self.jwt_auth_list
                    .entry(auth.key.clone())
                    .or_insert_with(|| auth.clone());
            }
        }

        if let Some(api_key) = &cfg.api_key {
            self.api_key_enabled = true;
            self.api_key_clients
                .entry(api_key.map_name.clone())
                .or_insert_with(|| cfg.api_key_clients.clone());
        }

        maps.extend(cfg.rate_limit.group_maps.iter().cloned());
        maps.extend(cfg.rate_limit.policy_group_maps.iter().cloned());
        self.limit_req_zones.extend(cfg.rate_limit.zones.iter().cloned());
        self.claim_sets.extend(cfg.rate_limit.claim_sets.iter().cloned());
    }
}

pub(crate) fn assemble(
    synth: &Synthesizer,
    input: &SynthesisInput<'_>,
) -> (VirtualServerConfig, SynthesisReport) {
    let vs = input.virtual_server;
    let params = &synth.params;
    let features = &synth.features;
    let mut pass = Pass::new(vs, params, features);
    let vs_ref = pass.vs_ref.clone();

    tracing::debug!(
        resource = %vs_ref,
        routes = vs.spec.routes.len(),
        delegates = input.virtual_server_routes.len(),
        "synthesizing"
    );

    let ssl = ssl_config(
        &vs_ref,
        vs.spec.tls.as_ref(),
        input.secrets,
        params.http2,
        features.wildcard_tls,
        &mut pass.report,
    );
    let tls_redirect = tls_redirect(vs.spec.tls.as_ref());

    let resolver = PolicyResolver::new(
        input.policies,
        PolicyOptions {
            tls: ssl.is_some(),
            zone_sync: features.zone_sync,
            replicas: params.controller_replicas,
            secrets: input.secrets,
            waf: input.waf,
            bundles: &*synth.bundles,
            log_output: &params.log_output,
        },
    );
    let vs_owner = PolicyOwner {
        resource: &vs_ref,
        vs: &vs.metadata,
    };
    let mut oidc = None;
    let mut server_policies = ServerPolicies::default();

    let spec_policies = resolver.resolve(
        vs_owner,
        &vs.spec.policies,
        PolicyContext::Spec,
        "/",
        &mut oidc,
        &mut pass.report,
    );
    if let Some(cfg) = spec_policies.config() {
        server_policies.absorb(cfg, &mut pass.out.maps);
    }
    let spec_oidc = spec_policies.config().is_some_and(|cfg| cfg.oidc);

    let internal_routes = vs.spec.internal_route && features.enable_internal_routes;
    if vs.spec.internal_route && !features.enable_internal_routes {
        pass.report.internal_route_disabled(&vs_ref, &vs.metadata.name);
    }

    let vs_namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    pass.register_upstreams(
        &vs_ref,
        &vs_namer,
        &vs.spec.upstreams,
        input.endpoints,
        ssl.is_some(),
    );

    let delegates: Vec<(&VirtualServerRoute, ResourceRef, UpstreamNamer)> = input
        .virtual_server_routes
        .iter()
        .map(|vsr| {
            (
                vsr,
                ResourceRef::new(ResourceKind::VirtualServerRoute, &vsr.metadata),
                UpstreamNamer::for_virtual_server_route(&vs.metadata, &vsr.metadata),
            )
        })
        .collect();
    for (vsr, vsr_ref, namer) in &delegates {
        pass.register_upstreams(
            vsr_ref,
            namer,
            &vsr.spec.upstreams,
            input.endpoints,
            ssl.is_some(),
        );
    }

    let mut inherited: BTreeMap<String, Inherited<'_>> = BTreeMap::new();

    for route in &vs.spec.routes {
        let error_index = reserve_error_pages(&mut pass, &route.error_pages);

        if let Some(key) = route.delegate_key(&vs.metadata.namespace) {
            if !delegates.iter().any(|(vsr, _, _)| vsr.metadata.key() == key) {
                pass.report.delegated_route_missing(&vs_ref, &route.path, &key);
            }

            let entry = inherited.entry(key).or_default();
            if !route.location_snippets.is_empty() {
                entry.snippets = Some(route.location_snippets.as_str());
            }
            if !route.error_pages.is_empty() {
                entry.error_pages = Some((route.error_pages.as_slice(), error_index));
            }
            if !route.policies.is_empty() {
                entry.policies = Some(route.policies.as_slice());
            }
            continue;
        }

        let outcome = resolver.resolve(
            vs_owner,
            &route.policies,
            PolicyContext::Route,
            &route.path,
            &mut oidc,
            &mut pass.report,
        );
        let scope = RouteScope::new(
            vs_ref.clone(),
            &vs_namer,
            None,
            &route.path,
            snippets(
                features.enable_snippets,
                &route.location_snippets,
                &params.location_snippets,
            ),
            RouteErrorPages {
                pages: &route.error_pages,
                index: error_index,
                owner: vs_ref.clone(),
            },
        );
        compile_route(&mut pass, &scope, route, &outcome, spec_oidc, &mut server_policies);
    }

    for (vsr, vsr_ref, namer) in &delegates {
        let defaults = inherited
            .get(&vsr.metadata.key())
            .copied()
            .unwrap_or_default();

        for route in &vsr.spec.subroutes {
            let own_index = reserve_error_pages(&mut pass, &route.error_pages);
            let error_pages = match defaults.error_pages {
                Some((pages, index)) if route.error_pages.is_empty() => RouteErrorPages {
                    pages,
                    index,
                    owner: vs_ref.clone(),
                },
                _ => RouteErrorPages {
                    pages: &route.error_pages,
                    index: own_index,
                    owner: vsr_ref.clone(),
                },
            };

            let snippet = if route.location_snippets.is_empty() {
                defaults.snippets.unwrap_or_default()
            } else {
                &route.location_snippets
            };

            let outcome = if route.policies.is_empty() {
                resolver.resolve(
                    vs_owner,
                    defaults.policies.unwrap_or_default(),
                    PolicyContext::Route,
                    &route.path,
                    &mut oidc,
                    &mut pass.report,
                )
            } else {
                resolver.resolve(
                    PolicyOwner {
                        resource: vsr_ref,
                        vs: &vs.metadata,
                    },
                    &route.policies,
                    PolicyContext::Subroute,
                    &route.path,
                    &mut oidc,
                    &mut pass.report,
                )
            };

            let scope = RouteScope::new(
                vsr_ref.clone(),
                namer,
                Some(&vsr.metadata),
                &route.path,
                snippets(features.enable_snippets, snippet, &params.location_snippets),
                error_pages,
            );
            compile_route(&mut pass, &scope, route, &outcome, spec_oidc, &mut server_policies);
        }
    }

    for (map_name, clients) in &server_policies.api_key_clients {
        pass.out.maps.push(api_key_client_map(map_name, clients));
    }

    let http_snippets = snippets(features.enable_snippets, &vs.spec.http_snippets, &[]);
    let server_snippets = snippets(
        features.enable_snippets,
        &vs.spec.server_snippets,
        &params.server_snippets,
    );

    let Pass {
        out,
        backends,
        report,
        ..
    } = pass;

    let mut upstreams = backends.upstreams;
    upstreams.sort_by(|a, b| a.name.cmp(&b.name));

    let spec_cfg = spec_policies.config().cloned().unwrap_or_default();
    let listener = input.listener;

    let server = Server {
        server_name: vs.spec.host.clone(),
        status_zone: vs.spec.host.clone(),
        gunzip: vs.spec.gunzip,
        http_port: listener.http_port,
        https_port: listener.https_port,
        http_ipv4: listener.http_ipv4.clone(),
        http_ipv6: listener.http_ipv6.clone(),
        https_ipv4: listener.https_ipv4.clone(),
        https_ipv6: listener.https_ipv6.clone(),
        custom_listeners: vs.spec.listener.is_some(),
        disable_ipv6: features.disable_ipv6,
        proxy_protocol: params.proxy_protocol,
        ssl,
        tls_redirect,
        tls_passthrough: features.tls_passthrough,
        server_tokens: params.server_tokens.clone(),
        set_real_ip_from: params.set_real_ip_from.clone(),
        real_ip_header: params.real_ip_header.clone(),
        real_ip_recursive: params.real_ip_recursive,
        snippets: server_snippets,
        internal_redirect_locations: out.internal_redirects,
        locations: out.locations,
        return_locations: out.return_locations,
        error_page_locations: out.error_page_locations,
        health_checks: backends.health_checks,
        allow: spec_cfg.allow,
        deny: spec_cfg.deny,
        limit_req_options: spec_cfg.rate_limit.options,
        limit_reqs: spec_cfg.rate_limit.reqs,
        jwt_auth: spec_cfg.jwt_auth,
        jwt_auth_list: server_policies.jwt_auth_list,
        jwks_auth_enabled: server_policies.jwks_enabled,
        basic_auth: spec_cfg.basic_auth,
        ingress_mtls: spec_cfg.ingress_mtls,
        egress_mtls: spec_cfg.egress_mtls,
        oidc: oidc.map(|binding| binding.oidc),
        api_key: spec_cfg.api_key,
        api_key_enabled: server_policies.api_key_enabled,
        waf: spec_cfg.waf,
        policies_error_return: spec_policies.error_return(),
        vs_namespace: vs.metadata.namespace.clone(),
        vs_name: vs.metadata.name.clone(),
    };

    let config = VirtualServerConfig {
        upstreams,
        split_clients: out.split_clients,
        maps: dedup_by(out.maps, |m| (m.source.clone(), m.variable.clone())),
        status_matches: backends.status_matches,
        limit_req_zones: dedup_by(server_policies.limit_req_zones, |z| z.zone_name.clone()),
        auth_jwt_claim_sets: dedup_by(server_policies.claim_sets, |c| c.variable.clone()),
        http_snippets,
        server,
        spiffe_certs: internal_routes,
        spiffe_client_certs: features.spiffe_certs && !internal_routes,
        dynamic_ssl_reload_enabled: features.dynamic_ssl_reload,
        static_ssl_path: features.static_ssl_path.clone(),
        key_val_zones: out.key_val_zones,
        key_vals: out.key_vals,
        two_way_split_clients: out.two_way_split_clients,
    };

    tracing::debug!(
        resource = %vs_ref,
        upstreams = config.upstreams.len(),
        locations = config.server.locations.len(),
        warnings = report.len(),
        "synthesized"
    );

    (config, report)
}

/// Reserves the route's error-page index and emits its named locations.
///
/// Delegating routes reserve too, so the index they hand down stays unique.
fn reserve_error_pages(pass: &mut Pass<'_>, pages: &[ErrorPage]) -> usize {
    let index = pass.indices.reserve_error_pages(named_location_count(pages));
    pass.out.error_page_locations.extend(error_page_locations(index, pages));
    index
}

/// Compiles a non-delegating route and stamps its policies on every location it produced.
fn compile_route(
    pass: &mut Pass<'_>,
    scope: &RouteScope<'_>,
    route: &Route,
    outcome: &PolicyOutcome,
    spec_oidc: bool,
    server_policies: &mut ServerPolicies,
) {
    if let Some(cfg) = outcome.config() {
        server_policies.absorb(cfg, &mut pass.out.maps);
    }

    let first = pass.out.locations.len();
    match route.kind() {
        Some(RouteKind::Matches { matches, otherwise }) => {
            pass.compile_matches_route(scope, matches, otherwise);
        }
        Some(RouteKind::Splits(splits)) => pass.compile_splits_route(scope, splits),
        Some(RouteKind::Action(action)) => pass.compile_action_route(scope, action),
        Some(RouteKind::Delegate(_)) | None => {
            pass.report.route_without_action(&scope.owner, &route.path);
            return;
        }
    }

    tracing::debug!(
        owner = %scope.owner,
        path = %route.path,
        locations = pass.out.locations.len() - first,
        "compiled route"
    );

    for location in &mut pass.out.locations[first..] {
        outcome.apply_to(location);
        if spec_oidc {
            location.oidc = true;
        }
    }
}

/// Keeps the first item for every key, preserving order.
fn dedup_by<T, K: Ord>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}
