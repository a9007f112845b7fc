use crate::conf::types::{
    ConfigParams, HealthCheck, Header, ObjectMeta, ResourceKind, ResourceRef, StaticParams,
    Upstream, UpstreamTls, VirtualServer,
};
use crate::document::UpstreamServer;
use crate::synth::ctx::Pass;
use crate::synth::location::NGINX_502_SERVER;
use crate::synth::lookup::EndpointSet;
use crate::synth::naming::UpstreamNamer;
use crate::synth::upstream::lb_method;
use pretty_assertions::assert_eq;

fn cafe() -> VirtualServer {
    VirtualServer {
        metadata: ObjectMeta::new("default", "cafe"),
        ..VirtualServer::default()
    }
}

fn tea() -> Upstream {
    Upstream {
        name: "tea".to_string(),
        service: "tea-svc".to_string(),
        port: 80,
        ..Upstream::default()
    }
}

fn plus() -> StaticParams {
    StaticParams {
        plus: true,
        ..StaticParams::default()
    }
}

fn register<'a>(
    pass: &mut Pass<'a>,
    vs: &VirtualServer,
    upstreams: &'a [Upstream],
    endpoints: &EndpointSet,
) {
    let owner = ResourceRef::new(ResourceKind::VirtualServer, &vs.metadata);
    let namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    pass.register_upstreams(&owner, &namer, upstreams, endpoints, false);
}

#[test]
fn servers_are_sorted_and_labelled() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = StaticParams::default();
    let mut endpoints = EndpointSet::default();
    endpoints.endpoints.insert(
        "default/tea-svc:80".to_string(),
        vec!["10.0.0.2:80".to_string(), "10.0.0.1:80".to_string()],
    );
    let upstreams = vec![tea()];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &endpoints);

    // Assert
    let upstream = &pass.backends.upstreams[0];
    assert_eq!(upstream.name, "vs_default_cafe_tea");
    assert_eq!(
        upstream.servers,
        vec![
            UpstreamServer {
                address: "10.0.0.1:80".to_string()
            },
            UpstreamServer {
                address: "10.0.0.2:80".to_string()
            },
        ]
    );
    assert_eq!(upstream.labels.resource_type, "virtualserver");
    assert_eq!(upstream.labels.service, "tea-svc");
    assert_eq!(upstream.lb_method, "random two least_conn");
    assert_eq!(upstream.fail_timeout, "10s");
    assert!(pass.upstreams.contains_key("vs_default_cafe_tea"));
    assert!(pass.report.is_empty());
}

#[test]
fn missing_endpoints_fall_back_to_placeholder_without_plus() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = StaticParams::default();
    let upstreams = vec![tea()];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &EndpointSet::default());

    // Assert
    assert_eq!(
        pass.backends.upstreams[0].servers,
        vec![UpstreamServer {
            address: NGINX_502_SERVER.to_string()
        }]
    );
}

#[test]
fn external_name_without_resolver_is_ignored_with_warning() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = plus();
    let mut endpoints = EndpointSet::default();
    endpoints.external_names.insert("default/tea-svc".to_string());
    let upstreams = vec![tea()];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &endpoints);

    // Assert
    let upstream = &pass.backends.upstreams[0];
    assert!(upstream.servers.is_empty());
    assert!(upstream.resolve);
    let owner = ResourceRef::new(ResourceKind::VirtualServer, &vs.metadata);
    assert_eq!(
        pass.report.messages_for(&owner),
        vec![
            "Type ExternalName service tea-svc in upstream tea will be ignored. To use ExternaName services, a resolver must be configured in the ConfigMap"
        ]
    );
}

#[test]
fn slow_start_is_disabled_for_incompatible_lb_methods() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = plus();
    let upstreams = vec![
        Upstream {
            slow_start: "30".to_string(),
            ..tea()
        },
        Upstream {
            name: "coffee".to_string(),
            slow_start: "30".to_string(),
            lb_method: "least_conn".to_string(),
            ..tea()
        },
        Upstream {
            name: "juice".to_string(),
            slow_start: "30s".to_string(),
            lb_method: "hash $request_uri consistent".to_string(),
            ..tea()
        },
    ];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &EndpointSet::default());

    // Assert
    let slow_starts: Vec<&str> = pass
        .backends
        .upstreams
        .iter()
        .map(|u| u.slow_start.as_str())
        .collect();
    assert_eq!(slow_starts, vec!["", "30s", ""]);
    assert_eq!(pass.report.len(), 2);
}

#[test]
fn health_check_applies_defaults_and_status_match() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = plus();
    let upstreams = vec![Upstream {
        read_timeout: "5".to_string(),
        health_check: Some(HealthCheck {
            enable: true,
            interval: "10".to_string(),
            status_match: "200-399".to_string(),
            headers: vec![Header {
                name: "Host".to_string(),
                value: "tea.example.com".to_string(),
            }],
            tls: Some(UpstreamTls { enable: true }),
            ..HealthCheck::default()
        }),
        ..tea()
    }];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &EndpointSet::default());

    // Assert
    let check = &pass.backends.health_checks[0];
    assert_eq!(check.uri, "/");
    assert_eq!(check.interval, "10s");
    assert_eq!(check.jitter, "0s");
    assert_eq!(check.keepalive_time, "60s");
    assert_eq!((check.fails, check.passes), (1, 1));
    assert_eq!(check.proxy_pass, "https://vs_default_cafe_tea");
    assert_eq!(check.proxy_read_timeout, "5s");
    assert_eq!(check.proxy_connect_timeout, "60s");
    assert_eq!(check.headers["Host"], "tea.example.com");
    assert_eq!(check.r#match, "vs_default_cafe_tea_match");

    let status = &pass.backends.status_matches[0];
    assert_eq!(status.name, "vs_default_cafe_tea_match");
    assert_eq!(status.code, "200-399");

    // The probe scheme does not change how requests are proxied.
    assert!(!pass.upstreams["vs_default_cafe_tea"].tls);
}

#[test]
fn health_checks_need_the_premium_data_plane() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = StaticParams::default();
    let upstreams = vec![Upstream {
        health_check: Some(HealthCheck {
            enable: true,
            ..HealthCheck::default()
        }),
        ..tea()
    }];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &EndpointSet::default());

    // Assert
    assert!(pass.backends.health_checks.is_empty());
}

#[test]
fn grpc_upstream_without_tls_termination_warns() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams {
        http2: true,
        ..ConfigParams::default()
    };
    let features = StaticParams::default();
    let upstreams = vec![Upstream {
        protocol: "grpc".to_string(),
        ..tea()
    }];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &EndpointSet::default());

    // Assert
    let owner = ResourceRef::new(ResourceKind::VirtualServer, &vs.metadata);
    assert_eq!(
        pass.report.messages_for(&owner),
        vec![
            "gRPC cannot be configured for upstream tea. gRPC requires enabled HTTP/2 and TLS termination"
        ]
    );
}

#[test]
fn backup_servers_use_the_backup_service() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams::default();
    let features = plus();
    let mut endpoints = EndpointSet::default();
    endpoints.endpoints.insert(
        "default/tea-backup:8080".to_string(),
        vec!["10.0.1.1:8080".to_string()],
    );
    let upstreams = vec![Upstream {
        backup: "tea-backup".to_string(),
        backup_port: Some(8080),
        ..tea()
    }];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &endpoints);

    // Assert
    assert_eq!(
        pass.backends.upstreams[0].backup_servers,
        vec![UpstreamServer {
            address: "10.0.1.1:8080".to_string()
        }]
    );
}

#[test]
fn round_robin_renders_as_the_implicit_method() {
    assert_eq!(lb_method("", "least_conn"), "least_conn");
    assert_eq!(lb_method("round_robin", "least_conn"), "");
    assert_eq!(lb_method("ip_hash", "least_conn"), "ip_hash");
}

#[test]
fn health_check_overrides_normalize_bare_numbers() {
    // Arrange
    let vs = cafe();
    let params = ConfigParams {
        proxy_connect_timeout: "45".to_string(),
        ..ConfigParams::default()
    };
    let features = plus();
    let upstreams = vec![
        Upstream {
            health_check: Some(HealthCheck {
                enable: true,
                interval: "10".to_string(),
                jitter: "3".to_string(),
                keepalive_time: "120".to_string(),
                fails: 3,
                passes: 2,
                ..HealthCheck::default()
            }),
            ..tea()
        },
        Upstream {
            name: "coffee".to_string(),
            health_check: Some(HealthCheck {
                enable: true,
                ..HealthCheck::default()
            }),
            ..tea()
        },
    ];
    let mut pass = Pass::new(&vs, &params, &features);

    // Act
    register(&mut pass, &vs, &upstreams, &EndpointSet::default());

    // Assert
    let tea = &pass.backends.health_checks[0];
    assert_eq!(tea.interval, "10s");
    assert_eq!(tea.jitter, "3s");
    assert_eq!(tea.keepalive_time, "120s");
    assert_eq!((tea.fails, tea.passes), (3, 2));

    let coffee = &pass.backends.health_checks[1];
    assert_eq!(coffee.interval, "5s");
    assert_eq!(coffee.jitter, "0s");
    // Global defaults are used exactly as configured.
    assert_eq!(coffee.proxy_connect_timeout, "45");
}
