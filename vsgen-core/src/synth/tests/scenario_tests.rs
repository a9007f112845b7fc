use crate::conf::types::{
    Action, ApiKey, ConfigParams, ErrorPage, ErrorPageAction, ErrorPageReturn, ListenerPorts,
    ObjectMeta, Policy, PolicyKind, PolicyReference, ResourceKind, ResourceRef, Route, Split,
    StaticParams, SuppliedIn, Tls, Upstream, VirtualServer, VirtualServerRoute,
};
use crate::document::{Return, Ssl, VirtualServerConfig};
use crate::synth::lookup::{
    BundleError, BundleValidator, EndpointSet, PolicyCatalog, SECRET_TYPE_API_KEY,
    SecretReference, SecretStore, WafResources,
};
use crate::synth::{SynthesisInput, SynthesisReport, Synthesizer};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

/// No bundle exists in these scenarios.
struct NoBundles;

impl BundleValidator for NoBundles {
    fn validate(&self, bundle: &str) -> Result<String, BundleError> {
        Err(BundleError {
            path: bundle.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}

/// One VirtualServer and everything it can reference.
struct Scenario {
    vs: VirtualServer,
    routes: Vec<VirtualServerRoute>,
    listener: ListenerPorts,
    policies: PolicyCatalog,
    endpoints: EndpointSet,
    secrets: SecretStore,
    waf: WafResources,
    features: StaticParams,
}

impl Scenario {
    fn new(vs: VirtualServer) -> Self {
        Self {
            vs,
            routes: Vec::new(),
            listener: ListenerPorts::default(),
            policies: PolicyCatalog::new(),
            endpoints: EndpointSet::default(),
            secrets: SecretStore::new(),
            waf: WafResources::default(),
            features: StaticParams::default(),
        }
    }

    fn synthesize(&self) -> (VirtualServerConfig, SynthesisReport) {
        let synth = Synthesizer::with_bundle_validator(
            ConfigParams::default(),
            self.features.clone(),
            Box::new(NoBundles),
        );
        synth.synthesize(SynthesisInput {
            virtual_server: &self.vs,
            virtual_server_routes: &self.routes,
            listener: &self.listener,
            policies: &self.policies,
            endpoints: &self.endpoints,
            secrets: &self.secrets,
            waf: &self.waf,
        })
    }
}

fn cafe(routes: Vec<Route>) -> VirtualServer {
    let mut vs = VirtualServer {
        metadata: ObjectMeta::new("default", "cafe"),
        ..VirtualServer::default()
    };
    vs.spec.host = "cafe.example.com".to_string();
    vs.spec.upstreams = vec![upstream("tea"), upstream("coffee")];
    vs.spec.routes = routes;
    vs
}

fn coffee_routes(subroutes: Vec<Route>) -> VirtualServerRoute {
    let mut vsr = VirtualServerRoute {
        metadata: ObjectMeta::new("default", "coffee"),
        ..VirtualServerRoute::default()
    };
    vsr.spec.host = "cafe.example.com".to_string();
    vsr.spec.upstreams = vec![upstream("latte"), upstream("mocha")];
    vsr.spec.subroutes = subroutes;
    vsr
}

fn upstream(name: &str) -> Upstream {
    Upstream {
        name: name.to_string(),
        service: format!("{name}-svc"),
        port: 80,
        ..Upstream::default()
    }
}

fn pass(path: &str, upstream: &str) -> Route {
    Route {
        path: path.to_string(),
        action: Some(Action::Pass(upstream.to_string())),
        ..Route::default()
    }
}

fn delegate(path: &str, route: &str) -> Route {
    Route {
        path: path.to_string(),
        route: Some(route.to_string()),
        ..Route::default()
    }
}

fn split(path: &str, first: &str, second: &str) -> Route {
    Route {
        path: path.to_string(),
        splits: vec![
            Split {
                weight: 90,
                action: Action::Pass(first.to_string()),
            },
            Split {
                weight: 10,
                action: Action::Pass(second.to_string()),
            },
        ],
        ..Route::default()
    }
}

fn not_found_page() -> ErrorPage {
    ErrorPage {
        codes: vec![404],
        action: ErrorPageAction::Return(ErrorPageReturn {
            code: 200,
            body: "nothing here".to_string(),
            ..ErrorPageReturn::default()
        }),
    }
}

fn reference(name: &str) -> PolicyReference {
    PolicyReference {
        name: name.to_string(),
        namespace: String::new(),
    }
}

fn vs_ref() -> ResourceRef {
    ResourceRef::new(ResourceKind::VirtualServer, &ObjectMeta::new("default", "cafe"))
}

#[test]
fn indices_are_unique_across_virtual_server_and_routes() {
    // Arrange
    let mut tea = split("/tea", "tea", "coffee");
    tea.error_pages = vec![not_found_page()];
    let mut latte = split("/coffee/latte", "latte", "mocha");
    latte.error_pages = vec![not_found_page()];
    let mut scenario = Scenario::new(cafe(vec![tea, delegate("/coffee", "coffee")]));
    scenario.routes = vec![coffee_routes(vec![latte])];

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert!(report.is_empty());

    let variables: BTreeSet<&str> = config
        .split_clients
        .iter()
        .map(|sc| sc.variable.as_str())
        .collect();
    assert_eq!(variables.len(), 2);
    assert_eq!(config.split_clients.len(), 2);

    let pages: Vec<&str> = config
        .server
        .error_page_locations
        .iter()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(pages, vec!["@error_page_0_0", "@error_page_1_0"]);

    let paths: BTreeSet<&str> = config
        .server
        .locations
        .iter()
        .map(|l| l.path.as_str())
        .collect();
    assert_eq!(paths.len(), config.server.locations.len());
}

#[test]
fn synthesis_is_deterministic() {
    // Arrange
    let mut scenario = Scenario::new(cafe(vec![
        split("/tea", "tea", "coffee"),
        delegate("/coffee", "coffee"),
    ]));
    scenario.routes = vec![coffee_routes(vec![pass("/coffee/latte", "latte")])];

    // Act
    let first = scenario.synthesize();
    let second = scenario.synthesize();

    // Assert
    assert_eq!(first, second);
}

#[test]
fn subroutes_inherit_error_pages_and_snippets_from_the_delegating_route() {
    // Arrange
    let mut coffee = delegate("/coffee", "coffee");
    coffee.error_pages = vec![not_found_page()];
    coffee.location_snippets = "add_header X-Delegated on;".to_string();
    let mut scenario = Scenario::new(cafe(vec![coffee]));
    scenario.routes = vec![coffee_routes(vec![pass("/coffee/latte", "latte")])];
    scenario.features.enable_snippets = true;

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert!(report.is_empty());
    let location = &config.server.locations[0];
    assert_eq!(location.path, "/coffee/latte");
    assert!(location.is_vsr);
    assert_eq!(location.snippets, vec!["add_header X-Delegated on;"]);
    assert_eq!(location.error_pages[0].name, "@error_page_0_0");
    assert_eq!(location.error_pages[0].codes, "404");
    assert_eq!(config.server.error_page_locations.len(), 1);
}

#[test]
fn tls_secret_of_wrong_type_rejects_handshakes() {
    // Arrange
    let mut vs = cafe(vec![pass("/tea", "tea")]);
    vs.spec.tls = Some(Tls {
        secret: "cafe-secret".to_string(),
        redirect: None,
    });
    let mut scenario = Scenario::new(vs);
    scenario.secrets.insert(
        "default/cafe-secret".to_string(),
        SecretReference {
            secret_type: "Opaque".to_string(),
            ..SecretReference::default()
        },
    );

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert_eq!(
        config.server.ssl,
        Some(Ssl {
            http2: false,
            certificate: String::new(),
            certificate_key: String::new(),
            reject_handshake: true,
        })
    );
    assert_eq!(
        report.messages_for(&vs_ref()),
        vec!["TLS secret cafe-secret is of a wrong type 'Opaque', must be 'kubernetes.io/tls'"]
    );
}

#[test]
fn missing_policy_collapses_the_server_to_an_error_return() {
    // Arrange
    let mut vs = cafe(vec![pass("/tea", "tea")]);
    vs.spec.policies = vec![reference("missing")];
    let scenario = Scenario::new(vs);

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert_eq!(
        config.server.policies_error_return,
        Some(Return::internal_error())
    );
    assert_eq!(
        report.messages_for(&vs_ref()),
        vec!["Policy default/missing is missing or invalid"]
    );
    assert_eq!(report.len(), 1);
}

#[test]
fn api_keys_are_emitted_hashed() {
    // Arrange
    let mut vs = cafe(vec![pass("/tea", "tea")]);
    vs.spec.policies = vec![reference("api-key")];
    let mut scenario = Scenario::new(vs);
    scenario.policies.insert(
        "default/api-key".to_string(),
        Policy {
            metadata: ObjectMeta::new("default", "api-key"),
            spec: PolicyKind::ApiKey(ApiKey {
                supplied_in: SuppliedIn {
                    header: vec!["X-API-Key".to_string()],
                    query: Vec::new(),
                },
                client_secret: "api-keys".to_string(),
            }),
        },
    );
    let mut secret = SecretReference {
        secret_type: SECRET_TYPE_API_KEY.to_string(),
        ..SecretReference::default()
    };
    secret
        .data
        .insert("client1".to_string(), "password".to_string());
    scenario
        .secrets
        .insert("default/api-keys".to_string(), secret);

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert!(report.is_empty());
    assert!(config.server.api_key_enabled);
    assert!(
        config
            .maps
            .iter()
            .any(|m| m.variable == "$apikey_auth_client_name_default_cafe_api_key")
    );
    let rendered = serde_json::to_string(&config).unwrap();
    assert!(!rendered.contains("\"password\""));
}

#[test]
fn upstreams_are_sorted_by_name() {
    // Arrange
    let mut scenario = Scenario::new(cafe(vec![
        pass("/tea", "tea"),
        delegate("/coffee", "coffee"),
    ]));
    scenario.routes = vec![coffee_routes(vec![pass("/coffee/latte", "latte")])];

    // Act
    let (config, _) = scenario.synthesize();

    // Assert
    let names: Vec<&str> = config.upstreams.iter().map(|u| u.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert_eq!(names.len(), 4);
}

#[test]
fn delegation_to_an_absent_route_is_reported() {
    // Arrange
    let scenario = Scenario::new(cafe(vec![delegate("/juice", "juice")]));

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert!(config.server.locations.is_empty());
    assert_eq!(
        report.messages_for(&vs_ref()),
        vec!["Route /juice delegates to VirtualServerRoute default/juice, which does not exist"]
    );
}

#[test]
fn internal_route_requires_the_feature_flag() {
    // Arrange
    let mut vs = cafe(vec![pass("/tea", "tea")]);
    vs.spec.internal_route = true;
    let scenario = Scenario::new(vs);

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert!(!config.spiffe_certs);
    assert_eq!(report.len(), 1);
    assert!(report.messages_for(&vs_ref())[0].starts_with("Internal Route cannot be configured"));
}

#[test]
fn enabled_internal_route_uses_spiffe_certs_for_clients() {
    // Arrange
    let mut vs = cafe(vec![pass("/tea", "tea")]);
    vs.spec.internal_route = true;
    let mut scenario = Scenario::new(vs);
    scenario.features.enable_internal_routes = true;
    scenario.features.spiffe_certs = true;

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    assert!(report.is_empty());
    assert!(config.spiffe_certs);
    assert!(!config.spiffe_client_certs);
}

#[test]
fn grpc_upstream_with_http_error_pages_is_warned_once() {
    // Arrange
    let mut tea = pass("/tea", "tea");
    tea.error_pages = vec![ErrorPage {
        codes: vec![404, 502],
        ..not_found_page()
    }];
    let mut vs = cafe(vec![tea]);
    vs.spec.upstreams[0].protocol = "grpc".to_string();
    let scenario = Scenario::new(vs);

    // Act
    let (config, report) = scenario.synthesize();

    // Assert
    let conflicts: Vec<String> = report
        .messages_for(&vs_ref())
        .into_iter()
        .filter(|m| m.contains("cannot be used for GRPC upstreams"))
        .map(|m| m.to_string())
        .collect();
    assert_eq!(
        conflicts,
        vec![
            "The error page configuration for the upstream tea is ignored for status code(s) [404 502], which cannot be used for GRPC upstreams."
        ]
    );
    assert_eq!(config.server.locations[0].error_pages[0].codes, "404 502");
}
