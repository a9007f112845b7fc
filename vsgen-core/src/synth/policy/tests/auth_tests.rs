use super::{Fixture, policy, reference, secret};
use crate::conf::types::{ApiKey, BasicAuth, JwtAuth, Oidc, PolicyKind, SuppliedIn};
use crate::document::Parameter;
use crate::synth::lookup::{
    SECRET_TYPE_API_KEY, SECRET_TYPE_HTPASSWD, SECRET_TYPE_JWK, SECRET_TYPE_OIDC, SECRET_TYPE_TLS,
};
use crate::synth::policy::{OidcBinding, PolicyContext, PolicyOutcome, api_key_client_map};
use pretty_assertions::assert_eq;

fn api_key_policy(name: &str) -> crate::conf::types::Policy {
    policy(
        name,
        PolicyKind::ApiKey(ApiKey {
            supplied_in: SuppliedIn {
                header: vec!["X-API-Key".to_string()],
                query: Vec::new(),
            },
            client_secret: "api-keys".to_string(),
        }),
    )
}

fn api_key_secret() -> crate::synth::lookup::SecretReference {
    let mut reference = secret(SECRET_TYPE_API_KEY, "");
    reference
        .data
        .insert("client1".to_string(), "password".to_string());
    reference
}

fn oidc_policy(name: &str, client_secret: &str, pkce: bool) -> crate::conf::types::Policy {
    policy(
        name,
        PolicyKind::Oidc(Oidc {
            auth_endpoint: "https://idp/auth".to_string(),
            token_endpoint: "https://idp/token".to_string(),
            jwks_uri: "https://idp/certs".to_string(),
            client_id: "cafe".to_string(),
            client_secret: client_secret.to_string(),
            auth_extra_args: vec!["kc_idp_hint=foo".to_string(), "prompt=login".to_string()],
            pkce_enable: pkce,
            ..Oidc::default()
        }),
    )
}

#[test]
fn api_key_clients_are_hashed() {
    // Arrange
    let fixture = Fixture::new(vec![api_key_policy("api-key")])
        .with_secret("default/api-keys", api_key_secret());

    // Act
    let (outcome, report) = fixture.resolve_spec(&[reference("api-key")]);

    // Assert
    assert!(report.is_empty());
    let cfg = outcome.config().expect("resolved");
    let api_key = cfg.api_key.as_ref().expect("api key");
    assert_eq!(
        api_key.map_name,
        "apikey_auth_client_name_default_cafe_api_key"
    );

    let map = api_key_client_map(&api_key.map_name, &cfg.api_key_clients);
    assert_eq!(map.source, "$apikey_auth_token");
    assert_eq!(map.variable, "$apikey_auth_client_name_default_cafe_api_key");
    assert_eq!(
        map.parameters,
        vec![
            Parameter::new("default", "\"\""),
            Parameter::new(
                "\"5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8\"",
                "\"client1\""
            ),
        ]
    );
    assert!(map.parameters.iter().all(|p| !p.value.contains("password")));
}

#[test]
fn second_api_key_is_fatal() {
    // Arrange
    let fixture = Fixture::new(vec![api_key_policy("first"), api_key_policy("second")])
        .with_secret("default/api-keys", api_key_secret());

    // Act
    let (outcome, report) = fixture.resolve_spec(&[reference("first"), reference("second")]);

    // Assert
    assert!(outcome.is_fatal());
    assert_eq!(
        report.messages_for(&fixture.owner),
        vec![
            "Multiple API Key policies in the same context is not valid. API Key policy default/second will be ignored"
        ]
    );
}

#[test]
fn basic_auth_secret_of_wrong_type_is_fatal() {
    // Arrange
    let fixture = Fixture::new(vec![policy(
        "basic",
        PolicyKind::BasicAuth(BasicAuth {
            realm: "cafe".to_string(),
            secret: "htpasswd".to_string(),
        }),
    )])
    .with_secret("default/htpasswd", secret(SECRET_TYPE_TLS, "/etc/nginx/secrets/x"));

    // Act
    let (outcome, report) = fixture.resolve_spec(&[reference("basic")]);

    // Assert
    assert!(outcome.is_fatal());
    assert_eq!(
        report.warnings[0].message,
        format!(
            "Basic Auth policy default/basic references a secret default/htpasswd of a wrong type '{SECRET_TYPE_TLS}', must be '{SECRET_TYPE_HTPASSWD}'"
        )
    );
}

#[test]
fn duplicate_jwt_keeps_the_first() {
    // Arrange
    let jwt = |secret: &str| {
        PolicyKind::JwtAuth(JwtAuth {
            realm: "cafe".to_string(),
            secret: secret.to_string(),
            token: "$http_token".to_string(),
            ..JwtAuth::default()
        })
    };
    let fixture = Fixture::new(vec![policy("jwt-a", jwt("jwk-a")), policy("jwt-b", jwt("jwk-b"))])
        .with_secret("default/jwk-a", secret(SECRET_TYPE_JWK, "/etc/nginx/secrets/a"))
        .with_secret("default/jwk-b", secret(SECRET_TYPE_JWK, "/etc/nginx/secrets/b"));

    // Act
    let (outcome, report) = fixture.resolve_spec(&[reference("jwt-a"), reference("jwt-b")]);

    // Assert
    let jwt = outcome
        .config()
        .and_then(|cfg| cfg.jwt_auth.clone())
        .expect("jwt");
    assert_eq!(jwt.secret, "/etc/nginx/secrets/a");
    assert_eq!(report.len(), 1);
}

#[test]
fn jwks_uri_is_decomposed() {
    // Arrange
    let fixture = Fixture::new(vec![policy(
        "jwks",
        PolicyKind::JwtAuth(JwtAuth {
            jwks_uri: "https://idp.example.com:8443/realms/cafe/certs".to_string(),
            key_cache: "1h".to_string(),
            ..JwtAuth::default()
        }),
    )]);

    // Act
    let (outcome, report) = fixture.resolve_spec(&[reference("jwks")]);

    // Assert
    assert!(report.is_empty());
    let cfg = outcome.config().expect("resolved");
    assert!(cfg.jwks_enabled);
    let jwt = cfg.jwt_auth.as_ref().expect("jwt");
    assert_eq!(jwt.key, "default/jwks");
    let uri = jwt.jwks_uri.as_ref().expect("jwks uri");
    assert_eq!(uri.scheme, "https");
    assert_eq!(uri.host, "idp.example.com");
    assert_eq!(uri.port, "8443");
    assert_eq!(uri.path, "/realms/cafe/certs");
}

#[test]
fn jwks_uri_keeps_an_explicit_default_port() {
    // Arrange
    let jwks = |uri: &str| {
        policy(
            "jwks",
            PolicyKind::JwtAuth(JwtAuth {
                jwks_uri: uri.to_string(),
                ..JwtAuth::default()
            }),
        )
    };
    let explicit = Fixture::new(vec![jwks("https://idp.example.com:443/certs")]);
    let implicit = Fixture::new(vec![jwks("https://idp.example.com/certs")]);

    // Act
    let (explicit, _) = explicit.resolve_spec(&[reference("jwks")]);
    let (implicit, _) = implicit.resolve_spec(&[reference("jwks")]);

    // Assert
    let port = |outcome: &PolicyOutcome| {
        let cfg = outcome.config().expect("resolved");
        let jwt = cfg.jwt_auth.as_ref().expect("jwt");
        jwt.jwks_uri.as_ref().expect("jwks uri").port.clone()
    };
    assert_eq!(port(&explicit), "443");
    assert_eq!(port(&implicit), "");
}

#[test]
fn oidc_binding_applies_defaults() {
    // Arrange
    let mut client = secret(SECRET_TYPE_OIDC, "");
    client
        .data
        .insert("client-secret".to_string(), "s3cr3t".to_string());
    let fixture =
        Fixture::new(vec![oidc_policy("sso", "oidc-secret", false)]).with_secret("default/oidc-secret", client);
    let mut binding = None;

    // Act
    let (outcome, report) = fixture.resolve(&[reference("sso")], PolicyContext::Spec, &mut binding);

    // Assert
    assert!(report.is_empty());
    assert!(outcome.config().expect("resolved").oidc);
    let OidcBinding { key, oidc } = binding.expect("bound");
    assert_eq!(key, "default/sso");
    assert_eq!(oidc.client_secret, "s3cr3t");
    assert_eq!(oidc.redirect_uri, "/_codexch");
    assert_eq!(oidc.post_logout_redirect_uri, "/_logout");
    assert_eq!(oidc.scope, "openid");
    assert_eq!(oidc.zone_sync_leeway, 200);
    assert_eq!(oidc.auth_extra_args, "kc_idp_hint=foo&prompt=login");
}

#[test]
fn second_oidc_policy_under_one_server_conflicts() {
    // Arrange
    let fixture = Fixture::new(vec![
        oidc_policy("sso-a", "", true),
        oidc_policy("sso-b", "", true),
    ]);
    let mut binding = None;

    // Act
    let (first, _) = fixture.resolve(&[reference("sso-a")], PolicyContext::Spec, &mut binding);
    let (second, report) =
        fixture.resolve(&[reference("sso-b")], PolicyContext::Route, &mut binding);

    // Assert
    assert!(!first.is_fatal());
    assert!(second.is_fatal());
    assert_eq!(
        report.messages_for(&fixture.owner),
        vec![
            "Only one oidc policy is allowed in a VirtualServer and its VirtualServerRoutes. Can't use default/sso-b. Use default/sso-a"
        ]
    );
}

#[test]
fn oidc_without_secret_requires_pkce() {
    // Arrange
    let fixture = Fixture::new(vec![oidc_policy("sso", "absent", false)]);

    // Act
    let (outcome, report) = fixture.resolve_spec(&[reference("sso")]);

    // Assert
    assert!(outcome.is_fatal());
    assert!(report.warnings[0].message.starts_with("Client secret is required"));
}
