use super::*;
use crate::document::{Distribution, InternalRedirectLocation, Parameter};
use pretty_assertions::assert_eq;

#[test]
fn static_splits_compile_to_one_split_client() {
    // Arrange
    let vs = cafe();
    let params = params();
    let features = features(false);
    let upstreams = vec![upstream("a"), upstream("b")];
    let namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    let mut pass = Pass::new(&vs, &params, &features);
    register(&mut pass, &namer, &upstreams);
    let splits = vec![split(30, "a"), split(70, "b")];

    // Act
    pass.compile_splits_route(&scope(&vs, &namer, "/tea"), &splits);

    // Assert
    assert_eq!(pass.out.split_clients.len(), 1);
    let client = &pass.out.split_clients[0];
    assert_eq!(client.source, "$request_id");
    assert_eq!(client.variable, "$vs_default_cafe_splits_0");
    assert_eq!(
        client.distributions,
        vec![
            Distribution {
                weight: "30%".to_string(),
                value: "/internal_location_splits_0_split_0".to_string(),
            },
            Distribution {
                weight: "70%".to_string(),
                value: "/internal_location_splits_0_split_1".to_string(),
            },
        ]
    );

    let locations = &pass.out.locations;
    assert_eq!(locations.len(), 2);
    assert!(locations.iter().all(|l| l.internal));
    assert_eq!(
        locations[0].proxy_pass,
        "http://vs_default_cafe_a$request_uri"
    );
    assert_eq!(
        locations[1].proxy_pass,
        "http://vs_default_cafe_b$request_uri"
    );
    assert_eq!(locations[0].proxy_ssl_name, "a-svc.default.svc");

    assert_eq!(
        pass.out.internal_redirects,
        vec![InternalRedirectLocation {
            path: "/tea".to_string(),
            destination: "$vs_default_cafe_splits_0".to_string(),
        }]
    );
}

#[test]
fn zero_weight_split_is_dropped() {
    // Arrange
    let vs = cafe();
    let params = params();
    let features = features(false);
    let upstreams = vec![upstream("a"), upstream("b"), upstream("c")];
    let namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    let mut pass = Pass::new(&vs, &params, &features);
    register(&mut pass, &namer, &upstreams);
    let splits = vec![split(50, "a"), split(0, "b"), split(50, "c")];

    // Act
    pass.compile_splits_route(&scope(&vs, &namer, "/tea"), &splits);

    // Assert
    let values: Vec<&str> = pass.out.split_clients[0]
        .distributions
        .iter()
        .map(|d| d.value.as_str())
        .collect();
    assert_eq!(
        values,
        vec![
            "/internal_location_splits_0_split_0",
            "/internal_location_splits_0_split_2",
        ]
    );
    let paths: Vec<&str> = pass.out.locations.iter().map(|l| l.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/internal_location_splits_0_split_0",
            "/internal_location_splits_0_split_2",
        ]
    );
}

#[test]
fn dynamic_reload_precomputes_every_weight_pair() {
    // Arrange
    let vs = cafe();
    let params = params();
    let features = features(true);
    let upstreams = vec![upstream("a"), upstream("b")];
    let namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    let mut pass = Pass::new(&vs, &params, &features);
    register(&mut pass, &namer, &upstreams);
    let splits = vec![split(90, "a"), split(10, "b")];

    // Act
    pass.compile_splits_route(&scope(&vs, &namer, "/coffee"), &splits);

    // Assert
    let out = &pass.out;
    assert_eq!(out.split_clients.len(), 101);
    assert_eq!(
        out.split_clients[0].variable,
        "$vs_default_cafe_split_clients_0_0_100"
    );
    assert_eq!(out.split_clients[0].distributions.len(), 1);
    assert_eq!(out.split_clients[30].distributions.len(), 2);
    assert_eq!(out.split_clients[30].distributions[0].weight, "30%");
    assert_eq!(out.split_clients[30].distributions[1].weight, "70%");

    assert_eq!(out.maps.len(), 1);
    let map = &out.maps[0];
    assert_eq!(map.source, "$vs_default_cafe_keyval_split_clients_0");
    assert_eq!(map.variable, "$vs_default_cafe_map_split_clients_0");
    assert_eq!(map.parameters.len(), 102);
    assert_eq!(
        map.parameters.last(),
        Some(&Parameter::new(
            "default",
            "$vs_default_cafe_split_clients_0_100_0"
        ))
    );

    assert_eq!(out.key_val_zones.len(), 1);
    assert_eq!(
        out.key_val_zones[0].state,
        "/etc/nginx/state_files/vs_default_cafe_keyval_zone_split_clients_0.json"
    );
    assert_eq!(out.two_way_split_clients[0].weights, [90, 10]);
    assert_eq!(out.locations.len(), 2);
    assert_eq!(
        out.internal_redirects[0].destination,
        "$vs_default_cafe_map_split_clients_0"
    );
}

#[test]
fn dynamic_reload_tie_selects_second_split() {
    // Arrange
    let vs = cafe();
    let params = params();
    let features = features(true);
    let upstreams = vec![upstream("a"), upstream("b")];
    let namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    let mut pass = Pass::new(&vs, &params, &features);
    register(&mut pass, &namer, &upstreams);
    let splits = vec![split(50, "a"), split(50, "b")];

    // Act
    pass.compile_splits_route(&scope(&vs, &namer, "/coffee"), &splits);

    // Assert
    let default = pass.out.maps[0]
        .parameters
        .iter()
        .find(|p| p.value == "default")
        .map(|p| p.result.as_str());
    assert_eq!(default, Some("$vs_default_cafe_split_clients_0_0_100"));
}

#[test]
fn split_indices_advance_by_consumed_clients() {
    // Arrange
    let vs = cafe();
    let params = params();
    let features = features(true);
    let upstreams = vec![upstream("a"), upstream("b")];
    let namer = UpstreamNamer::for_virtual_server(&vs.metadata);
    let mut pass = Pass::new(&vs, &params, &features);
    register(&mut pass, &namer, &upstreams);
    let two = vec![split(50, "a"), split(50, "b")];
    let three = vec![split(20, "a"), split(40, "b"), split(40, "a")];

    // Act
    pass.compile_splits_route(&scope(&vs, &namer, "/one"), &two);
    pass.compile_splits_route(&scope(&vs, &namer, "/two"), &three);

    // Assert
    assert_eq!(
        pass.out.internal_redirects[1].destination,
        "$vs_default_cafe_splits_101"
    );
    assert_eq!(pass.out.split_clients.len(), 102);
}
