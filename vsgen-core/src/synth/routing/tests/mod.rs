mod splits_tests;

use crate::conf::types::{
    Action, ConfigParams, ObjectMeta, ResourceKind, ResourceRef, Split, StaticParams, Upstream,
    VirtualServer,
};
use crate::synth::ctx::{Pass, RegisteredUpstream};
use crate::synth::error_pages::RouteErrorPages;
use crate::synth::naming::UpstreamNamer;
use crate::synth::routing::RouteScope;

pub(crate) fn cafe() -> VirtualServer {
    VirtualServer {
        metadata: ObjectMeta::new("default", "cafe"),
        ..VirtualServer::default()
    }
}

pub(crate) fn upstream(name: &str) -> Upstream {
    Upstream {
        name: name.to_string(),
        service: format!("{name}-svc"),
        port: 80,
        ..Upstream::default()
    }
}

pub(crate) fn pass(upstream: &str) -> Action {
    Action::Pass(upstream.to_string())
}

pub(crate) fn split(weight: u32, upstream: &str) -> Split {
    Split {
        weight,
        action: pass(upstream),
    }
}

/// Registers `upstreams` under the VirtualServer's namer.
pub(crate) fn register<'a>(
    pass: &mut Pass<'a>,
    namer: &UpstreamNamer,
    upstreams: &'a [Upstream],
) {
    for upstream in upstreams {
        pass.upstreams.insert(
            namer.upstream(&upstream.name),
            RegisteredUpstream {
                upstream,
                tls: upstream.tls.enable,
            },
        );
    }
}

pub(crate) fn scope<'a>(
    vs: &VirtualServer,
    namer: &'a UpstreamNamer,
    path: &'a str,
) -> RouteScope<'a> {
    let owner = ResourceRef::new(ResourceKind::VirtualServer, &vs.metadata);
    RouteScope::new(
        owner.clone(),
        namer,
        None,
        path,
        Vec::new(),
        RouteErrorPages {
            pages: &[],
            index: 0,
            owner,
        },
    )
}

pub(crate) fn features(dynamic_weight_reload: bool) -> StaticParams {
    StaticParams {
        dynamic_weight_reload,
        ..StaticParams::default()
    }
}

pub(crate) fn params() -> ConfigParams {
    ConfigParams::default()
}
