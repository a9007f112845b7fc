//! State threaded through one synthesis pass.

use crate::conf::types::{
    ConfigParams, ResourceKind, ResourceRef, StaticParams, Upstream, VirtualServer,
};
use crate::document::{
    self, ErrorPageLocation, HealthCheck, InternalRedirectLocation, KeyVal, KeyValZone, Location,
    Map, ReturnLocation, SplitClient, StatusMatch, TwoWaySplitClients,
};
use crate::synth::naming::VariableNamer;
use crate::synth::report::SynthesisReport;
use std::collections::BTreeMap;

/// Number of split-client blocks a runtime-switchable two-way split expands to.
pub const DYNAMIC_SPLIT_CLIENTS: usize = 101;

/// Structural indices for one synthesis pass.
///
/// Every counter is shared by the VirtualServer and all of its
/// VirtualServerRoutes; each value is handed out exactly once, in
/// depth-first order.
#[derive(Debug, Default)]
pub struct IndexAllocator {
    split_clients: usize,
    matches: usize,
    return_locations: usize,
    error_pages: usize,
}

impl IndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `count` consecutive split-client indices and returns the first.
    pub fn reserve_split_clients(&mut self, count: usize) -> usize {
        let first = self.split_clients;
        self.split_clients += count;
        first
    }

    pub fn next_matches(&mut self) -> usize {
        let index = self.matches;
        self.matches += 1;
        index
    }

    pub fn next_return_location(&mut self) -> usize {
        let index = self.return_locations;
        self.return_locations += 1;
        index
    }

    /// Index for a route's error pages; `locations` is how many named
    /// error-page locations that route emits.
    pub fn reserve_error_pages(&mut self, locations: usize) -> usize {
        let index = self.error_pages;
        self.error_pages += locations;
        index
    }
}

/// How many split-client indices a set of splits consumes.
pub fn split_clients_needed(splits: usize, dynamic_weight_reload: bool) -> usize {
    if dynamic_weight_reload && splits == 2 {
        DYNAMIC_SPLIT_CLIENTS
    } else {
        1
    }
}

/// An upstream as locations see it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegisteredUpstream<'a> {
    pub upstream: &'a Upstream,
    /// TLS after internal-route and SPIFFE adjustments.
    pub tls: bool,
}

/// Routing artifacts accumulated across every route of the pass.
#[derive(Debug, Default)]
pub(crate) struct RoutingOutput {
    pub maps: Vec<Map>,
    pub split_clients: Vec<SplitClient>,
    pub locations: Vec<Location>,
    pub internal_redirects: Vec<InternalRedirectLocation>,
    pub return_locations: Vec<ReturnLocation>,
    pub error_page_locations: Vec<ErrorPageLocation>,
    pub key_val_zones: Vec<KeyValZone>,
    pub key_vals: Vec<KeyVal>,
    pub two_way_split_clients: Vec<TwoWaySplitClients>,
}

/// Upstream blocks and their premium health checks.
#[derive(Debug, Default)]
pub(crate) struct BackendOutput {
    pub upstreams: Vec<document::Upstream>,
    pub health_checks: Vec<HealthCheck>,
    pub status_matches: Vec<StatusMatch>,
}

/// Mutable compilation context for one VirtualServer and its routes.
pub(crate) struct Pass<'a> {
    pub params: &'a ConfigParams,
    pub features: &'a StaticParams,
    pub vs: &'a VirtualServer,
    pub vs_ref: ResourceRef,
    pub namer: VariableNamer,
    pub indices: IndexAllocator,
    /// Keyed by generated upstream name.
    pub upstreams: BTreeMap<String, RegisteredUpstream<'a>>,
    pub out: RoutingOutput,
    pub backends: BackendOutput,
    pub report: SynthesisReport,
}

impl<'a> Pass<'a> {
    pub fn new(
        vs: &'a VirtualServer,
        params: &'a ConfigParams,
        features: &'a StaticParams,
    ) -> Self {
        Self {
            params,
            features,
            vs,
            vs_ref: ResourceRef::new(ResourceKind::VirtualServer, &vs.metadata),
            namer: VariableNamer::new(&vs.metadata),
            indices: IndexAllocator::new(),
            upstreams: BTreeMap::new(),
            out: RoutingOutput::default(),
            backends: BackendOutput::default(),
            report: SynthesisReport::default(),
        }
    }
}
