//! The synthesis engine: turns a VirtualServer, its VirtualServerRoutes and
//! their referenced resources into a [`VirtualServerConfig`].
//!
//! A pass is a pure function of its input. Warnings never abort it; they are
//! collected into the returned [`SynthesisReport`].

mod assemble;
pub(crate) mod ctx;
mod error_pages;
pub mod location;
pub mod lookup;
pub mod naming;
pub mod policy;
pub mod report;
mod routing;
mod ssl;
mod upstream;

#[cfg(test)]
mod tests;

pub use ctx::{DYNAMIC_SPLIT_CLIENTS, IndexAllocator};
pub use report::{SynthesisReport, SynthesisWarning};
pub use ssl::WILDCARD_TLS_PATH;

use crate::conf::types::{
    ConfigParams, ListenerPorts, StaticParams, VirtualServer, VirtualServerRoute,
};
use crate::document::VirtualServerConfig;
use lookup::{
    BundleValidator, EndpointLookup, FsBundleValidator, PolicyCatalog, SecretLookup, WafResources,
};

/// Everything one pass reads. All of it is borrowed and never mutated.
#[derive(Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub virtual_server: &'a VirtualServer,
    /// VirtualServerRoutes the VirtualServer delegates to, in processing order.
    pub virtual_server_routes: &'a [VirtualServerRoute],
    pub listener: &'a ListenerPorts,
    pub policies: &'a PolicyCatalog,
    pub endpoints: &'a dyn EndpointLookup,
    pub secrets: &'a dyn SecretLookup,
    pub waf: &'a WafResources,
}

/// Holds the settings fixed for the lifetime of a controller.
///
/// A synthesizer keeps no state between passes, so independent resources can
/// be synthesized concurrently from one shared instance.
pub struct Synthesizer {
    params: ConfigParams,
    features: StaticParams,
    bundles: Box<dyn BundleValidator>,
}

impl Synthesizer {
    /// WAF bundles are looked up under `features.waf_bundle_path`.
    pub fn new(params: ConfigParams, features: StaticParams) -> Self {
        let bundles = Box::new(FsBundleValidator::new(&features.waf_bundle_path));
        Self::with_bundle_validator(params, features, bundles)
    }

    pub fn with_bundle_validator(
        params: ConfigParams,
        features: StaticParams,
        bundles: Box<dyn BundleValidator>,
    ) -> Self {
        Self {
            params,
            features,
            bundles,
        }
    }

    pub fn params(&self) -> &ConfigParams {
        &self.params
    }

    pub fn features(&self) -> &StaticParams {
        &self.features
    }

    pub fn synthesize(&self, input: SynthesisInput<'_>) -> (VirtualServerConfig, SynthesisReport) {
        assemble::assemble(self, &input)
    }
}
