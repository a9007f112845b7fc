use crate::conf::discover::discover;
use crate::conf::error::ConfigError;
use crate::conf::parse::{
    Resource, parse_endpoints, parse_entrypoint, parse_resources, parse_secrets, parse_waf,
};
use crate::conf::types::{EntrypointConfig, VirtualServer, VirtualServerRoute};
use crate::synth::lookup::{EndpointSet, PolicyCatalog, SecretStore, WafResources};
use crate::synth::{SynthesisInput, Synthesizer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the entrypoint file at the root of a bundle.
pub const ENTRYPOINT_FILE: &str = "vsgen.hcl";

/// A VirtualServer together with the VirtualServerRoutes it delegates to.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub virtual_server: VirtualServer,
    /// Delegated routes that exist in the bundle, in the order the
    /// VirtualServer references them. Missing ones are reported during
    /// synthesis.
    pub routes: Vec<VirtualServerRoute>,
}

/// Everything read from a bundle directory.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub root: PathBuf,
    pub entry: EntrypointConfig,
    pub virtual_servers: Vec<BundleEntry>,
    pub policies: PolicyCatalog,
    pub secrets: SecretStore,
    pub endpoints: EndpointSet,
    pub waf: WafResources,
}

impl Bundle {
    /// A synthesizer configured from the entrypoint. A relative WAF bundle
    /// path is resolved against the bundle root.
    pub fn synthesizer(&self) -> Synthesizer {
        let mut features = self.entry.features.clone();
        let bundle_path = Path::new(&features.waf_bundle_path);
        if bundle_path.is_relative() {
            features.waf_bundle_path = self.root.join(bundle_path).to_string_lossy().into_owned();
        }
        Synthesizer::new(self.entry.params.clone(), features)
    }

    pub fn input<'a>(&'a self, entry: &'a BundleEntry) -> SynthesisInput<'a> {
        SynthesisInput {
            virtual_server: &entry.virtual_server,
            virtual_server_routes: &entry.routes,
            listener: &self.entry.listener,
            policies: &self.policies,
            endpoints: &self.endpoints,
            secrets: &self.secrets,
            waf: &self.waf,
        }
    }

    pub fn inputs(&self) -> impl Iterator<Item = SynthesisInput<'_>> {
        self.virtual_servers.iter().map(|entry| self.input(entry))
    }
}

pub fn load_bundle(root: &Path) -> Result<Bundle, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: IO and parsing
    //--------------------------------------------------------------------------
    let entry = parse_entrypoint(&root.join(ENTRYPOINT_FILE))?;

    //--------------------------------------------------------------------------
    // Discover included files (hard fail)
    //--------------------------------------------------------------------------
    let resource_files = discover(root, &entry.include.resources)?;
    let secret_files = discover(root, &entry.include.secrets)?;
    let endpoint_files = discover(root, &entry.include.endpoints)?;
    let waf_files = discover(root, &entry.include.waf)?;

    //--------------------------------------------------------------------------
    // Parse resources (hard fail, duplicates rejected)
    //--------------------------------------------------------------------------
    let mut virtual_servers: Vec<VirtualServer> = Vec::new();
    let mut routes: BTreeMap<String, VirtualServerRoute> = BTreeMap::new();
    let mut policies = PolicyCatalog::new();

    for path in &resource_files {
        for resource in parse_resources(path)? {
            match resource {
                Resource::VirtualServer(vs) => {
                    if virtual_servers.iter().any(|v| v.metadata == vs.metadata) {
                        return Err(duplicate("VirtualServer", vs.metadata.key()));
                    }
                    virtual_servers.push(vs);
                }
                Resource::VirtualServerRoute(vsr) => {
                    let key = vsr.metadata.key();
                    if routes.contains_key(&key) {
                        return Err(duplicate("VirtualServerRoute", key));
                    }
                    routes.insert(key, vsr);
                }
                Resource::Policy(policy) => {
                    let key = policy.key();
                    if policies.contains_key(&key) {
                        return Err(duplicate("Policy", key));
                    }
                    policies.insert(key, policy);
                }
            }
        }
    }

    if virtual_servers.is_empty() {
        return Err(ConfigError::MissingVirtualServer {
            root: root.to_path_buf(),
        });
    }

    //--------------------------------------------------------------------------
    // Parse lookup tables (hard fail, later files extend earlier ones)
    //--------------------------------------------------------------------------
    let mut secrets = SecretStore::new();
    for path in &secret_files {
        secrets.extend(parse_secrets(path)?);
    }

    let mut endpoints = EndpointSet::default();
    for path in &endpoint_files {
        endpoints.extend(parse_endpoints(path)?);
    }

    let mut waf = WafResources::default();
    for path in &waf_files {
        waf.extend(parse_waf(path)?);
    }

    //--------------------------------------------------------------------------
    // Pair every VirtualServer with the routes it delegates to
    //--------------------------------------------------------------------------
    let virtual_servers = virtual_servers
        .into_iter()
        .map(|vs| {
            let routes = delegated_routes(&vs, &routes);
            tracing::debug!(
                virtual_server = %vs.metadata.key(),
                routes = routes.len(),
                "loaded virtual server"
            );
            BundleEntry {
                virtual_server: vs,
                routes,
            }
        })
        .collect();

    Ok(Bundle {
        root: root.to_path_buf(),
        entry,
        virtual_servers,
        policies,
        secrets,
        endpoints,
        waf,
    })
}

fn delegated_routes(
    vs: &VirtualServer,
    routes: &BTreeMap<String, VirtualServerRoute>,
) -> Vec<VirtualServerRoute> {
    let mut selected: Vec<VirtualServerRoute> = Vec::new();
    for route in &vs.spec.routes {
        let Some(key) = route.delegate_key(&vs.metadata.namespace) else {
            continue;
        };
        let Some(vsr) = routes.get(&key) else {
            continue;
        };
        if !selected.iter().any(|s| s.metadata == vsr.metadata) {
            selected.push(vsr.clone());
        }
    }
    selected
}

fn duplicate(kind: &'static str, key: String) -> ConfigError {
    ConfigError::DuplicateResource { kind, key }
}
