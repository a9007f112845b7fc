//! The proxy configuration document produced by a synthesis pass.
//!
//! Consumers render it into the data plane's native grammar. Collection
//! ordering is stable across runs; `upstreams` is additionally sorted by name.

mod policy;
mod routing;
mod server;
mod upstream;

pub use policy::*;
pub use routing::*;
pub use server::*;
pub use upstream::*;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VirtualServerConfig {
    pub upstreams: Vec<Upstream>,
    pub split_clients: Vec<SplitClient>,
    pub maps: Vec<Map>,
    pub status_matches: Vec<StatusMatch>,
    pub limit_req_zones: Vec<LimitReqZone>,
    pub auth_jwt_claim_sets: Vec<AuthJwtClaimSet>,
    pub http_snippets: Vec<String>,
    pub server: Server,
    pub spiffe_certs: bool,
    pub spiffe_client_certs: bool,
    pub dynamic_ssl_reload_enabled: bool,
    pub static_ssl_path: String,
    pub key_val_zones: Vec<KeyValZone>,
    pub key_vals: Vec<KeyVal>,
    pub two_way_split_clients: Vec<TwoWaySplitClients>,
}
