use crate::conf::types::{ObjectMeta, Upstream};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VirtualServer {
    pub metadata: ObjectMeta,
    pub spec: VirtualServerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerSpec {
    #[serde(default)]
    pub host: String,

    pub listener: Option<VirtualServerListener>,

    pub tls: Option<Tls>,

    #[serde(default)]
    pub gunzip: bool,

    #[serde(default)]
    pub internal_route: bool,

    #[serde(default)]
    pub policies: Vec<PolicyReference>,

    #[serde(default)]
    pub upstreams: Vec<Upstream>,

    #[serde(default)]
    pub routes: Vec<Route>,

    #[serde(default)]
    pub http_snippets: String,

    #[serde(default)]
    pub server_snippets: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VirtualServerRoute {
    pub metadata: ObjectMeta,
    pub spec: VirtualServerRouteSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerRouteSpec {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub upstreams: Vec<Upstream>,

    #[serde(default)]
    pub subroutes: Vec<Route>,
}

/// Names of the custom listeners a VirtualServer binds to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VirtualServerListener {
    #[serde(default)]
    pub http: String,
    #[serde(default)]
    pub https: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    #[serde(default)]
    pub secret: String,
    pub redirect: Option<TlsRedirect>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsRedirect {
    #[serde(default)]
    pub enable: bool,
    pub code: Option<u16>,
    #[serde(default)]
    pub based_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PolicyReference {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

impl PolicyReference {
    /// Catalog key, falling back to the owner's namespace.
    pub fn key(&self, owner_namespace: &str) -> String {
        let namespace = if self.namespace.is_empty() {
            owner_namespace
        } else {
            &self.namespace
        };
        format!("{}/{}", namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path: String,

    #[serde(default)]
    pub policies: Vec<PolicyReference>,

    /// `namespace/name` (or `name`) of a VirtualServerRoute this path is delegated to.
    pub route: Option<String>,

    pub action: Option<Action>,

    #[serde(default)]
    pub splits: Vec<Split>,

    #[serde(default)]
    pub matches: Vec<Match>,

    #[serde(default)]
    pub error_pages: Vec<ErrorPage>,

    #[serde(default)]
    pub location_snippets: String,
}

/// What a route resolves to once the mutually exclusive fields are inspected.
#[derive(Debug, Clone, Copy)]
pub enum RouteKind<'a> {
    Delegate(&'a str),
    Matches {
        matches: &'a [Match],
        otherwise: Branch<'a>,
    },
    Splits(&'a [Split]),
    Action(&'a Action),
}

/// Leaf of a match: either a direct action or a nested set of splits.
#[derive(Debug, Clone, Copy)]
pub enum Branch<'a> {
    Splits(&'a [Split]),
    Action(&'a Action),
}

impl Route {
    /// Returns `None` when none of delegate/matches/splits/action is usable.
    pub fn kind(&self) -> Option<RouteKind<'_>> {
        if let Some(route) = self.route.as_deref().filter(|r| !r.is_empty()) {
            return Some(RouteKind::Delegate(route));
        }

        if !self.matches.is_empty() {
            let otherwise = branch(&self.splits, self.action.as_ref())?;
            return Some(RouteKind::Matches {
                matches: &self.matches,
                otherwise,
            });
        }

        if !self.splits.is_empty() {
            return Some(RouteKind::Splits(&self.splits));
        }

        self.action.as_ref().map(RouteKind::Action)
    }

    /// `namespace/name` of the delegated VirtualServerRoute.
    pub fn delegate_key(&self, vs_namespace: &str) -> Option<String> {
        let route = self.route.as_deref().filter(|r| !r.is_empty())?;
        if route.contains('/') {
            Some(route.to_string())
        } else {
            Some(format!("{vs_namespace}/{route}"))
        }
    }
}

fn branch<'a>(splits: &'a [Split], action: Option<&'a Action>) -> Option<Branch<'a>> {
    if !splits.is_empty() {
        Some(Branch::Splits(splits))
    } else {
        action.map(Branch::Action)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Pass(String),
    Redirect(ActionRedirect),
    Return(ActionReturn),
    Proxy(ActionProxy),
}

impl Action {
    /// Name of the upstream this action sends traffic to, empty for redirect/return.
    pub fn upstream(&self) -> &str {
        match self {
            Action::Pass(upstream) => upstream,
            Action::Proxy(proxy) => &proxy.upstream,
            Action::Redirect(_) | Action::Return(_) => "",
        }
    }

    pub fn proxy(&self) -> Option<&ActionProxy> {
        match self {
            Action::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActionRedirect {
    pub url: String,
    #[serde(default)]
    pub code: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActionReturn {
    #[serde(default)]
    pub code: u16,
    #[serde(default, rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionProxy {
    pub upstream: String,
    pub request_headers: Option<ProxyRequestHeaders>,
    pub response_headers: Option<ProxyResponseHeaders>,
    #[serde(default)]
    pub rewrite_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProxyRequestHeaders {
    pub pass: Option<bool>,
    #[serde(default)]
    pub set: Vec<Header>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProxyResponseHeaders {
    #[serde(default)]
    pub hide: Vec<String>,
    #[serde(default)]
    pub pass: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub add: Vec<AddHeader>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AddHeader {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub always: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Split {
    pub weight: u32,
    pub action: Action,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Match {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub action: Option<Action>,
    #[serde(default)]
    pub splits: Vec<Split>,
}

impl Match {
    pub fn branch(&self) -> Option<Branch<'_>> {
        branch(&self.splits, self.action.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    #[serde(flatten)]
    pub source: ConditionSource,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionSource {
    Header(String),
    Cookie(String),
    Argument(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorPage {
    pub codes: Vec<u16>,
    #[serde(flatten)]
    pub action: ErrorPageAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPageAction {
    Return(ErrorPageReturn),
    Redirect(ErrorPageRedirect),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ErrorPageReturn {
    #[serde(default)]
    pub code: u16,
    #[serde(default, rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ErrorPageRedirect {
    pub url: String,
    #[serde(default)]
    pub code: u16,
}
